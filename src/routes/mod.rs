/// Router Module Index
///
/// Organizes the routing surface into access-tier modules, so access control is
/// applied explicitly at the module level (via Axum layers) and a protected
/// endpoint cannot be registered without passing through its tier's guard.
///
/// The four modules map directly onto the guard decision table.

/// Routes accessible to anyone, session or not. Visibility rules
/// (`status = ACTIVE`) are enforced at the Repository level.
pub mod public;

/// Routes requiring a valid session of any role.
pub mod authenticated;

/// Routes restricted to the ADMIN and CONTRIBUTOR roles (listing submission
/// and owner-scoped management).
pub mod contributor;

/// Routes restricted exclusively to the ADMIN role.
pub mod admin;
