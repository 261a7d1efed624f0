use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under `/admin` and restricted to the ADMIN role by the
/// `require_admin` layer. Full listing CRUD, including the status transitions
/// that publish (PENDING -> ACTIVE), send back (PENDING -> DRAFT), and retire
/// (any -> ARCHIVED) listings.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/listings
        // Every listing, status ascending then newest first: the review queue.
        // POST /admin/listings
        // Creates a listing with the submitted status (default DRAFT).
        .route(
            "/listings",
            get(handlers::admin_listings).post(handlers::admin_create_listing),
        )
        // GET/PATCH/DELETE /admin/listings/{id}
        // Fetch for the edit form, partial update (the approval/archive
        // mechanism), and removal.
        .route(
            "/listings/{id}",
            get(handlers::admin_get_listing)
                .patch(handlers::admin_update_listing)
                .delete(handlers::admin_delete_listing),
        )
}
