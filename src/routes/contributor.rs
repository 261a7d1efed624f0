use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch},
};

/// Contributor Router Module
///
/// Nested under `/contributor` and restricted to the ADMIN and CONTRIBUTOR
/// roles by the `require_contributor` layer. Covers listing submission and
/// owner-scoped management; handlers re-check the role, so the guard and the
/// handler must both agree before anything runs.
pub fn contributor_routes() -> Router<AppState> {
    Router::new()
        // GET /contributor/listings
        // Listings owned by the caller, including DRAFT/PENDING submissions.
        // The owner id comes from the session identity only.
        // POST /contributor/listings
        // Submits a new listing for review. Stored status is forced to PENDING
        // no matter what the payload says.
        .route(
            "/listings",
            get(handlers::contributor_listings).post(handlers::contributor_create_listing),
        )
        // PATCH /contributor/listings/{id}
        // Partial update of an owned listing. The ownership check and the
        // DRAFT/PENDING lifecycle restriction are part of the repository query
        // predicate; status and featured are not patchable on this path.
        .route("/listings/{id}", patch(handlers::contributor_update_listing))
}
