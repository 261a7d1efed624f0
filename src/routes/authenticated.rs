use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes accessible to any user with a valid session, regardless of role.
/// This is the investor-facing core: profile access and engagement requests.
///
/// Every handler here relies on the `require_auth` layer applied above this
/// module, and receives the validated `AuthUser` context for all identity
/// decisions. The requesting user's id is always taken from that context,
/// never from the request body.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The authenticated caller's own profile (hash-free projection).
        .route("/me", get(handlers::get_me))
        // POST /engagement-requests
        // Expresses investment interest toward a listing. Status always starts
        // PENDING; listing_id, type, and amount are required.
        .route(
            "/engagement-requests",
            post(handlers::create_engagement_request),
        )
        // GET /user/engagement-requests
        // The caller's own requests, newest first, joined with the minimal
        // listing projection for the dashboard.
        .route(
            "/user/engagement-requests",
            get(handlers::my_engagement_requests),
        )
}
