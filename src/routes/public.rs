use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// The unauthenticated allow-list: read-only marketplace data plus the
/// registration gateway. Every data-retrieval handler here must only ever
/// surface ACTIVE listings (enforced in the Repository query), with the single
/// exception of the listing-detail route, which widens visibility for the
/// owner and admins via the optional identity extractor.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // New user creation. Role defaults to INVESTOR; ADMIN self-signup rejected.
        .route("/auth/register", post(handlers::register_user))
        // GET /investments?country=&sector=&minSize=&maxSize=&minReturn=&q=
        // The public browse page: ACTIVE listings only, filterable and searchable.
        .route("/investments", get(handlers::browse_listings))
        // GET /investments/facets
        // Distinct country/sector values feeding the browse filter dropdowns.
        .route("/investments/facets", get(handlers::listing_facets))
        // GET /impact/stats
        // Reporting aggregates for the impact page.
        .route("/impact/stats", get(handlers::impact_stats))
        // GET /listings/{id}
        // Single listing detail. Non-ACTIVE rows are visible only to the owner
        // or an admin; everyone else gets 404.
        .route("/listings/{id}", get(handlers::get_listing))
}
