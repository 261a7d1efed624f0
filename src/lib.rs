use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Contributor, Admin).
pub mod routes;
use routes::{admin, authenticated, contributor, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point (main.rs).
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application,
/// aggregating every `#[utoipa::path]` handler and `ToSchema` model.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::browse_listings, handlers::listing_facets,
        handlers::impact_stats, handlers::get_listing, handlers::get_me,
        handlers::create_engagement_request, handlers::my_engagement_requests,
        handlers::contributor_listings, handlers::contributor_create_listing,
        handlers::contributor_update_listing, handlers::admin_listings,
        handlers::admin_create_listing, handlers::admin_get_listing,
        handlers::admin_update_listing, handlers::admin_delete_listing
    ),
    components(
        schemas(
            models::Listing, models::CreateListingRequest, models::UpdateListingRequest,
            models::EngagementRequest, models::EngagementWithListing,
            models::CreateEngagementRequest, models::RegisterUserRequest, models::UserProfile,
            models::ImpactStats, models::ListingFacets, models::Role, models::ListingStatus,
            models::EngagementType, models::EngagementStatus, models::MetricValue,
        )
    ),
    tags(
        (name = "invest-portal", description = "Investment Marketplace API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These allow extractors and guards to selectively pull components from the
// shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies the
/// tier guards and global middleware, and registers the application state.
///
/// Guard layering: the authenticated tier requires any valid session; the
/// nested `/contributor` and `/admin` routers additionally require their
/// roles. A missing/invalid session rejects with 401 before any guard body
/// runs; an insufficient role rejects with 403.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no guard applied.
        .merge(public::public_routes())
        // Authenticated routes: any valid session.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        // Contributor namespace: ADMIN or CONTRIBUTOR.
        .nest(
            "/contributor",
            contributor::contributor_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_contributor,
            )),
        )
        // Admin namespace: ADMIN only.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin,
            )),
        )
        .with_state(state);

    // Observability and correlation layers (applied outermost).
    base_router
        .layer(
            ServiceBuilder::new()
                // Request ID generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Request tracing: wraps the request/response lifecycle in a span
                // correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes TraceLayer span creation: extracts the `x-request-id` header (if
/// present) and includes it in the structured logging metadata alongside the
/// HTTP method and URI, so every log line for a request shares one ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
