use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure expected inside a session JWT. Tokens are issued and
/// signed by the external identity provider; this service only validates them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, the primary key used to fetch the
    /// user's current role from the `users` table.
    pub sub: Uuid,
    /// Expiration Time (exp): timestamp after which the JWT must not be accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the JWT was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: an explicit
/// request-scoped context value passed by parameter into handlers, never
/// ambient state. Handlers use it for every ownership and role decision.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any protected handler or guard middleware.
///
/// The flow:
/// 1. Dependency resolution: Repository and AppConfig from the application state.
/// 2. Local bypass: development-time access via the 'x-user-id' header, gated
///    on `Env::Local` and still verified against the database.
/// 3. Token validation: Bearer token extraction and JWT decoding (exp enforced).
/// 4. DB lookup: the user's existence and current role. A valid token for a
///    deleted user does not authenticate.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure. A malformed or
/// expired token is treated identically to a missing one.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass: a known user UUID in the 'x-user-id' header
        // authenticates directly, with roles still loaded from the database.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Ok(Some(user)) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                role: user.role,
                            });
                        }
                    }
                }
            }
        }
        // In Production, or if the bypass did not resolve, fall through to the
        // standard JWT validation flow.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;

        // Expired, bad-signature, and malformed tokens all reject identically.
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| ApiError::Unauthorized)?;

        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .map_err(|_| ApiError::Unauthorized)?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// MaybeUser
///
/// Optional identity for routes on the public allow-list whose response still
/// varies by viewer (listing detail: non-ACTIVE rows are visible only to the
/// owner or an admin). Never rejects; an anonymous or failed resolution yields
/// `None`.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

// --- Route-Prefix Guards ---
//
// Layered onto the routers via `middleware::from_fn_with_state`. The guard
// decision table: no session on a protected route -> 401 (the AuthUser
// extractor rejects before the guard body runs); session present but role
// insufficient -> 403. Admin and contributor handlers re-check the role, so a
// wiring mistake in the router cannot widen access.

/// Guard for the authenticated tier: any valid session passes.
pub async fn require_auth(_auth: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Guard for the `/contributor` namespace: ADMIN or CONTRIBUTOR.
pub async fn require_contributor(
    auth: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !matches!(auth.role, Role::Admin | Role::Contributor) {
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}

/// Guard for the `/admin` namespace: ADMIN only.
pub async fn require_admin(
    auth: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if auth.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}
