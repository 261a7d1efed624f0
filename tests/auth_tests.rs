use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use chrono::Utc;
use invest_portal::{
    ApiError, AppConfig, AppState,
    auth::{AuthUser, Claims, MaybeUser},
    config::Env,
    models::{
        EngagementRequest, EngagementStatus, EngagementWithListing, ImpactStats, Listing,
        ListingFacets, ListingFilter, ListingStatus, NewEngagement, NewListing, NewUser, Role,
        UpdateListingRequest, User,
    },
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::types::Json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

// --- Mock Repository for Auth Logic ---

#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
}

fn placeholder_listing() -> Listing {
    Listing {
        id: Uuid::new_v4(),
        title: String::new(),
        description: String::new(),
        country_code: String::new(),
        sector: String::new(),
        size_min: 0.0,
        size_max: 0.0,
        return_pct: 0.0,
        timeline: String::new(),
        status: ListingStatus::Draft,
        featured: false,
        impact_metrics: Json(BTreeMap::new()),
        media_urls: vec![],
        owner_user_id: Uuid::nil(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn get_user(&self, _id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }

    // Placeholders for the methods the auth flow never touches.
    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(None)
    }
    async fn create_user(&self, _new: NewUser) -> Result<User, sqlx::Error> {
        Ok(User::default())
    }
    async fn list_all_listings(&self) -> Result<Vec<Listing>, sqlx::Error> {
        Ok(vec![])
    }
    async fn list_owned_listings(&self, _owner_id: Uuid) -> Result<Vec<Listing>, sqlx::Error> {
        Ok(vec![])
    }
    async fn list_active_listings(
        &self,
        _filter: &ListingFilter,
    ) -> Result<Vec<Listing>, sqlx::Error> {
        Ok(vec![])
    }
    async fn active_listing_facets(&self) -> Result<ListingFacets, sqlx::Error> {
        Ok(ListingFacets::default())
    }
    async fn get_listing(&self, _id: Uuid) -> Result<Option<Listing>, sqlx::Error> {
        Ok(None)
    }
    async fn create_listing(
        &self,
        _new: NewListing,
        _owner_id: Uuid,
    ) -> Result<Listing, sqlx::Error> {
        Ok(placeholder_listing())
    }
    async fn update_listing(
        &self,
        _id: Uuid,
        _patch: UpdateListingRequest,
    ) -> Result<Option<Listing>, sqlx::Error> {
        Ok(None)
    }
    async fn update_owned_listing(
        &self,
        _id: Uuid,
        _owner_id: Uuid,
        _patch: UpdateListingRequest,
    ) -> Result<Option<Listing>, sqlx::Error> {
        Ok(None)
    }
    async fn delete_listing(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(false)
    }
    async fn create_engagement(
        &self,
        new: NewEngagement,
        user_id: Uuid,
    ) -> Result<EngagementRequest, sqlx::Error> {
        Ok(EngagementRequest {
            id: Uuid::new_v4(),
            engagement_type: new.engagement_type,
            amount: new.amount,
            status: EngagementStatus::Pending,
            details: new.details,
            user_id,
            listing_id: new.listing_id,
            created_at: Utc::now(),
        })
    }
    async fn list_engagements_for_user(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<EngagementWithListing>, sqlx::Error> {
        Ok(vec![])
    }
    async fn impact_stats(&self) -> Result<ImpactStats, sqlx::Error> {
        Ok(ImpactStats::default())
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_token(user_id: Uuid, iat: u64, exp: u64) -> String {
    let claims = Claims {
        sub: user_id,
        iat: iat as usize,
        exp: exp as usize,
    };
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn test_user(role: Role) -> User {
    User {
        id: TEST_USER_ID,
        name: "Test".to_string(),
        email: "test@example.com".to_string(),
        password_hash: "hash".to_string(),
        role,
        created_at: Utc::now(),
    }
}

fn create_app_state(env: Env, repo: MockAuthRepo, jwt_secret: &str) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = jwt_secret.to_string();

    AppState {
        repo: Arc::new(repo),
        config,
    }
}

/// Builds the mutable Parts struct the extractor operates on.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let now = now_secs();
    let token = create_token(TEST_USER_ID, now, now + 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(test_user(Role::Contributor)),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(auth_user.id, TEST_USER_ID);
    assert_eq!(auth_user.role, Role::Contributor);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(Env::Production, MockAuthRepo::default(), TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_auth_failure_with_garbage_token() {
    let app_state = create_app_state(Env::Production, MockAuthRepo::default(), TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, "not-a-jwt-at-all");

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    // Expired an hour ago, well past any validation leeway.
    let now = now_secs();
    let token = create_token(TEST_USER_ID, now - 7200, now - 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(test_user(Role::Investor)),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let now = now_secs();
    let token = create_token(TEST_USER_ID, now, now + 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(test_user(Role::Investor)),
    };
    // The server validates with a different secret than the token was signed with.
    let app_state = create_app_state(Env::Production, mock_repo, "a-completely-different-secret");

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_auth_failure_for_deleted_user() {
    // Token is valid but the user no longer exists.
    let now = now_secs();
    let token = create_token(TEST_USER_ID, now, now + 3600);

    let app_state = create_app_state(Env::Production, MockAuthRepo::default(), TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_repo = MockAuthRepo {
        user_to_return: Some(test_user(Role::Admin)),
    };
    let app_state = create_app_state(Env::Local, mock_repo, TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        "x-user-id",
        header::HeaderValue::from_str(&TEST_USER_ID.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(auth_user.id, TEST_USER_ID);
    assert_eq!(auth_user.role, Role::Admin);
}

#[tokio::test]
async fn test_bypass_is_inert_in_production() {
    let mock_repo = MockAuthRepo {
        user_to_return: Some(test_user(Role::Admin)),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        "x-user-id",
        header::HeaderValue::from_str(&TEST_USER_ID.to_string()).unwrap(),
    );

    let result = AuthUser::from_request_parts(&mut parts, &app_state).await;
    assert!(matches!(result.unwrap_err(), ApiError::Unauthorized));
}

#[tokio::test]
async fn test_maybe_user_is_none_for_anonymous() {
    let app_state = create_app_state(Env::Production, MockAuthRepo::default(), TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let MaybeUser(viewer) = MaybeUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert!(viewer.is_none());
}

#[tokio::test]
async fn test_maybe_user_resolves_a_valid_session() {
    let now = now_secs();
    let token = create_token(TEST_USER_ID, now, now + 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(test_user(Role::Investor)),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let MaybeUser(viewer) = MaybeUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    let viewer = viewer.unwrap();
    assert_eq!(viewer.id, TEST_USER_ID);
    assert_eq!(viewer.role, Role::Investor);
}
