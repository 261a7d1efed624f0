use crate::{
    AppState,
    auth::{AuthUser, MaybeUser},
    error::ApiError,
    models::{
        CreateEngagementRequest, CreateListingRequest, EngagementRequest, EngagementWithListing,
        ImpactMetrics, ImpactStats, Listing, ListingFacets, ListingFilter, ListingStatus,
        NewEngagement, NewListing, NewUser, RegisterUserRequest, Role, UpdateListingRequest,
        UserProfile,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

// --- Validation Helpers ---

/// Presence check for a required field; absence is a 400 ValidationError.
fn require_field<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::validation(format!("missing required field: {name}")))
}

/// Presence + non-blank check for a required text field.
fn require_text(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ApiError::validation(format!(
            "missing required field: {name}"
        ))),
    }
}

/// Invariant: size_min <= size_max, both finite.
fn validate_size_bounds(size_min: f64, size_max: f64) -> Result<(), ApiError> {
    if !size_min.is_finite() || !size_max.is_finite() {
        return Err(ApiError::validation("size bounds must be finite numbers"));
    }
    if size_min > size_max {
        return Err(ApiError::validation("size_min must not exceed size_max"));
    }
    Ok(())
}

/// Boundary validation for the open impact-metrics map: non-empty keys capped
/// at 64 chars, numeric values finite.
fn validate_impact_metrics(metrics: &ImpactMetrics) -> Result<(), ApiError> {
    for (key, value) in metrics {
        if key.trim().is_empty() || key.len() > 64 {
            return Err(ApiError::validation(format!(
                "invalid impact metric key: {key:?}"
            )));
        }
        if let crate::models::MetricValue::Number(n) = value {
            if !n.is_finite() {
                return Err(ApiError::validation(format!(
                    "impact metric {key:?} must be a finite number"
                )));
            }
        }
    }
    Ok(())
}

/// Validates a create payload into an insertable record. The status arrives
/// already resolved from the creator's role; the payload's own status field is
/// ignored here.
fn validate_new_listing(
    req: CreateListingRequest,
    status: ListingStatus,
) -> Result<NewListing, ApiError> {
    let title = require_text(req.title, "title")?;
    let description = require_text(req.description, "description")?;
    let country_code = require_text(req.country_code, "country_code")?;
    let sector = require_text(req.sector, "sector")?;
    let size_min = require_field(req.size_min, "size_min")?;
    let size_max = require_field(req.size_max, "size_max")?;
    validate_size_bounds(size_min, size_max)?;
    let return_pct = require_field(req.return_pct, "return_pct")?;
    let timeline = require_text(req.timeline, "timeline")?;
    let impact_metrics = req.impact_metrics.unwrap_or_default();
    validate_impact_metrics(&impact_metrics)?;

    Ok(NewListing {
        title,
        description,
        country_code,
        sector,
        size_min,
        size_max,
        return_pct,
        timeline,
        status,
        featured: req.featured.unwrap_or(false),
        impact_metrics,
        media_urls: req.media_urls.unwrap_or_default(),
    })
}

/// Re-validates size bounds on a patch that changes either bound, against the
/// current row for the untouched side.
async fn validate_patch_bounds(
    state: &AppState,
    id: Uuid,
    patch: &UpdateListingRequest,
) -> Result<(), ApiError> {
    if patch.size_min.is_none() && patch.size_max.is_none() {
        return Ok(());
    }
    let current = state
        .repo
        .get_listing(id)
        .await?
        .ok_or(ApiError::NotFound("listing"))?;
    let size_min = patch.size_min.unwrap_or(current.size_min);
    let size_max = patch.size_max.unwrap_or(current.size_max);
    validate_size_bounds(size_min, size_max)
}

// --- Public Handlers ---

/// register_user
///
/// [Public Route] Creates a user. `name`, `email`, and `password` are required;
/// `role` defaults to INVESTOR and may not be ADMIN. The password is stored
/// only as a bcrypt hash and never appears in the response.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserProfile),
        (status = 400, description = "Missing field, disallowed role, or duplicate email")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let name = require_text(payload.name, "name")?;
    let email = require_text(payload.email, "email")?;
    let password = require_text(payload.password, "password")?;

    let role = payload.role.unwrap_or_default();
    if role == Role::Admin {
        return Err(ApiError::validation(
            "self-registration with the ADMIN role is not allowed",
        ));
    }

    // Duplicate check before the insert; the unique index on email backstops
    // concurrent double-submits.
    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "a user with this email already exists".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("password hashing failed: {:?}", e);
        ApiError::Internal
    })?;

    let user = state
        .repo
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// browse_listings
///
/// [Public Route] Lists ACTIVE listings with filtering and search. The
/// repository applies the `status = ACTIVE` predicate unconditionally, so no
/// filter combination exposes draft, pending, or archived rows.
#[utoipa::path(
    get,
    path = "/investments",
    params(ListingFilter),
    responses((status = 200, description = "Filtered active listings", body = [Listing]))
)]
pub async fn browse_listings(
    State(state): State<AppState>,
    Query(filter): Query<ListingFilter>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let listings = state.repo.list_active_listings(&filter).await?;
    Ok(Json(listings))
}

/// listing_facets
///
/// [Public Route] Distinct country/sector values over ACTIVE listings, used to
/// populate the browse page filter dropdowns.
#[utoipa::path(
    get,
    path = "/investments/facets",
    responses((status = 200, description = "Filter facets", body = ListingFacets))
)]
pub async fn listing_facets(
    State(state): State<AppState>,
) -> Result<Json<ListingFacets>, ApiError> {
    let facets = state.repo.active_listing_facets().await?;
    Ok(Json(facets))
}

/// impact_stats
///
/// [Public Route] Read-only reporting aggregates: approved investment volume,
/// live listing count, approved deal count.
#[utoipa::path(
    get,
    path = "/impact/stats",
    responses((status = 200, description = "Aggregates", body = ImpactStats))
)]
pub async fn impact_stats(State(state): State<AppState>) -> Result<Json<ImpactStats>, ApiError> {
    let stats = state.repo.impact_stats().await?;
    Ok(Json(stats))
}

/// get_listing
///
/// [Public Route] Single listing by id. ACTIVE listings are visible to anyone;
/// a non-ACTIVE listing only to its owner or an admin. Everyone else sees 404,
/// so the existence of unpublished work is not leaked.
#[utoipa::path(
    get,
    path = "/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Found", body = Listing),
        (status = 404, description = "Absent or not visible to the caller")
    )
)]
pub async fn get_listing(
    MaybeUser(viewer): MaybeUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ApiError> {
    let listing = state
        .repo
        .get_listing(id)
        .await?
        .ok_or(ApiError::NotFound("listing"))?;

    if listing.status != ListingStatus::Active {
        let allowed = viewer
            .as_ref()
            .is_some_and(|u| u.role == Role::Admin || u.id == listing.owner_user_id);
        if !allowed {
            return Err(ApiError::NotFound("listing"));
        }
    }

    Ok(Json(listing))
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] The caller's own profile, hash-free.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user.into()))
}

/// create_engagement_request
///
/// [Authenticated Route] Expresses investment interest toward a listing.
/// `listing_id`, `type`, and `amount` are required (400 otherwise, nothing
/// persisted); status always starts as PENDING; the requesting user is the
/// session identity regardless of anything in the payload.
#[utoipa::path(
    post,
    path = "/engagement-requests",
    request_body = CreateEngagementRequest,
    responses(
        (status = 201, description = "Created", body = EngagementRequest),
        (status = 400, description = "Missing required field"),
        (status = 404, description = "Listing does not exist")
    )
)]
pub async fn create_engagement_request(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateEngagementRequest>,
) -> Result<(StatusCode, Json<EngagementRequest>), ApiError> {
    let listing_id = require_field(payload.listing_id, "listing_id")?;
    let engagement_type = require_field(payload.engagement_type, "type")?;
    let amount = require_field(payload.amount, "amount")?;

    let created = state
        .repo
        .create_engagement(
            NewEngagement {
                listing_id,
                engagement_type,
                amount,
                details: payload.details,
            },
            user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// my_engagement_requests
///
/// [Authenticated Route] The caller's engagement requests, newest first, each
/// joined with the minimal listing projection for the dashboard.
#[utoipa::path(
    get,
    path = "/user/engagement-requests",
    responses((status = 200, description = "My requests", body = [EngagementWithListing]))
)]
pub async fn my_engagement_requests(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<EngagementWithListing>>, ApiError> {
    let requests = state.repo.list_engagements_for_user(id).await?;
    Ok(Json(requests))
}

// --- Contributor Handlers ---

/// contributor_listings
///
/// [Contributor Route] Listings owned by the caller, including DRAFT/PENDING
/// ones. The owner id comes from the session, never from the request.
#[utoipa::path(
    get,
    path = "/contributor/listings",
    responses((status = 200, description = "Own listings", body = [Listing]))
)]
pub async fn contributor_listings(
    AuthUser { id, role }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    if !matches!(role, Role::Admin | Role::Contributor) {
        return Err(ApiError::Forbidden);
    }
    let listings = state.repo.list_owned_listings(id).await?;
    Ok(Json(listings))
}

/// contributor_create_listing
///
/// [Contributor Route] Submits a new listing for review. The stored status is
/// PENDING regardless of any status in the payload.
#[utoipa::path(
    post,
    path = "/contributor/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Created as PENDING", body = Listing),
        (status = 400, description = "Missing field or invalid bounds")
    )
)]
pub async fn contributor_create_listing(
    AuthUser { id, role }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    if !matches!(role, Role::Admin | Role::Contributor) {
        return Err(ApiError::Forbidden);
    }
    let new = validate_new_listing(payload, ListingStatus::Pending)?;
    let listing = state.repo.create_listing(new, id).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// contributor_update_listing
///
/// [Contributor Route] Partial update of an owned listing. Ownership and
/// lifecycle scoping (DRAFT/PENDING only) live in the repository query
/// predicate; a non-owner or an edit to a live listing reads as 404. Status
/// and featured are stripped from the patch on this path.
#[utoipa::path(
    patch,
    path = "/contributor/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated", body = Listing),
        (status = 404, description = "Absent, not owned, or no longer editable")
    )
)]
pub async fn contributor_update_listing(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateListingRequest>,
) -> Result<Json<Listing>, ApiError> {
    if !matches!(role, Role::Admin | Role::Contributor) {
        return Err(ApiError::Forbidden);
    }

    // Lifecycle fields are admin-only.
    payload.status = None;
    payload.featured = None;

    validate_patch_bounds(&state, id, &payload).await?;
    if let Some(metrics) = &payload.impact_metrics {
        validate_impact_metrics(metrics)?;
    }

    match state.repo.update_owned_listing(id, user_id, payload).await? {
        Some(listing) => Ok(Json(listing)),
        None => Err(ApiError::NotFound("listing")),
    }
}

// --- Admin Handlers ---

/// admin_listings
///
/// [Admin Route] Every listing in the system, status ascending then newest
/// first, so the review queue (DRAFT/PENDING) sits on top.
#[utoipa::path(
    get,
    path = "/admin/listings",
    responses((status = 200, description = "All listings", body = [Listing]))
)]
pub async fn admin_listings(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    if role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(state.repo.list_all_listings().await?))
}

/// admin_create_listing
///
/// [Admin Route] Creates a listing with the submitted status (DRAFT when
/// omitted); admin-created listings may go ACTIVE directly.
#[utoipa::path(
    post,
    path = "/admin/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Created", body = Listing),
        (status = 400, description = "Missing field or invalid bounds")
    )
)]
pub async fn admin_create_listing(
    AuthUser { id, role }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    if role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    let status = payload.status.unwrap_or(ListingStatus::Draft);
    let new = validate_new_listing(payload, status)?;
    let listing = state.repo.create_listing(new, id).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// admin_get_listing
///
/// [Admin Route] Any listing by id, regardless of status. Feeds the edit form.
#[utoipa::path(
    get,
    path = "/admin/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Found", body = Listing),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_get_listing(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ApiError> {
    if role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    match state.repo.get_listing(id).await? {
        Some(listing) => Ok(Json(listing)),
        None => Err(ApiError::NotFound("listing")),
    }
}

/// admin_update_listing
///
/// [Admin Route] Partial update of any field. Setting `status` here is the
/// approval mechanism: PENDING -> ACTIVE publishes, PENDING -> DRAFT sends
/// back, any -> ARCHIVED retires.
#[utoipa::path(
    patch,
    path = "/admin/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated", body = Listing),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_update_listing(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingRequest>,
) -> Result<Json<Listing>, ApiError> {
    if role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    validate_patch_bounds(&state, id, &payload).await?;
    if let Some(metrics) = &payload.impact_metrics {
        validate_impact_metrics(metrics)?;
    }

    match state.repo.update_listing(id, payload).await? {
        Some(listing) => Ok(Json(listing)),
        None => Err(ApiError::NotFound("listing")),
    }
}

/// admin_delete_listing
///
/// [Admin Route] Removes a listing. 204 on success, 404 when absent.
#[utoipa::path(
    delete,
    path = "/admin/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_delete_listing(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    if state.repo.delete_listing(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("listing"))
    }
}
