use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Role & Status Enums (Mapped to Postgres enum types) ---

/// Role
///
/// The three-valued RBAC field carried by every user and resolved into the
/// request context at authentication time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Contributor,
    #[default]
    Investor,
}

/// ListingStatus
///
/// Listing lifecycle. Declaration order doubles as the "status ascending" sort
/// order used by the admin review queue (pending work floats above live rows).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    ToSchema,
    sqlx::Type,
    Default,
)]
#[sqlx(type_name = "listing_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum ListingStatus {
    #[default]
    Draft,
    Pending,
    Active,
    Archived,
}

/// EngagementType
///
/// How an investor intends to engage: directly, through a managed account, or
/// via a pooled fund.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "engagement_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum EngagementType {
    /// Wire value "SELF" ("Self" is reserved in Rust).
    #[serde(rename = "SELF")]
    #[sqlx(rename = "SELF")]
    SelfDirected,
    Managed,
    Fund,
}

/// EngagementStatus
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "engagement_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum EngagementStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

// --- Impact Metrics (typed open map) ---

/// MetricValue
///
/// A single impact metric value. The map is schema-open but value-typed:
/// either a number or a free-form string, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(untagged)]
#[ts(export)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// Keyed impact metrics attached to a listing (e.g., homes served, CO2 reduced).
/// Keys are validated at the service boundary before any write.
pub type ImpactMetrics = BTreeMap<String, MetricValue>;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record stored in the `users` table. Internal-only:
/// this struct carries the password hash and is never serialized into a
/// response. The outward shape is `UserProfile`.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Unique; registration conflicts on duplicates.
    pub email: String,
    // Irreversible bcrypt hash. Plaintext is never persisted or logged.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// UserProfile
///
/// Hash-free projection of a `User`, returned by registration and `/me`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Listing
///
/// An investment opportunity record from the `listings` table. The primary
/// data structure for the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    // ISO country code, exact-matched by the public browse filter.
    pub country_code: String,
    pub sector: String,
    // Investment size bounds. Invariant: size_min <= size_max, enforced on write.
    pub size_min: f64,
    pub size_max: f64,
    pub return_pct: f64,
    pub timeline: String,
    pub status: ListingStatus,
    // Admin-curated homepage flag.
    pub featured: bool,
    /// Open key-value impact metrics, stored as JSONB.
    #[ts(type = "Record<string, string | number>")]
    #[schema(value_type = Object)]
    pub impact_metrics: Json<ImpactMetrics>,
    /// Ordered media URLs, stored as TEXT[].
    pub media_urls: Vec<String>,
    // FK to users.id. Always the authenticated creator, set server-side.
    pub owner_user_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// EngagementRequest
///
/// An investor's expressed interest toward a listing, from the
/// `engagement_requests` table. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct EngagementRequest {
    pub id: Uuid,

    /// Maps SQL column "type" to Rust field "engagement_type"; `type` is a
    /// reserved keyword in Rust. The JSON key stays "type" for API compatibility.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub engagement_type: EngagementType,

    pub amount: f64,
    pub status: EngagementStatus,
    pub details: Option<String>,
    // FK to users.id (the requesting investor). Forced to the session identity.
    pub user_id: Uuid,
    // FK to listings.id.
    pub listing_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// EngagementWithListing
///
/// An engagement request enriched with the minimal listing projection the
/// dashboard renders. The result of a JOIN in the repository query.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct EngagementWithListing {
    pub id: Uuid,

    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub engagement_type: EngagementType,

    pub amount: f64,
    pub status: EngagementStatus,
    pub details: Option<String>,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,

    // Joined listing fields.
    pub listing_title: String,
    pub listing_country_code: String,
    pub listing_sector: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /auth/register).
/// Required fields are Option-typed so presence is checked in the handler and
/// reported as a 400 rather than a deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Defaults to INVESTOR. ADMIN self-registration is rejected.
    pub role: Option<Role>,
}

/// CreateListingRequest
///
/// Input payload for submitting a new listing. `status` is only honored on the
/// admin path; contributor-created listings are forced to PENDING.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub country_code: Option<String>,
    pub sector: Option<String>,
    pub size_min: Option<f64>,
    pub size_max: Option<f64>,
    pub return_pct: Option<f64>,
    pub timeline: Option<String>,
    pub status: Option<ListingStatus>,
    pub featured: Option<bool>,
    #[ts(type = "Record<string, string | number> | null")]
    #[schema(value_type = Option<Object>)]
    pub impact_metrics: Option<ImpactMetrics>,
    pub media_urls: Option<Vec<String>>,
}

/// UpdateListingRequest
///
/// Partial update payload. `Option<T>` fields with
/// `#[serde(skip_serializing_if = "Option::is_none")]` so only provided fields
/// travel in the JSON payload; unset fields leave the column untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateListingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_max: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_pct: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,

    /// Status transitions (approve, send back to draft, archive) ride the admin
    /// patch. Stripped on the contributor path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, string | number> | null")]
    #[schema(value_type = Option<Object>)]
    pub impact_metrics: Option<ImpactMetrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<Vec<String>>,
}

/// CreateEngagementRequest
///
/// Input payload for expressing investment interest (POST /engagement-requests).
/// `listing_id`, `type`, and `amount` are required; the requesting user id is
/// never part of the payload — it comes from the session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEngagementRequest {
    pub listing_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub engagement_type: Option<EngagementType>,
    pub amount: Option<f64>,
    pub details: Option<String>,
}

// --- Validated Insert Records (Internal) ---

/// NewUser
///
/// A registration payload after validation and hashing, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// NewListing
///
/// A listing create payload after validation, with the status already resolved
/// from the creator's role.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub country_code: String,
    pub sector: String,
    pub size_min: f64,
    pub size_max: f64,
    pub return_pct: f64,
    pub timeline: String,
    pub status: ListingStatus,
    pub featured: bool,
    pub impact_metrics: ImpactMetrics,
    pub media_urls: Vec<String>,
}

/// NewEngagement
///
/// An engagement create payload after presence validation. Status is always
/// initialized to PENDING at insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEngagement {
    pub listing_id: Uuid,
    pub engagement_type: EngagementType,
    pub amount: f64,
    pub details: Option<String>,
}

// --- Query Parameters ---

/// ListingFilter
///
/// Accepted query parameters for the public browse endpoint (GET /investments).
/// Bound by Axum's Query extractor. Wire names are camelCase per the page's
/// query-string contract.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    /// Exact match on country_code.
    pub country: Option<String>,
    /// Exact match on sector.
    pub sector: Option<String>,
    /// Lower bound: size_min >= minSize.
    pub min_size: Option<f64>,
    /// Upper bound: size_max <= maxSize.
    pub max_size: Option<f64>,
    /// Lower bound: return_pct >= minReturn.
    pub min_return: Option<f64>,
    /// Case-insensitive substring match on title OR description.
    pub q: Option<String>,
}

// --- Reporting & Facet Schemas (Output) ---

/// ImpactStats
///
/// Read-only aggregates consumed by the reporting page: total approved
/// investment volume, live listing count, approved deal count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ImpactStats {
    pub total_investment: f64,
    pub active_listings: i64,
    pub successful_deals: i64,
}

/// ListingFacets
///
/// Distinct country/sector values across ACTIVE listings, driving the browse
/// page filter dropdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ListingFacets {
    pub countries: Vec<String>,
    pub sectors: Vec<String>,
}
