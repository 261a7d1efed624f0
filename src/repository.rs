use crate::models::{
    EngagementRequest, EngagementWithListing, ImpactStats, Listing, ListingFacets, ListingFilter,
    NewEngagement, NewListing, NewUser, UpdateListingRequest, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder, types::Json};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations, allowing handlers to
/// interact with the data layer without knowing the concrete implementation
/// (Postgres in production, an in-memory mock in tests).
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's asynchronous task boundaries. Every method
/// returns `Result`; a store failure propagates to the handler, which logs it
/// and answers with a generic 500.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn create_user(&self, new: NewUser) -> Result<User, sqlx::Error>;

    // --- Listings ---
    // Admin review queue: every listing, status ascending then newest first.
    async fn list_all_listings(&self) -> Result<Vec<Listing>, sqlx::Error>;
    // Listings owned by the given user, newest first. The owner id is always
    // the authenticated identity, never a client-supplied value.
    async fn list_owned_listings(&self, owner_id: Uuid) -> Result<Vec<Listing>, sqlx::Error>;
    // Public browse. Must enforce status = ACTIVE unconditionally.
    async fn list_active_listings(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<Listing>, sqlx::Error>;
    // Distinct country/sector values over ACTIVE listings.
    async fn active_listing_facets(&self) -> Result<ListingFacets, sqlx::Error>;
    // Fetch by primary key, no visibility filter; the handler scopes visibility.
    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, sqlx::Error>;
    async fn create_listing(
        &self,
        new: NewListing,
        owner_id: Uuid,
    ) -> Result<Listing, sqlx::Error>;
    // Admin partial update of any field, including status and featured.
    async fn update_listing(
        &self,
        id: Uuid,
        patch: UpdateListingRequest,
    ) -> Result<Option<Listing>, sqlx::Error>;
    // Owner-scoped partial update: the ownership and lifecycle checks live in
    // the query predicate (owner_user_id match, status DRAFT or PENDING).
    // Never touches status or featured.
    async fn update_owned_listing(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: UpdateListingRequest,
    ) -> Result<Option<Listing>, sqlx::Error>;
    // Admin-only delete. Returns false when no row matched.
    async fn delete_listing(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Engagement Requests ---
    // Status is always initialized to PENDING; user_id is the session identity.
    async fn create_engagement(
        &self,
        new: NewEngagement,
        user_id: Uuid,
    ) -> Result<EngagementRequest, sqlx::Error>;
    // The caller's requests, newest first, joined with the minimal listing projection.
    async fn list_engagements_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EngagementWithListing>, sqlx::Error>;

    // --- Reporting ---
    async fn impact_stats(&self) -> Result<ImpactStats, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

const LISTING_COLUMNS: &str = "id, title, description, country_code, sector, size_min, size_max, \
     return_pct, timeline, status, featured, impact_metrics, media_urls, owner_user_id, created_at";

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

const ENGAGEMENT_COLUMNS: &str =
    r#"id, "type", amount, status, details, user_id, listing_id, created_at"#;

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Case-sensitive unique lookup, used by registration's duplicate check.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts the registered user. The unique index on email backstops the
    /// handler's duplicate check; a concurrent double-submit surfaces as a
    /// unique violation, which the error layer reports as Conflict.
    async fn create_user(&self, new: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.role)
        .fetch_one(&self.pool)
        .await
    }

    /// list_all_listings
    ///
    /// Administrative review queue. Status ascending puts DRAFT/PENDING work
    /// above live and archived rows; within a status, newest first.
    async fn list_all_listings(&self) -> Result<Vec<Listing>, sqlx::Error> {
        sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings ORDER BY status ASC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn list_owned_listings(&self, owner_id: Uuid) -> Result<Vec<Listing>, sqlx::Error> {
        sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE owner_user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    /// list_active_listings
    ///
    /// Public browse with optional narrowing, assembled with QueryBuilder so
    /// every value travels as a bind parameter. The base predicate
    /// `status = 'ACTIVE'` is unconditional; no filter combination can widen it.
    async fn list_active_listings(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<Listing>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE status = 'ACTIVE'"
        ));

        if let Some(country) = &filter.country {
            builder.push(" AND country_code = ");
            builder.push_bind(country.clone());
        }

        if let Some(sector) = &filter.sector {
            builder.push(" AND sector = ");
            builder.push_bind(sector.clone());
        }

        if let Some(min_size) = filter.min_size {
            builder.push(" AND size_min >= ");
            builder.push_bind(min_size);
        }

        if let Some(max_size) = filter.max_size {
            builder.push(" AND size_max <= ");
            builder.push_bind(max_size);
        }

        if let Some(min_return) = filter.min_return {
            builder.push(" AND return_pct >= ");
            builder.push_bind(min_return);
        }

        if let Some(q) = &filter.q {
            // Case-insensitive substring search across title and description.
            let pattern = format!("%{}%", q);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        builder
            .build_query_as::<Listing>()
            .fetch_all(&self.pool)
            .await
    }

    async fn active_listing_facets(&self) -> Result<ListingFacets, sqlx::Error> {
        let countries: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT country_code FROM listings WHERE status = 'ACTIVE' \
             ORDER BY country_code",
        )
        .fetch_all(&self.pool)
        .await?;

        let sectors: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT sector FROM listings WHERE status = 'ACTIVE' ORDER BY sector",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ListingFacets { countries, sectors })
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, sqlx::Error> {
        sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// create_listing
    ///
    /// Inserts a new listing. The status arrives already resolved from the
    /// creator's role, and the owner is always the authenticated creator.
    async fn create_listing(
        &self,
        new: NewListing,
        owner_id: Uuid,
    ) -> Result<Listing, sqlx::Error> {
        sqlx::query_as::<_, Listing>(&format!(
            "INSERT INTO listings (id, title, description, country_code, sector, size_min, \
             size_max, return_pct, timeline, status, featured, impact_metrics, media_urls, \
             owner_user_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW()) \
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.title)
        .bind(new.description)
        .bind(new.country_code)
        .bind(new.sector)
        .bind(new.size_min)
        .bind(new.size_max)
        .bind(new.return_pct)
        .bind(new.timeline)
        .bind(new.status)
        .bind(new.featured)
        .bind(Json(new.impact_metrics))
        .bind(new.media_urls)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
    }

    /// update_listing
    ///
    /// Admin partial update. COALESCE leaves a column untouched when the
    /// corresponding patch field is None. Returns None when the id is absent.
    async fn update_listing(
        &self,
        id: Uuid,
        patch: UpdateListingRequest,
    ) -> Result<Option<Listing>, sqlx::Error> {
        sqlx::query_as::<_, Listing>(&format!(
            "UPDATE listings SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 country_code = COALESCE($4, country_code), \
                 sector = COALESCE($5, sector), \
                 size_min = COALESCE($6, size_min), \
                 size_max = COALESCE($7, size_max), \
                 return_pct = COALESCE($8, return_pct), \
                 timeline = COALESCE($9, timeline), \
                 status = COALESCE($10, status), \
                 featured = COALESCE($11, featured), \
                 impact_metrics = COALESCE($12, impact_metrics), \
                 media_urls = COALESCE($13, media_urls) \
             WHERE id = $1 \
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.country_code)
        .bind(patch.sector)
        .bind(patch.size_min)
        .bind(patch.size_max)
        .bind(patch.return_pct)
        .bind(patch.timeline)
        .bind(patch.status)
        .bind(patch.featured)
        .bind(patch.impact_metrics.map(Json))
        .bind(patch.media_urls)
        .fetch_optional(&self.pool)
        .await
    }

    /// update_owned_listing
    ///
    /// Owner-scoped partial update. The **Owner-Only** check and the lifecycle
    /// restriction (a listing stops being owner-editable once ACTIVE or
    /// ARCHIVED) are both part of the WHERE clause, so a non-owner or an
    /// out-of-lifecycle edit affects zero rows and reads as NotFound. Status
    /// and featured are not in the SET list.
    async fn update_owned_listing(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: UpdateListingRequest,
    ) -> Result<Option<Listing>, sqlx::Error> {
        sqlx::query_as::<_, Listing>(&format!(
            "UPDATE listings SET \
                 title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 country_code = COALESCE($5, country_code), \
                 sector = COALESCE($6, sector), \
                 size_min = COALESCE($7, size_min), \
                 size_max = COALESCE($8, size_max), \
                 return_pct = COALESCE($9, return_pct), \
                 timeline = COALESCE($10, timeline), \
                 impact_metrics = COALESCE($11, impact_metrics), \
                 media_urls = COALESCE($12, media_urls) \
             WHERE id = $1 AND owner_user_id = $2 AND status IN ('DRAFT', 'PENDING') \
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.country_code)
        .bind(patch.sector)
        .bind(patch.size_min)
        .bind(patch.size_max)
        .bind(patch.return_pct)
        .bind(patch.timeline)
        .bind(patch.impact_metrics.map(Json))
        .bind(patch.media_urls)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_listing(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// create_engagement
    ///
    /// Inserts an engagement request with status PENDING. The FK on listing_id
    /// rejects requests against a missing listing; the error layer reports
    /// that as NotFound.
    async fn create_engagement(
        &self,
        new: NewEngagement,
        user_id: Uuid,
    ) -> Result<EngagementRequest, sqlx::Error> {
        sqlx::query_as::<_, EngagementRequest>(&format!(
            r#"
            INSERT INTO engagement_requests
                (id, "type", amount, status, details, user_id, listing_id, created_at)
            VALUES ($1, $2, $3, 'PENDING', $4, $5, $6, NOW())
            RETURNING {ENGAGEMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.engagement_type)
        .bind(new.amount)
        .bind(new.details)
        .bind(user_id)
        .bind(new.listing_id)
        .fetch_one(&self.pool)
        .await
    }

    /// list_engagements_for_user
    ///
    /// The caller's engagement requests joined with the minimal listing
    /// projection the dashboard renders, newest first.
    async fn list_engagements_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EngagementWithListing>, sqlx::Error> {
        sqlx::query_as::<_, EngagementWithListing>(
            r#"
            SELECT
                e.id, e."type", e.amount, e.status, e.details, e.user_id, e.listing_id,
                e.created_at,
                l.title AS listing_title,
                l.country_code AS listing_country_code,
                l.sector AS listing_sector
            FROM engagement_requests e
            JOIN listings l ON e.listing_id = l.id
            WHERE e.user_id = $1
            ORDER BY e.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// impact_stats
    ///
    /// Compiles the reporting counters in one call: approved investment volume,
    /// live listing count, approved deal count.
    async fn impact_stats(&self) -> Result<ImpactStats, sqlx::Error> {
        let total_investment: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::float8 FROM engagement_requests \
             WHERE status = 'APPROVED'",
        )
        .fetch_one(&self.pool)
        .await?;

        let active_listings: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM listings WHERE status = 'ACTIVE'")
                .fetch_one(&self.pool)
                .await?;

        let successful_deals: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM engagement_requests WHERE status = 'APPROVED'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ImpactStats {
            total_investment,
            active_listings,
            successful_deals,
        })
    }
}
