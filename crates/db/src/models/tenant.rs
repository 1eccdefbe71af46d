use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, PgConnection, PgPool, Postgres, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::service_area::ServiceArea;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Deleted,
}

/// Vertical a tenant site is rendered for
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "industry", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Industry {
    #[default]
    MobileDetailing,
    PetGrooming,
    MaidService,
    LawnCare,
    HouseCleaning,
    BarberShop,
}

impl Industry {
    /// Human label used in generated copy, e.g. "mobile detailing".
    pub fn label(&self) -> String {
        self.to_string().replace('-', " ")
    }
}

/// Row of `tenants.business`
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Tenant {
    pub id: i64,
    pub slug: String,
    pub business_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_id: Option<i64>,
    pub application_status: ApplicationStatus,
    pub industry: Industry,
    pub business_phone: Option<String>,
    pub personal_phone: Option<String>,
    pub business_email: Option<String>,
    pub personal_email: Option<String>,
    pub website: Option<String>,
    pub gbp_url: Option<String>,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub website_domain: Option<String>,
    pub notes: Option<String>,
    #[ts(type = "unknown")]
    pub service_areas: serde_json::Value,
    pub application_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Parsed service areas; malformed JSON yields an empty list.
    pub fn service_areas(&self) -> Vec<ServiceArea> {
        ServiceArea::parse_list(&self.service_areas)
    }
}

/// Data for a new `tenants.business` row
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub slug: String,
    pub business_name: String,
    pub first_name: String,
    pub last_name: String,
    pub user_id: i64,
    pub business_phone: String,
    pub personal_phone: String,
    pub business_email: String,
    pub personal_email: String,
    pub industry: Industry,
    pub application_status: ApplicationStatus,
    pub notes: String,
    pub service_areas: Vec<ServiceArea>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct IndustryCount {
    pub industry: Industry,
    pub count: i64,
}

impl Tenant {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants.business WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants.business WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_approved_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"SELECT * FROM tenants.business
               WHERE slug = $1 AND application_status = 'approved'"#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Resolve the approved tenant serving `host`, either through its custom
    /// domain or through a subdomain equal to its slug.
    pub async fn find_by_host(
        pool: &PgPool,
        host: &str,
        subdomain: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"SELECT * FROM tenants.business
               WHERE application_status = 'approved'
                 AND (website_domain = $1 OR slug = $2)
               ORDER BY (website_domain = $1) DESC NULLS LAST, approved_date DESC NULLS LAST
               LIMIT 1"#,
        )
        .bind(host)
        .bind(subdomain)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        status: ApplicationStatus,
        industry: Option<Industry>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"SELECT * FROM tenants.business
               WHERE application_status = $1
                 AND ($2::industry IS NULL OR industry = $2)
               ORDER BY created_at DESC"#,
        )
        .bind(status)
        .bind(industry)
        .fetch_all(pool)
        .await
    }

    pub async fn find_pending(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"SELECT * FROM tenants.business
               WHERE application_status = 'pending'
               ORDER BY application_date ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn industry_counts(pool: &PgPool) -> Result<Vec<IndustryCount>, sqlx::Error> {
        sqlx::query_as::<_, IndustryCount>(
            r#"SELECT industry, COUNT(*) AS count
               FROM tenants.business
               WHERE application_status = 'approved'
               GROUP BY industry
               ORDER BY count DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn slug_exists<'e, E>(executor: E, slug: &str) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tenants.business WHERE slug = $1)",
        )
        .bind(slug)
        .fetch_one(executor)
        .await
    }

    pub async fn slug_taken_by_other(
        pool: &PgPool,
        slug: &str,
        id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tenants.business WHERE slug = $1 AND id <> $2)",
        )
        .bind(slug)
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn create<'e, E>(executor: E, data: &CreateTenant) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"INSERT INTO tenants.business (
                   slug, business_name, first_name, last_name, user_id,
                   business_phone, personal_phone, business_email, personal_email,
                   industry, application_status, approved_date, notes, service_areas
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                       CASE WHEN $11 = 'approved'::application_status THEN NOW() END,
                       $12, $13)
               RETURNING *"#,
        )
        .bind(&data.slug)
        .bind(&data.business_name)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.user_id)
        .bind(&data.business_phone)
        .bind(&data.personal_phone)
        .bind(&data.business_email)
        .bind(&data.personal_email)
        .bind(data.industry)
        .bind(data.application_status)
        .bind(&data.notes)
        .bind(sqlx::types::Json(&data.service_areas))
        .fetch_one(executor)
        .await
    }

    /// Approve a pending application. `None` means the row was no longer
    /// pending when the update ran.
    pub async fn approve(
        pool: &PgPool,
        id: i64,
        slug: &str,
        admin_notes: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"UPDATE tenants.business
               SET application_status = 'approved',
                   slug = $2,
                   approved_date = NOW(),
                   updated_at = NOW(),
                   notes = CASE
                       WHEN $3::text IS NULL THEN notes
                       WHEN notes IS NULL THEN $3
                       ELSE notes || E'\n\nAdmin Approval Notes: ' || $3
                   END
               WHERE id = $1 AND application_status = 'pending'
               RETURNING *"#,
        )
        .bind(id)
        .bind(slug)
        .bind(admin_notes)
        .fetch_optional(pool)
        .await
    }

    pub async fn reject(
        pool: &PgPool,
        id: i64,
        reason: &str,
        admin_notes: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"UPDATE tenants.business
               SET application_status = 'rejected',
                   updated_at = NOW(),
                   notes = COALESCE(notes || E'\n\n', '')
                       || 'Rejection Reason: ' || $2
                       || COALESCE(E'\nAdmin Notes: ' || $3::text, '')
               WHERE id = $1 AND application_status = 'pending'
               RETURNING *"#,
        )
        .bind(id)
        .bind(reason)
        .bind(admin_notes)
        .fetch_optional(pool)
        .await
    }

    pub async fn mark_deleted(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"UPDATE tenants.business
               SET application_status = 'deleted',
                   updated_at = NOW(),
                   last_activity = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lock the business row for the rest of the transaction and return its
    /// current service areas. `None` when the row is gone.
    pub async fn lock_service_areas(
        conn: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Vec<ServiceArea>>, sqlx::Error> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT service_areas FROM tenants.business WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(value.map(|v| ServiceArea::parse_list(&v)))
    }

    pub async fn update_service_areas<'e, E>(
        executor: E,
        id: i64,
        areas: &[ServiceArea],
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"UPDATE tenants.business
               SET service_areas = $2, updated_at = NOW(), last_activity = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(sqlx::types::Json(areas))
        .execute(executor)
        .await?;
        Ok(())
    }
}
