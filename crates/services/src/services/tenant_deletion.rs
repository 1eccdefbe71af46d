//! Hard and soft deletion of tenants, with validation, dry runs and an audit trail.
//!
//! Most dependent rows go away through `ON DELETE CASCADE`. A few legacy
//! tables are keyed by slug or carry no foreign key, so they are cleared by
//! hand first, each step isolated in its own savepoint.

use chrono::{DateTime, Utc};
use db::{DBService, models::tenant::{ApplicationStatus, Tenant}};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use thiserror::Error;
use tracing::{error, info, warn};
use ts_rs::TS;

pub const SAFE_TO_DELETE: &str = "Safe to delete";
pub const REQUIRES_FORCE: &str = "Requires force=true flag due to validation issues";

#[derive(Debug, Error)]
pub enum TenantDeletionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("tenant {0} not found")]
    NotFound(i64),
    #[error("deletion verification failed: {0}")]
    Verification(String),
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TenantInfo {
    pub id: i64,
    pub slug: String,
    pub business_name: String,
    pub email: Option<String>,
    pub user_id: Option<i64>,
    pub application_status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum DeletionIssueKind {
    ActiveSubscription,
    PendingBookings,
    RecentActivity,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeletionIssue {
    #[serde(rename = "type")]
    pub kind: DeletionIssueKind,
    pub message: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeletionValidation {
    pub is_valid: bool,
    pub issues: Vec<DeletionIssue>,
}

#[derive(Debug, Clone, Copy, Default, FromRow)]
struct BlockingCounts {
    active_subscriptions: i64,
    pending_bookings: i64,
    recent_bookings: i64,
}

impl DeletionValidation {
    fn from_counts(counts: BlockingCounts) -> Self {
        let mut issues = Vec::new();
        if counts.active_subscriptions > 0 {
            issues.push(DeletionIssue {
                kind: DeletionIssueKind::ActiveSubscription,
                message: format!(
                    "Tenant has {} active subscription(s)",
                    counts.active_subscriptions
                ),
                count: counts.active_subscriptions,
            });
        }
        if counts.pending_bookings > 0 {
            issues.push(DeletionIssue {
                kind: DeletionIssueKind::PendingBookings,
                message: format!("Tenant has {} pending bookings", counts.pending_bookings),
                count: counts.pending_bookings,
            });
        }
        if counts.recent_bookings > 0 {
            issues.push(DeletionIssue {
                kind: DeletionIssueKind::RecentActivity,
                message: format!(
                    "Tenant has {} recent bookings (last 30 days)",
                    counts.recent_bookings
                ),
                count: counts.recent_bookings,
            });
        }
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }

    fn has(&self, kind: DeletionIssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, TS)]
pub struct SnapshotCounts {
    pub services_count: i64,
    pub service_areas_count: i64,
    pub bookings_count: i64,
    pub subscriptions_count: i64,
}

/// Audit record captured before anything is removed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TenantSnapshot {
    pub tenant: TenantInfo,
    pub counts: SnapshotCounts,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, TS)]
pub struct RecordCounts {
    pub services: i64,
    pub service_tiers: i64,
    pub service_areas: i64,
    pub subscriptions: i64,
    pub bookings: i64,
    pub quotes: i64,
    pub appointments: i64,
    pub website_content: i64,
    pub reviews: i64,
    pub tenant_images: i64,
    pub user_record: i64,
}

impl RecordCounts {
    pub fn total(&self) -> i64 {
        self.services
            + self.service_tiers
            + self.service_areas
            + self.subscriptions
            + self.bookings
            + self.quotes
            + self.appointments
            + self.website_content
            + self.reviews
            + self.tenant_images
            + self.user_record
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeletionImpact {
    pub has_active_subscription: bool,
    pub has_pending_bookings: bool,
    pub has_recent_activity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DryRunReport {
    pub tenant: TenantInfo,
    pub validation: DeletionValidation,
    pub records_to_delete: RecordCounts,
    pub total_records: i64,
    pub impact: DeletionImpact,
    pub recommendation: String,
}

impl DryRunReport {
    pub fn build(tenant: TenantInfo, validation: DeletionValidation, counts: RecordCounts) -> Self {
        let impact = DeletionImpact {
            has_active_subscription: validation.has(DeletionIssueKind::ActiveSubscription),
            has_pending_bookings: validation.has(DeletionIssueKind::PendingBookings),
            has_recent_activity: validation.has(DeletionIssueKind::RecentActivity),
        };
        let recommendation = if validation.is_valid {
            SAFE_TO_DELETE
        } else {
            REQUIRES_FORCE
        };
        Self {
            tenant,
            total_records: counts.total(),
            records_to_delete: counts,
            impact,
            validation,
            recommendation: recommendation.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(default)]
pub struct DeleteOptions {
    pub force: bool,
    pub skip_validation: bool,
    pub dry_run: bool,
}

/// A manual cleanup step that failed and was rolled back to its savepoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SkippedCleanup {
    pub table: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeletedTenant {
    pub tenant: TenantInfo,
    pub snapshot: TenantSnapshot,
    pub skipped_cleanup: Vec<SkippedCleanup>,
}

#[derive(Debug, Clone)]
pub enum DeletionOutcome {
    DryRun(DryRunReport),
    Blocked {
        issues: Vec<DeletionIssue>,
        tenant: TenantInfo,
    },
    Deleted(DeletedTenant),
}

#[derive(Clone, Copy)]
enum CleanupKey {
    Slug,
    Id,
}

const MANUAL_CLEANUP: &[(&str, &str, CleanupKey)] = &[
    (
        "cleanup_reviews",
        "DELETE FROM reputation.reviews WHERE tenant_slug = $1 AND business_id IS NULL",
        CleanupKey::Slug,
    ),
    (
        "cleanup_images",
        "DELETE FROM tenants.tenant_images WHERE tenant_slug = $1",
        CleanupKey::Slug,
    ),
    (
        "cleanup_quotes",
        "DELETE FROM booking.quotes WHERE affiliate_id = $1",
        CleanupKey::Id,
    ),
];

#[derive(Debug, FromRow)]
struct VerificationCounts {
    business_exists: i64,
    services_remaining: i64,
    bookings_remaining: i64,
    subscriptions_remaining: i64,
}

#[derive(Clone)]
pub struct TenantDeletionService {
    db: DBService,
}

impl TenantDeletionService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn get_tenant_info(&self, tenant_id: i64) -> Result<TenantInfo, TenantDeletionError> {
        let mut conn = self.db.pool.acquire().await?;
        Self::tenant_info(&mut conn, tenant_id).await
    }

    pub async fn validate(&self, tenant_id: i64) -> Result<DeletionValidation, TenantDeletionError> {
        let mut conn = self.db.pool.acquire().await?;
        Self::validate_with(&mut conn, tenant_id).await
    }

    pub async fn snapshot(&self, tenant_id: i64) -> Result<TenantSnapshot, TenantDeletionError> {
        let mut conn = self.db.pool.acquire().await?;
        Self::snapshot_with(&mut conn, tenant_id).await
    }

    pub async fn dry_run(
        &self,
        tenant_id: i64,
        actor: &str,
    ) -> Result<DryRunReport, TenantDeletionError> {
        info!(tenant_id, actor, "Starting dry-run tenant deletion analysis");
        let mut conn = self.db.pool.acquire().await?;
        let tenant = Self::tenant_info(&mut conn, tenant_id).await?;
        let validation = Self::validate_with(&mut conn, tenant_id).await?;
        let counts = sqlx::query_as::<_, RecordCounts>(
            r#"SELECT
                 (SELECT COUNT(*) FROM tenants.services WHERE business_id = $1) AS services,
                 (SELECT COUNT(*) FROM tenants.service_tiers
                    WHERE service_id IN (SELECT id FROM tenants.services WHERE business_id = $1)) AS service_tiers,
                 (SELECT COALESCE(SUM(CASE WHEN jsonb_typeof(service_areas) = 'array'
                                           THEN jsonb_array_length(service_areas) ELSE 0 END), 0)::bigint
                    FROM tenants.business WHERE id = $1) AS service_areas,
                 (SELECT COUNT(*) FROM tenants.subscriptions WHERE business_id = $1) AS subscriptions,
                 (SELECT COUNT(*) FROM booking.bookings WHERE tenant_id = $1) AS bookings,
                 (SELECT COUNT(*) FROM booking.quotes WHERE affiliate_id = $1) AS quotes,
                 (SELECT COUNT(*) FROM schedule.appointments WHERE affiliate_id = $1) AS appointments,
                 (SELECT COUNT(*) FROM website.content WHERE business_id = $1) AS website_content,
                 (SELECT COUNT(*) FROM reputation.reviews WHERE business_id = $1 OR tenant_slug = $2) AS reviews,
                 (SELECT COUNT(*) FROM tenants.tenant_images WHERE tenant_slug = $2) AS tenant_images,
                 (SELECT COUNT(*) FROM auth.users WHERE id = $3) AS user_record"#,
        )
        .bind(tenant_id)
        .bind(&tenant.slug)
        .bind(tenant.user_id)
        .fetch_one(&mut *conn)
        .await?;

        let report = DryRunReport::build(tenant, validation, counts);
        info!(
            tenant_id,
            total_records = report.total_records,
            can_delete_safely = report.validation.is_valid,
            "Dry-run analysis completed"
        );
        Ok(report)
    }

    pub async fn delete(
        &self,
        tenant_id: i64,
        actor: &str,
        options: &DeleteOptions,
    ) -> Result<DeletionOutcome, TenantDeletionError> {
        if options.dry_run {
            return Ok(DeletionOutcome::DryRun(self.dry_run(tenant_id, actor).await?));
        }
        info!(
            tenant_id,
            actor,
            force = options.force,
            skip_validation = options.skip_validation,
            "Starting tenant deletion"
        );

        let result = self.delete_in_transaction(tenant_id, actor, options).await;
        if let Err(e) = &result {
            error!(tenant_id, error = %e, "Tenant deletion failed");
        }
        result
    }

    async fn delete_in_transaction(
        &self,
        tenant_id: i64,
        actor: &str,
        options: &DeleteOptions,
    ) -> Result<DeletionOutcome, TenantDeletionError> {
        let mut tx = self.db.pool.begin().await?;

        let tenant = Self::tenant_info(&mut tx, tenant_id).await?;
        let snapshot = Self::snapshot_with(&mut tx, tenant_id).await?;

        if !options.skip_validation {
            let validation = Self::validate_with(&mut tx, tenant_id).await?;
            if !validation.is_valid {
                if !options.force {
                    tx.rollback().await?;
                    return Ok(DeletionOutcome::Blocked {
                        issues: validation.issues,
                        tenant,
                    });
                }
                warn!(
                    tenant_id,
                    issues = ?validation.issues,
                    "Force deletion with validation issues"
                );
            }
        }

        let skipped_cleanup = Self::manual_cleanup(&mut tx, tenant_id, &tenant.slug).await?;

        let deleted = sqlx::query("DELETE FROM tenants.business WHERE id = $1")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Err(TenantDeletionError::NotFound(tenant_id));
        }

        if let Some(user_id) = tenant.user_id {
            db::models::user::User::delete(&mut *tx, user_id).await?;
            info!(tenant_id, user_id, "Deleted associated user record");
        }

        let check = sqlx::query_as::<_, VerificationCounts>(
            r#"SELECT
                 (SELECT COUNT(*) FROM tenants.business WHERE id = $1) AS business_exists,
                 (SELECT COUNT(*) FROM tenants.services WHERE business_id = $1) AS services_remaining,
                 (SELECT COUNT(*) FROM booking.bookings WHERE tenant_id = $1) AS bookings_remaining,
                 (SELECT COUNT(*) FROM tenants.subscriptions WHERE business_id = $1) AS subscriptions_remaining"#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;
        if let Some(problem) = verification_problem(&check) {
            tx.rollback().await?;
            return Err(TenantDeletionError::Verification(problem));
        }

        tx.commit().await?;

        info!(
            tenant_id,
            tenant_slug = %tenant.slug,
            business_name = %tenant.business_name,
            actor,
            snapshot = ?snapshot,
            skipped = skipped_cleanup.len(),
            "Tenant deletion completed"
        );

        Ok(DeletionOutcome::Deleted(DeletedTenant {
            tenant,
            snapshot,
            skipped_cleanup,
        }))
    }

    pub async fn soft_delete(&self, tenant_id: i64, actor: &str) -> Result<Tenant, TenantDeletionError> {
        let tenant = Tenant::mark_deleted(&self.db.pool, tenant_id)
            .await?
            .ok_or(TenantDeletionError::NotFound(tenant_id))?;
        info!(
            tenant_id,
            tenant_slug = %tenant.slug,
            business_name = %tenant.business_name,
            actor,
            "Tenant soft deleted"
        );
        Ok(tenant)
    }

    async fn tenant_info(
        conn: &mut PgConnection,
        tenant_id: i64,
    ) -> Result<TenantInfo, TenantDeletionError> {
        sqlx::query_as::<_, TenantInfo>(
            r#"SELECT id, slug, business_name, business_email AS email,
                      user_id, application_status, created_at, updated_at
               FROM tenants.business
               WHERE id = $1"#,
        )
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(TenantDeletionError::NotFound(tenant_id))
    }

    async fn validate_with(
        conn: &mut PgConnection,
        tenant_id: i64,
    ) -> Result<DeletionValidation, TenantDeletionError> {
        let counts = sqlx::query_as::<_, BlockingCounts>(
            r#"SELECT
                 (SELECT COUNT(*) FROM tenants.subscriptions
                    WHERE business_id = $1 AND status IN ('active', 'trialing')) AS active_subscriptions,
                 (SELECT COUNT(*) FROM booking.bookings
                    WHERE tenant_id = $1 AND status IN ('pending', 'confirmed')) AS pending_bookings,
                 (SELECT COUNT(*) FROM booking.bookings
                    WHERE tenant_id = $1 AND created_at > NOW() - INTERVAL '30 days') AS recent_bookings"#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(DeletionValidation::from_counts(counts))
    }

    async fn snapshot_with(
        conn: &mut PgConnection,
        tenant_id: i64,
    ) -> Result<TenantSnapshot, TenantDeletionError> {
        let tenant = Self::tenant_info(conn, tenant_id).await?;
        let counts = sqlx::query_as::<_, SnapshotCounts>(
            r#"SELECT
                 (SELECT COUNT(*) FROM tenants.services WHERE business_id = $1) AS services_count,
                 (SELECT COALESCE(SUM(CASE WHEN jsonb_typeof(service_areas) = 'array'
                                           THEN jsonb_array_length(service_areas) ELSE 0 END), 0)::bigint
                    FROM tenants.business WHERE id = $1) AS service_areas_count,
                 (SELECT COUNT(*) FROM booking.bookings WHERE tenant_id = $1) AS bookings_count,
                 (SELECT COUNT(*) FROM tenants.subscriptions WHERE business_id = $1) AS subscriptions_count"#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(TenantSnapshot {
            tenant,
            counts,
            timestamp: Utc::now(),
        })
    }

    /// Run each slug- or id-keyed cleanup inside a savepoint. Failures are
    /// rolled back and reported instead of aborting the deletion.
    async fn manual_cleanup(
        conn: &mut PgConnection,
        tenant_id: i64,
        slug: &str,
    ) -> Result<Vec<SkippedCleanup>, TenantDeletionError> {
        let mut skipped = Vec::new();
        for (name, statement, key) in MANUAL_CLEANUP {
            sqlx::query(&format!("SAVEPOINT {name}"))
                .execute(&mut *conn)
                .await?;
            let query = sqlx::query(statement);
            let query = match key {
                CleanupKey::Slug => query.bind(slug),
                CleanupKey::Id => query.bind(tenant_id),
            };
            match query.execute(&mut *conn).await {
                Ok(done) => {
                    sqlx::query(&format!("RELEASE SAVEPOINT {name}"))
                        .execute(&mut *conn)
                        .await?;
                    info!(tenant_id, step = name, rows = done.rows_affected(), "Manual cleanup step done");
                }
                Err(e) => {
                    sqlx::query(&format!("ROLLBACK TO SAVEPOINT {name}"))
                        .execute(&mut *conn)
                        .await?;
                    warn!(tenant_id, step = name, error = %e, "Skipping cleanup step");
                    skipped.push(SkippedCleanup {
                        table: name.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(skipped)
    }
}

fn verification_problem(check: &VerificationCounts) -> Option<String> {
    if check.business_exists > 0 {
        return Some("business row still present".to_string());
    }
    let orphans = [
        ("services", check.services_remaining),
        ("bookings", check.bookings_remaining),
        ("subscriptions", check.subscriptions_remaining),
    ];
    let remaining: Vec<String> = orphans
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(table, n)| format!("{n} {table}"))
        .collect();
    if remaining.is_empty() {
        None
    } else {
        Some(format!("orphaned rows remain: {}", remaining.join(", ")))
    }
}
