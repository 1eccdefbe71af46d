//! Admin review of pending tenant applications.

use db::{DBService, models::tenant::{ApplicationStatus, Tenant}};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use utils::slug::{SlugError, validate_slug};

use super::validation::{Checks, ValidationError};

#[derive(Debug, Error)]
pub enum ApplicationReviewError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("application {0} not found")]
    NotFound(i64),
    #[error("Application is not in pending status (current status: {0})")]
    NotPending(ApplicationStatus),
    #[error("Slug '{0}' is already taken by another tenant")]
    SlugTaken(String),
    #[error("Application was modified by another request; reload and try again")]
    ConcurrentModification,
}

impl From<SlugError> for ApplicationReviewError {
    fn from(e: SlugError) -> Self {
        Self::Validation(ValidationError::single(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApproveApplication {
    pub approved_slug: String,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RejectApplication {
    pub rejection_reason: String,
    pub admin_notes: Option<String>,
}

impl ApproveApplication {
    pub fn validate(&self) -> Result<(), ApplicationReviewError> {
        validate_slug(&self.approved_slug)?;
        Checks::new()
            .max_len("admin_notes", self.admin_notes.as_deref(), 1000)
            .finish()?;
        Ok(())
    }
}

impl RejectApplication {
    pub fn validate(&self) -> Result<(), ApplicationReviewError> {
        Checks::new()
            .len_between("rejection_reason", self.rejection_reason.trim(), 10, 500)
            .max_len("admin_notes", self.admin_notes.as_deref(), 1000)
            .finish()?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ApplicationReviewService {
    db: DBService,
}

impl ApplicationReviewService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn pending_applications(&self) -> Result<Vec<Tenant>, ApplicationReviewError> {
        Ok(Tenant::find_pending(&self.db.pool).await?)
    }

    async fn load_pending(&self, id: i64) -> Result<Tenant, ApplicationReviewError> {
        let tenant = Tenant::find_by_id(&self.db.pool, id)
            .await?
            .ok_or(ApplicationReviewError::NotFound(id))?;
        if tenant.application_status != ApplicationStatus::Pending {
            return Err(ApplicationReviewError::NotPending(tenant.application_status));
        }
        Ok(tenant)
    }

    pub async fn approve(
        &self,
        id: i64,
        request: &ApproveApplication,
        admin_email: &str,
    ) -> Result<Tenant, ApplicationReviewError> {
        request.validate()?;
        if Tenant::slug_taken_by_other(&self.db.pool, &request.approved_slug, id).await? {
            return Err(ApplicationReviewError::SlugTaken(request.approved_slug.clone()));
        }
        self.load_pending(id).await?;

        let notes = request.admin_notes.as_deref().filter(|n| !n.trim().is_empty());
        let Some(tenant) = Tenant::approve(&self.db.pool, id, &request.approved_slug, notes).await?
        else {
            warn!(tenant_id = id, "Approval lost a race with another admin");
            return Err(ApplicationReviewError::ConcurrentModification);
        };
        info!(
            tenant_id = id,
            slug = %tenant.slug,
            admin = admin_email,
            "Application approved"
        );
        Ok(tenant)
    }

    pub async fn reject(
        &self,
        id: i64,
        request: &RejectApplication,
        admin_email: &str,
    ) -> Result<Tenant, ApplicationReviewError> {
        request.validate()?;
        self.load_pending(id).await?;

        let notes = request.admin_notes.as_deref().filter(|n| !n.trim().is_empty());
        let Some(tenant) =
            Tenant::reject(&self.db.pool, id, request.rejection_reason.trim(), notes).await?
        else {
            warn!(tenant_id = id, "Rejection lost a race with another admin");
            return Err(ApplicationReviewError::ConcurrentModification);
        };
        info!(tenant_id = id, admin = admin_email, "Application rejected");
        Ok(tenant)
    }
}
