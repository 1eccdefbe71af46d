use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use services::services::{
    application_review::ApplicationReviewError,
    auth::AuthError,
    reviews::ReviewError,
    service_areas::ServiceAreaError,
    service_catalog::ServiceCatalogError,
    tenant_deletion::{DeletionIssue, TenantDeletionError, TenantInfo},
    tenant_provision::ProvisionError,
    tenants::TenantError,
    website_content::WebsiteContentError,
};
use thiserror::Error;
use ts_rs::TS;
use utils::response::ApiResponse;

const INTERNAL_ERROR: &str = "Internal server error";
const DUPLICATE_RECORD: &str = "A record with these details already exists";

/// Body of a 409 returned when deletion is blocked by validation issues.
#[derive(Debug, Clone, Serialize, TS)]
pub struct DeletionBlocked {
    pub message: String,
    pub issues: Vec<DeletionIssue>,
    pub tenant: TenantInfo,
    pub hint: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tenant(#[from] TenantError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error(transparent)]
    ApplicationReview(#[from] ApplicationReviewError),
    #[error(transparent)]
    TenantDeletion(#[from] TenantDeletionError),
    #[error(transparent)]
    ServiceCatalog(#[from] ServiceCatalogError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    WebsiteContent(#[from] WebsiteContentError),
    #[error(transparent)]
    ServiceArea(#[from] ServiceAreaError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Too many requests from this IP, please try again later.")]
    RateLimited { retry_after_secs: u64 },
    #[error("tenant deletion blocked by {} issue(s)", .0.issues.len())]
    DeletionBlocked(Box<DeletionBlocked>),
}

/// Pool exhaustion is transient and a unique violation is a conflict with an
/// existing row; everything else from the driver is a 500.
fn database_status(e: &sqlx::Error) -> StatusCode {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => StatusCode::SERVICE_UNAVAILABLE,
        sqlx::Error::Database(db) if db.is_unique_violation() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// The driver error underneath, whichever service surfaced it.
    pub fn database_error(&self) -> Option<&sqlx::Error> {
        match self {
            ApiError::Tenant(TenantError::Database(db))
            | ApiError::Provision(ProvisionError::Database(db))
            | ApiError::ApplicationReview(ApplicationReviewError::Database(db))
            | ApiError::TenantDeletion(TenantDeletionError::Database(db))
            | ApiError::ServiceCatalog(ServiceCatalogError::Database(db))
            | ApiError::Review(ReviewError::Database(db))
            | ApiError::WebsiteContent(WebsiteContentError::Database(db))
            | ApiError::ServiceArea(ServiceAreaError::Database(db))
            | ApiError::Auth(AuthError::Database(db))
            | ApiError::Database(db) => Some(db),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        use StatusCode as S;
        match self {
            ApiError::Tenant(e) => match e {
                TenantError::Database(db) => database_status(db),
                TenantError::NotFound(_) => S::NOT_FOUND,
            },
            ApiError::Provision(e) => match e {
                ProvisionError::Database(db) => database_status(db),
                ProvisionError::Validation(_) | ProvisionError::EmailTaken => S::BAD_REQUEST,
                ProvisionError::SlugExhausted(_) => S::CONFLICT,
            },
            ApiError::ApplicationReview(e) => match e {
                ApplicationReviewError::Database(db) => database_status(db),
                ApplicationReviewError::Validation(_) | ApplicationReviewError::NotPending(_) => {
                    S::BAD_REQUEST
                }
                ApplicationReviewError::NotFound(_) => S::NOT_FOUND,
                ApplicationReviewError::SlugTaken(_)
                | ApplicationReviewError::ConcurrentModification => S::CONFLICT,
            },
            ApiError::TenantDeletion(e) => match e {
                TenantDeletionError::Database(db) => database_status(db),
                TenantDeletionError::NotFound(_) => S::NOT_FOUND,
                TenantDeletionError::Verification(_) => S::INTERNAL_SERVER_ERROR,
            },
            ApiError::ServiceCatalog(e) => match e {
                ServiceCatalogError::Database(db) => database_status(db),
                ServiceCatalogError::Validation(_)
                | ServiceCatalogError::UnknownVehicle(_)
                | ServiceCatalogError::UnknownCategory(_) => S::BAD_REQUEST,
                ServiceCatalogError::TenantNotFound(_) | ServiceCatalogError::NotFound(_) => {
                    S::NOT_FOUND
                }
            },
            ApiError::Review(e) => match e {
                ReviewError::Database(db) => database_status(db),
                ReviewError::Validation(_) => S::BAD_REQUEST,
                ReviewError::NotFound(_) => S::NOT_FOUND,
            },
            ApiError::WebsiteContent(e) => match e {
                WebsiteContentError::Database(db) => database_status(db),
                WebsiteContentError::Validation(_) => S::BAD_REQUEST,
                WebsiteContentError::TenantNotFound(_) => S::NOT_FOUND,
            },
            ApiError::ServiceArea(e) => match e {
                ServiceAreaError::Database(db) => database_status(db),
                ServiceAreaError::Validation(_) => S::BAD_REQUEST,
                ServiceAreaError::Duplicate(_) => S::CONFLICT,
                ServiceAreaError::NotFound(_) | ServiceAreaError::TenantNotFound(_) => {
                    S::NOT_FOUND
                }
            },
            ApiError::Auth(e) => match e {
                AuthError::Database(db) => database_status(db),
                AuthError::Validation(_) => S::BAD_REQUEST,
                AuthError::EmailTaken => S::CONFLICT,
                AuthError::InvalidCredentials => S::UNAUTHORIZED,
                AuthError::UserNotFound => S::NOT_FOUND,
                AuthError::Hashing(_) | AuthError::Token(_) => S::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(db) => database_status(db),
            ApiError::BadRequest(_) => S::BAD_REQUEST,
            ApiError::Unauthorized(_) => S::UNAUTHORIZED,
            ApiError::Forbidden(_) => S::FORBIDDEN,
            ApiError::NotFound(_) => S::NOT_FOUND,
            ApiError::RateLimited { .. } => S::TOO_MANY_REQUESTS,
            ApiError::DeletionBlocked(_) => S::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::DeletionBlocked(blocked) = self {
            return (
                status,
                Json(ApiResponse::<(), DeletionBlocked>::error_with_data(*blocked)),
            )
                .into_response();
        }

        let retry_after = match &self {
            ApiError::RateLimited { retry_after_secs } => Some(HeaderValue::from(*retry_after_secs)),
            _ => None,
        };

        let message = if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
            if status == StatusCode::SERVICE_UNAVAILABLE {
                "Service temporarily unavailable".to_string()
            } else {
                INTERNAL_ERROR.to_string()
            }
        } else if self.database_error().is_some() {
            tracing::debug!(status = status.as_u16(), error = %self, "Request conflicted with a stored row");
            DUPLICATE_RECORD.to_string()
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
            self.to_string()
        };

        let mut response = (status, Json(ApiResponse::<()>::error(&message))).into_response();
        if let Some(value) = retry_after {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use http_body_util::BodyExt;
    use services::services::validation::ValidationError;
    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ReviewError::Validation(ValidationError::single("bad"))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ServiceAreaError::Duplicate("dallas-tx".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ApplicationReviewError::ConcurrentModification).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TenantDeletionError::NotFound(9)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(sqlx::Error::PoolTimedOut).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ProvisionError::EmailTaken).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_and_rate_limit_statuses() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::from(AuthError::EmailTaken).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(ServiceAreaError::TenantNotFound(3)).status(),
            StatusCode::NOT_FOUND
        );

        let response = ApiError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }

    #[test]
    fn test_only_driver_errors_expose_database_error() {
        assert!(ApiError::from(ReviewError::Database(sqlx::Error::RowNotFound))
            .database_error()
            .is_some());
        assert!(ApiError::from(ReviewError::NotFound(1)).database_error().is_none());
        assert_eq!(
            ApiError::from(ReviewError::Database(sqlx::Error::RowNotFound)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint \"users_email_key\"")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"users_email_key\""
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[tokio::test]
    async fn test_unique_violation_is_a_conflict_without_driver_details() {
        let error = ApiError::from(AuthError::Database(sqlx::Error::Database(Box::new(
            UniqueViolation,
        ))));
        assert_eq!(error.status(), StatusCode::CONFLICT);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], DUPLICATE_RECORD);
        assert!(!body.to_string().contains("users_email_key"));
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = ApiError::from(TenantDeletionError::Verification(
            "services remain".into(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
