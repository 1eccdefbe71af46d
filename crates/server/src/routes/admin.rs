//! Admin-only endpoints: application review, tenant removal and user listing.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::{tenant::Tenant, user::User};
use serde::Serialize;
use services::services::{
    application_review::{ApproveApplication, RejectApplication},
    auth::ListUsersQuery,
    tenant_deletion::{DeleteOptions, DeletedTenant, DeletionOutcome, DryRunReport},
};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    error::{ApiError, DeletionBlocked},
    extract::{Json, Path, Query},
    middleware::AdminUser,
    state::AppState,
};

#[derive(Debug, Serialize, TS)]
#[serde(untagged)]
pub enum DeletionResponse {
    DryRun(DryRunReport),
    Deleted(DeletedTenant),
}

pub async fn pending_applications(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Tenant>>>, ApiError> {
    let applications = state.applications.pending_applications().await?;
    Ok(ResponseJson(ApiResponse::success(applications)))
}

pub async fn approve_application(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ApproveApplication>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, ApiError> {
    let tenant = state.applications.approve(id, &payload, admin.email()).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        tenant,
        "Application approved successfully",
    )))
}

pub async fn reject_application(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RejectApplication>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, ApiError> {
    let tenant = state.applications.reject(id, &payload, admin.email()).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        tenant,
        "Application rejected successfully",
    )))
}

pub async fn delete_tenant(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(options): Query<DeleteOptions>,
) -> Result<ResponseJson<ApiResponse<DeletionResponse>>, ApiError> {
    match state.deletion.delete(id, admin.email(), &options).await? {
        DeletionOutcome::DryRun(report) => Ok(ResponseJson(ApiResponse::success_with_message(
            DeletionResponse::DryRun(report),
            "Dry run completed - no data was deleted",
        ))),
        DeletionOutcome::Blocked { issues, tenant } => {
            Err(ApiError::DeletionBlocked(Box::new(DeletionBlocked {
                message: "Tenant deletion blocked by validation issues".to_string(),
                issues,
                tenant,
                hint: "Use force=true to override validation".to_string(),
            })))
        }
        DeletionOutcome::Deleted(deleted) => {
            let message = format!(
                "Tenant \"{}\" deleted successfully",
                deleted.tenant.business_name
            );
            Ok(ResponseJson(ApiResponse::success_with_message(
                DeletionResponse::Deleted(deleted),
                message,
            )))
        }
    }
}

pub async fn soft_delete_tenant(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, ApiError> {
    let tenant = state.deletion.soft_delete(id, admin.email()).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        tenant,
        "Tenant marked as deleted",
    )))
}

pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.auth.users(query.status).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/admin",
        Router::new()
            .route("/pending-applications", get(pending_applications))
            .route("/approve-application/{id}", post(approve_application))
            .route("/reject-application/{id}", post(reject_application))
            .route("/tenants/{id}", delete(delete_tenant))
            .route("/tenants/{id}/soft-delete", post(soft_delete_tenant))
            .route("/users", get(list_users)),
    )
}
