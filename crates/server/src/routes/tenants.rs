use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::tenant::{IndustryCount, Tenant};
use services::services::{
    tenant_provision::{SignupRequest, SignupResult},
    tenants::{DashboardOverview, ListTenantsQuery, TenantProfile},
};
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    extract::{Json, Path, Query},
    middleware::{load_approved_tenant, rate_limit::limit_sensitive},
    state::AppState,
};

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<SignupResult>>), ApiError> {
    let result = state.provisioning.signup(&payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            result,
            "Tenant created successfully",
        )),
    ))
}

pub async fn list_tenants(
    State(state): State<AppState>,
    Query(query): Query<ListTenantsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Tenant>>>, ApiError> {
    let tenants = state.tenants.list(&query).await?;
    Ok(ResponseJson(ApiResponse::success(tenants)))
}

pub async fn list_industries(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<IndustryCount>>>, ApiError> {
    let industries = state.tenants.industries().await?;
    Ok(ResponseJson(ApiResponse::success(industries)))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<TenantProfile>>, ApiError> {
    let profile = state.tenants.profile(&slug).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub async fn dashboard_overview(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<ResponseJson<ApiResponse<DashboardOverview>>, ApiError> {
    let overview = state.tenants.dashboard_overview(&tenant).await?;
    Ok(ResponseJson(ApiResponse::success(overview)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let dashboard = Router::new()
        .route("/{slug}/dashboard/overview", get(dashboard_overview))
        .route_layer(from_fn_with_state(state.clone(), load_approved_tenant));
    let signup = Router::new()
        .route("/signup", post(signup))
        .route_layer(from_fn_with_state(state.clone(), limit_sensitive));

    Router::new().nest(
        "/tenants",
        Router::new()
            .route("/", get(list_tenants))
            .route("/industries/list", get(list_industries))
            .route("/{slug}", get(get_tenant))
            .merge(signup)
            .merge(dashboard),
    )
}
