//! Tenant service areas, stored as a JSON list on the business row.

use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::{service_area::ServiceArea, tenant::Tenant};
use services::services::service_areas::{ReplaceServiceAreas, ServiceAreaInput};
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    extract::{Json, Path},
    middleware::load_approved_tenant,
    state::AppState,
};

pub async fn list_areas(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
) -> ResponseJson<ApiResponse<Vec<ServiceArea>>> {
    ResponseJson(ApiResponse::success(state.service_areas.list(&tenant)))
}

pub async fn replace_areas(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(payload): Json<ReplaceServiceAreas>,
) -> Result<ResponseJson<ApiResponse<Vec<ServiceArea>>>, ApiError> {
    let areas = state
        .service_areas
        .replace(&tenant, payload.service_areas)
        .await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        areas,
        "Service areas updated successfully",
    )))
}

pub async fn add_area(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(payload): Json<ServiceAreaInput>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Vec<ServiceArea>>>), ApiError> {
    let areas = state.service_areas.add(&tenant, payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            areas,
            "Service area added successfully",
        )),
    ))
}

pub async fn remove_area(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path((_slug, area_id)): Path<(String, String)>,
) -> Result<ResponseJson<ApiResponse<Vec<ServiceArea>>>, ApiError> {
    let areas = state.service_areas.remove(&tenant, &area_id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        areas,
        "Service area removed successfully",
    )))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let areas = Router::new()
        .route(
            "/{slug}",
            get(list_areas).put(replace_areas).post(add_area),
        )
        .route("/{slug}/{area_id}", delete(remove_area))
        .route_layer(from_fn_with_state(state.clone(), load_approved_tenant));

    Router::new().nest("/locations/service-areas", areas)
}
