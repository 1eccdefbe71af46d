use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    catalog::{ServiceCategory, Vehicle},
    service::{Service, ServiceWithTiers},
};
use services::services::service_catalog::{CreateServiceRequest, UpdateServiceRequest};
use utils::response::ApiResponse;

use crate::{error::ApiError, extract::{Json, Path}, state::AppState};

pub async fn list_vehicles(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Vehicle>>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(state.catalog.vehicles().await?)))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<ServiceCategory>>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(state.catalog.categories().await?)))
}

pub async fn list_tenant_services(
    State(state): State<AppState>,
    Path(tenant_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Vec<Service>>>, ApiError> {
    let services = state.catalog.list_for_tenant(tenant_id).await?;
    Ok(ResponseJson(ApiResponse::success(services)))
}

/// Services with tiers for one vehicle/category pair, as the public site renders them.
pub async fn list_by_vehicle_and_category(
    State(state): State<AppState>,
    Path((tenant_id, vehicle, category)): Path<(i64, String, String)>,
) -> Result<ResponseJson<ApiResponse<Vec<ServiceWithTiers>>>, ApiError> {
    let services = state.catalog.list_for(tenant_id, &vehicle, &category).await?;
    Ok(ResponseJson(ApiResponse::success(services)))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(service_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<ServiceWithTiers>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(state.catalog.get(service_id).await?)))
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ServiceWithTiers>>), ApiError> {
    let service = state.catalog.create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            service,
            "Service created successfully",
        )),
    ))
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(service_id): Path<i64>,
    Json(payload): Json<UpdateServiceRequest>,
) -> Result<ResponseJson<ApiResponse<ServiceWithTiers>>, ApiError> {
    let service = state.catalog.update(service_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        service,
        "Service updated successfully",
    )))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(service_id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.catalog.delete(service_id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Service deleted successfully",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/services",
        Router::new()
            .route("/", post(create_service))
            .route("/master/vehicles", get(list_vehicles))
            .route("/master/categories", get(list_categories))
            .route("/tenant/{tenant_id}", get(list_tenant_services))
            .route(
                "/tenant/{tenant_id}/vehicle/{vehicle}/category/{category}",
                get(list_by_vehicle_and_category),
            )
            .route(
                "/{service_id}",
                get(get_service).put(update_service).delete(delete_service),
            ),
    )
}
