use axum::{
    Extension, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::{
    tenant::Tenant,
    website_content::{UpdateWebsiteContent, WebsiteContentView},
};
use services::services::website_content::{MainSiteContent, main_site};
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    extract::{Json, Path},
    middleware::load_approved_tenant,
    state::AppState,
};

pub async fn main_content() -> ResponseJson<ApiResponse<MainSiteContent>> {
    ResponseJson(ApiResponse::success(main_site()))
}

pub async fn get_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<WebsiteContentView>>, ApiError> {
    let content = state.content.get(&slug).await?;
    Ok(ResponseJson(ApiResponse::success(content)))
}

pub async fn update_content(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(payload): Json<UpdateWebsiteContent>,
) -> Result<ResponseJson<ApiResponse<WebsiteContentView>>, ApiError> {
    let content = state.content.upsert(&tenant, &payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        content,
        "Website content updated successfully",
    )))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let tenant_scoped = from_fn_with_state(state.clone(), load_approved_tenant);
    Router::new().nest(
        "/website-content",
        Router::new().route("/main", get(main_content)).route(
            "/{slug}",
            get(get_content).merge(put(update_content).route_layer(tenant_scoped)),
        ),
    )
}
