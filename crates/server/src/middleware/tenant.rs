use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use db::models::tenant::Tenant;

use crate::{error::ApiError, extract::Path, state::AppState};

/// Resolve the `{slug}` path segment to an approved tenant and stash it in
/// the request extensions for the handler.
pub async fn load_approved_tenant(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let slug = params
        .get("slug")
        .ok_or_else(|| ApiError::BadRequest("Missing tenant slug".to_string()))?;

    let tenant = Tenant::find_approved_by_slug(&state.db.pool, slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tenant not found or not approved".to_string()))?;

    tracing::Span::current().record("tenant_id", tenant.id);
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}
