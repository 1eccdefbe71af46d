use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
    routing::get,
};
use services::services::seo::robots_txt;

use crate::state::AppState;

/// Host and scheme as seen by the client, honouring the reverse proxy headers.
fn request_origin(headers: &HeaderMap) -> (String, String) {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let host = header_str("x-forwarded-host")
        .or_else(|| header_str(header::HOST.as_str()))
        .unwrap_or_else(|| "localhost".to_string());
    let proto = header_str("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    (host.to_lowercase(), proto)
}

pub async fn robots(headers: HeaderMap) -> impl IntoResponse {
    let (host, proto) = request_origin(&headers);
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400")),
        ],
        robots_txt(&host, &proto),
    )
}

pub async fn sitemap(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let (host, proto) = request_origin(&headers);
    let sitemap = state.seo.sitemap(&host, &proto).await;
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/xml; charset=utf-8")),
            (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600")),
            (
                header::HeaderName::from_static("x-sitemap-cache"),
                HeaderValue::from_static(sitemap.cache.as_str()),
            ),
        ],
        sitemap.xml.to_string(),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/robots.txt", get(robots))
        .route("/sitemap.xml", get(sitemap))
}
