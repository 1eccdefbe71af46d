use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::review::{Review, ReviewSummary, VoteTally};
use services::services::reviews::{
    CreateReviewRequest, ListReviewsQuery, UpdateReviewRequest, VoteRequest,
};
use utils::response::{ApiResponse, Paginated};

use crate::{
    error::ApiError,
    extract::{ClientIp, Json, Path, Query},
    middleware::AdminUser,
    state::AppState,
};

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<ResponseJson<ApiResponse<Paginated<Review>>>, ApiError> {
    let page = state.reviews.list(&tenant_slug, &query).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn review_summary(
    State(state): State<AppState>,
    Path(tenant_slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<ReviewSummary>>, ApiError> {
    let summary = state.reviews.summary(&tenant_slug).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub async fn create_review(
    State(state): State<AppState>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Review>>), ApiError> {
    let review = state.reviews.create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            review,
            "Review submitted successfully",
        )),
    ))
}

pub async fn update_review(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<ResponseJson<ApiResponse<Review>>, ApiError> {
    let review = state.reviews.update(id, &payload).await?;
    tracing::info!(review_id = id, admin = admin.email(), "Review edited by admin");
    Ok(ResponseJson(ApiResponse::success_with_message(
        review,
        "Review updated successfully",
    )))
}

/// One vote per client address; voting again replaces the earlier vote.
pub async fn vote_on_review(
    State(state): State<AppState>,
    ClientIp(voter_ip): ClientIp,
    Path(id): Path<i64>,
    Json(payload): Json<VoteRequest>,
) -> Result<ResponseJson<ApiResponse<VoteTally>>, ApiError> {
    let tally = state.reviews.vote(id, payload.vote_type, &voter_ip).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        tally,
        "Vote recorded successfully",
    )))
}

/// Moderation delete; requires an admin token.
pub async fn delete_review(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Review>>, ApiError> {
    let review = state.reviews.delete(id).await?;
    tracing::info!(review_id = id, admin = admin.email(), "Review removed by admin");
    Ok(ResponseJson(ApiResponse::success_with_message(
        review,
        "Review deleted successfully",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/reviews",
        Router::new()
            .route("/", post(create_review))
            .route("/id/{id}", put(update_review).delete(delete_review))
            .route("/id/{id}/vote", post(vote_on_review))
            .route("/{tenant_slug}", get(list_reviews))
            .route("/{tenant_slug}/summary", get(review_summary)),
    )
}
