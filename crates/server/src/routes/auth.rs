use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::User;
use services::services::auth::{AuthResponse, LoginRequest, RegisterRequest};
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    extract::Json,
    middleware::{AuthUser, rate_limit::limit_sensitive},
    state::AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AuthResponse>>), ApiError> {
    let response = state.auth.register(&payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            response,
            "User registered successfully",
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let response = state.auth.login(&payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        response,
        "Login successful",
    )))
}

pub async fn me(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = state.auth.current_user(&claims).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Tokens are stateless, so logging out is the client discarding its token.
pub async fn logout() -> ResponseJson<ApiResponse<()>> {
    ResponseJson(ApiResponse::success_with_message((), "Logout successful"))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(from_fn_with_state(state.clone(), limit_sensitive));

    Router::new().nest(
        "/auth",
        Router::new()
            .route("/me", get(me))
            .route("/logout", post(logout))
            .merge(credentials),
    )
}
