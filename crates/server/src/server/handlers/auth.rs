use axum::{extract::State, Json};
use common::protocol::{Credentials, LoginResponse, RegisterResponse};

use crate::server::{
    error::{ApiError, ApiJson},
    state::AppState,
};

/// `POST /v1/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Credentials>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let id = state.auth.register(&req.login, &req.password).await?;
    Ok(Json(RegisterResponse {
        user_id: id.to_string(),
    }))
}

/// `POST /v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = state.auth.login(&req.login, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}
