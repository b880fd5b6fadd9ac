use axum::{extract::State, Json};
use common::protocol::{
    AccountAddRequest, AccountItem, AccountSecret, MutationResponse, SearchRequest, SearchResponse,
    SecretIdRequest,
};

use crate::server::{
    access::AuthenticatedOwner,
    error::{ApiError, ApiJson},
    state::AppState,
};

/// `POST /v1/accounts/add`
pub async fn add(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<AccountAddRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.accounts.add(owner, req).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "account added".into(),
    }))
}

/// `POST /v1/accounts/get`
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<AccountSecret>, ApiError> {
    Ok(Json(state.accounts.get_secret(owner, &req.id).await?))
}

/// `POST /v1/accounts/search`
pub async fn search(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse<AccountItem>>, ApiError> {
    Ok(Json(state.accounts.search(owner, req).await?))
}

/// `POST /v1/accounts/remove`
pub async fn remove(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.accounts.remove(owner, &req.id).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "account removed".into(),
    }))
}
