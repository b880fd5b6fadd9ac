use axum::{extract::State, Json};
use common::protocol::{
    CardAddRequest, CardItem, CardSecret, MutationResponse, SearchRequest, SearchResponse,
    SecretIdRequest,
};

use crate::server::{
    access::AuthenticatedOwner,
    error::{ApiError, ApiJson},
    state::AppState,
};

/// `POST /v1/cards/add`
pub async fn add(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<CardAddRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.cards.add(owner, req).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "card added".into(),
    }))
}

/// `POST /v1/cards/get`
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<CardSecret>, ApiError> {
    Ok(Json(state.cards.get_secret(owner, &req.id).await?))
}

/// `POST /v1/cards/search`
pub async fn search(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse<CardItem>>, ApiError> {
    Ok(Json(state.cards.search(owner, req).await?))
}

/// `POST /v1/cards/remove`
pub async fn remove(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.cards.remove(owner, &req.id).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "card removed".into(),
    }))
}
