use axum::{extract::State, Json};
use common::protocol::{
    FileAddRequest, FileItem, FileSecret, MutationResponse, SearchRequest, SearchResponse,
    SecretIdRequest,
};

use crate::server::{
    access::AuthenticatedOwner,
    error::{ApiError, ApiJson},
    state::AppState,
};

/// `POST /v1/files/add`
pub async fn add(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<FileAddRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.files.add(owner, req).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "file added".into(),
    }))
}

/// `POST /v1/files/get`
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<FileSecret>, ApiError> {
    Ok(Json(state.files.get_secret(owner, &req.id).await?))
}

/// `POST /v1/files/search`
pub async fn search(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse<FileItem>>, ApiError> {
    Ok(Json(state.files.search(owner, req).await?))
}

/// `POST /v1/files/remove`
pub async fn remove(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.files.remove(owner, &req.id).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "file removed".into(),
    }))
}
