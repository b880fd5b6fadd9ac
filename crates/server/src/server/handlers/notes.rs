use axum::{extract::State, Json};
use common::protocol::{
    MutationResponse, NoteAddRequest, NoteItem, NoteSecret, SearchRequest, SearchResponse,
    SecretIdRequest,
};

use crate::server::{
    access::AuthenticatedOwner,
    error::{ApiError, ApiJson},
    state::AppState,
};

/// `POST /v1/notes/add`
pub async fn add(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<NoteAddRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.notes.add(owner, req).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "note added".into(),
    }))
}

/// `POST /v1/notes/get`
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<NoteSecret>, ApiError> {
    Ok(Json(state.notes.get_secret(owner, &req.id).await?))
}

/// `POST /v1/notes/search`
pub async fn search(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse<NoteItem>>, ApiError> {
    Ok(Json(state.notes.search(owner, req).await?))
}

/// `POST /v1/notes/remove`
pub async fn remove(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
    ApiJson(req): ApiJson<SecretIdRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = state.notes.remove(owner, &req.id).await?;
    Ok(Json(MutationResponse {
        id: id.to_string(),
        msg: "note removed".into(),
    }))
}
