use axum::{extract::State, Json};
use common::protocol::SyncResponse;

use crate::server::{access::AuthenticatedOwner, error::ApiError, state::AppState};

/// `POST /v1/sync/get`: time of the caller's most recent add or remove.
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedOwner(owner): AuthenticatedOwner,
) -> Result<Json<SyncResponse>, ApiError> {
    let timestamp = state.sync.get(owner).await?;
    Ok(Json(SyncResponse { timestamp }))
}
