//! File storage handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::viewer::CurrentUser;
use crate::AppState;
use copyvault_common::{errors::Result, storage::UploadTicket};

#[derive(Serialize)]
pub struct UrlResponse {
    pub url: Option<String>,
}

/// Reserve a storage id for a signed-in user
pub async fn generate_upload_url(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UploadTicket>> {
    let ticket = state.storage.generate_upload_url().await?;
    tracing::debug!(user_id = %user.id, storage_id = %ticket.storage_id, "Upload URL issued");
    Ok(Json(ticket))
}

/// Resolve a storage id; unknown ids give a null url
pub async fn get_url(
    State(state): State<AppState>,
    Path(storage_id): Path<Uuid>,
) -> Result<Json<UrlResponse>> {
    let url = state.storage.get_url(storage_id).await?;
    Ok(Json(UrlResponse { url }))
}
