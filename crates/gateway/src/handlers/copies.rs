//! Copy handlers
//!
//! Reads are open to everyone. Writes go through the viewer so the
//! service can reject guests without a token and non-owners.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::Created;
use crate::viewer::Viewer;
use crate::AppState;
use copyvault_common::{
    db::{models::Copy, CopyPatch, NewCopy},
    errors::{AppError, Result},
    services::{CopyFilter, CopyService},
};

#[derive(Serialize)]
pub struct ViewsResponse {
    /// False when the copy does not exist
    pub counted: bool,
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
}

pub async fn create_copy(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(request): Json<NewCopy>,
) -> Result<(StatusCode, Json<Created>)> {
    let id = CopyService::new(state.db.clone())
        .create(viewer.user(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// List copies by owner, by visibility, or all of them
pub async fn list_copies(
    State(state): State<AppState>,
    Query(filter): Query<CopyFilter>,
) -> Result<Json<Vec<Copy>>> {
    let copies = CopyService::new(state.db.clone()).list(filter).await?;
    Ok(Json(copies))
}

pub async fn get_copy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Copy>> {
    CopyService::new(state.db.clone())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Copy", id))
}

pub async fn update_copy(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Json(patch): Json<CopyPatch>,
) -> Result<Json<Copy>> {
    let copy = CopyService::new(state.db.clone())
        .update(viewer.user(), id, patch)
        .await?;

    Ok(Json(copy))
}

pub async fn remove_copy(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    CopyService::new(state.db.clone())
        .remove(viewer.user(), id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Count a view. Anyone may call this, signed in or not.
pub async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ViewsResponse>> {
    let counted = CopyService::new(state.db.clone())
        .increment_views(id)
        .await?;

    Ok(Json(ViewsResponse { counted }))
}

pub async fn toggle_like(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>> {
    let liked = CopyService::new(state.db.clone())
        .toggle_like(viewer.user(), id)
        .await?;

    Ok(Json(LikeResponse { liked }))
}
