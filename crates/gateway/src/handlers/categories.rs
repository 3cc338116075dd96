//! Category handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::Created;
use crate::viewer::Viewer;
use crate::AppState;
use copyvault_common::{
    db::{models::Category, NewCategory},
    errors::Result,
    services::CategoryService,
};

/// Create a category owned by the viewer
pub async fn create_category(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(request): Json<NewCategory>,
) -> Result<(StatusCode, Json<Created>)> {
    let id = CategoryService::new(state.db.clone())
        .create(viewer.user(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// The viewer's categories; empty when signed out
pub async fn list_categories(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<Vec<Category>>> {
    let categories = CategoryService::new(state.db.clone())
        .list(viewer.user())
        .await?;

    Ok(Json(categories))
}

pub async fn remove_category(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    CategoryService::new(state.db.clone())
        .remove(viewer.user(), id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
