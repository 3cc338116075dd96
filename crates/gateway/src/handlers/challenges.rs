//! Community challenge handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::Created;
use crate::viewer::Viewer;
use crate::AppState;
use copyvault_common::{
    db::{models::Challenge, SeedOutcome},
    errors::Result,
    services::{ChallengeService, SubmissionSummary},
};

/// Before and after photos, as storage ids from the upload flow
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub before_file_id: Uuid,
    pub after_file_id: Uuid,
}

fn service(state: &AppState) -> ChallengeService {
    ChallengeService::new(state.db.clone(), state.storage.clone())
}

/// Every challenge in the catalog, active or not
pub async fn list_challenges(State(state): State<AppState>) -> Result<Json<Vec<Challenge>>> {
    let challenges = service(&state).list().await?;
    Ok(Json(challenges))
}

/// Insert the default challenges if the catalog is empty
pub async fn ensure_seeded(State(state): State<AppState>) -> Result<Json<SeedOutcome>> {
    let outcome = service(&state).ensure_seeded().await?;
    Ok(Json(outcome))
}

pub async fn my_submissions(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Json<Vec<SubmissionSummary>>> {
    let submissions = service(&state)
        .list_my_submissions(viewer.user())
        .await?;

    Ok(Json(submissions))
}

pub async fn submit(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(challenge_id): Path<Uuid>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Created>)> {
    let id = service(&state)
        .submit(
            viewer.user(),
            challenge_id,
            request.before_file_id,
            request.after_file_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(Created { id })))
}
