//! EcoVerse handlers
//!
//! Game state belongs to a signed-in user. Catalog reads (lessons,
//! leaderboard, rewards) are open to everyone.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::viewer::{CurrentUser, Viewer};
use crate::AppState;
use copyvault_common::{
    ecoverse::{
        catalog::{self, LeaderboardEntry, Lesson, Reward},
        ActionOutcome, Contribution, Dashboard, LessonDetail, QuizResult, QuizStatus, QuizView,
        Redemption,
    },
    errors::Result,
};

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// Selected option per question, `null` for unanswered
    pub answers: Vec<Option<usize>>,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub lesson_id: String,
    pub progress: u8,
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Dashboard>> {
    Ok(Json(state.eco.dashboard(&user, Utc::now()).await?))
}

pub async fn complete_action(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(action_id): Path<String>,
) -> Result<Json<ActionOutcome>> {
    Ok(Json(state.eco.complete_action(&user, &action_id).await?))
}

pub async fn contribute(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Contribution>> {
    Ok(Json(state.eco.contribute_to_world_boss(&user).await?))
}

pub async fn list_quizzes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<QuizStatus>>> {
    Ok(Json(state.eco.quizzes(&user, Utc::now()).await?))
}

/// The quiz questions without answers; 409 while locked
pub async fn open_quiz(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quiz_id): Path<String>,
) -> Result<Json<QuizView>> {
    Ok(Json(state.eco.open_quiz(&user, &quiz_id, Utc::now()).await?))
}

pub async fn submit_quiz(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quiz_id): Path<String>,
    Json(request): Json<SubmitQuizRequest>,
) -> Result<Json<QuizResult>> {
    let result = state
        .eco
        .submit_quiz(&user, &quiz_id, &request.answers, Utc::now())
        .await?;

    Ok(Json(result))
}

pub async fn list_lessons() -> Json<&'static [Lesson]> {
    Json(&catalog::LESSONS)
}

/// A lesson, with reading progress when the viewer is signed in
pub async fn get_lesson(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(lesson_id): Path<String>,
) -> Result<Json<LessonDetail>> {
    Ok(Json(state.eco.lesson(viewer.user(), &lesson_id).await?))
}

pub async fn complete_section(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((lesson_id, index)): Path<(String, usize)>,
) -> Result<Json<ProgressResponse>> {
    let progress = state
        .eco
        .complete_lesson_section(&user, &lesson_id, index)
        .await?;

    Ok(Json(ProgressResponse { lesson_id, progress }))
}

pub async fn finish_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
) -> Result<Json<ProgressResponse>> {
    let progress = state.eco.finish_lesson(&user, &lesson_id).await?;
    Ok(Json(ProgressResponse { lesson_id, progress }))
}

pub async fn leaderboard() -> Json<&'static [LeaderboardEntry]> {
    Json(&catalog::LEADERBOARD)
}

pub async fn list_rewards() -> Json<&'static [Reward]> {
    Json(&catalog::REWARDS)
}

pub async fn redeem_reward(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(reward_id): Path<String>,
) -> Result<Json<Redemption>> {
    Ok(Json(state.eco.redeem_reward(&user, &reward_id).await?))
}
