//! Identity handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::viewer::Viewer;
use crate::AppState;
use copyvault_common::{
    db::models::User,
    errors::Result,
    services::{SignedIn, UserService},
};

/// Create a guest account and return a bearer token for it
pub async fn sign_in_anonymously(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SignedIn>)> {
    let signed_in = UserService::new(state.db.clone())
        .sign_in_anonymously(&state.jwt)
        .await?;

    Ok((StatusCode::CREATED, Json(signed_in)))
}

/// The current user, or `null` when signed out
pub async fn me(Viewer(user): Viewer) -> Json<Option<User>> {
    Json(user)
}
