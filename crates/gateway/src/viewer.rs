//! Request-scoped viewer resolution
//!
//! `Viewer` turns the bearer token into "current user or absence" by
//! looking the token subject up in the users table. `CurrentUser` is the
//! same lookup for routes that only make sense when signed in.

use axum::{extract::FromRequestParts, http::request::Parts};
use copyvault_common::{
    auth::AuthContext,
    db::models::User,
    errors::{AppError, Result},
    services::UserService,
};

use crate::AppState;

/// The signed-in user, if any
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        let user = UserService::new(state.db.clone()).resolve(auth.user_id).await?;

        if auth.is_authenticated() && user.is_none() {
            tracing::debug!(
                user_id = ?auth.user_id,
                request_id = %auth.request_id,
                "Token subject no longer exists"
            );
        }

        Ok(Viewer(user))
    }
}

/// A signed-in user; rejects the request with 401 otherwise
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Viewer(user) = Viewer::from_request_parts(parts, state).await?;
        user.map(CurrentUser).ok_or_else(AppError::unauthenticated)
    }
}
