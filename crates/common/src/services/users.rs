//! User lookup and anonymous sign-in

use crate::auth::JwtManager;
use crate::db::models::{Role, User};
use crate::db::{DbPool, NewUser, Repository};
use crate::errors::Result;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// A freshly created account together with its bearer token
#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub token: String,
    pub user: User,
}

pub struct UserService {
    repository: Repository,
}

impl UserService {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            repository: Repository::new(db_pool),
        }
    }

    /// Resolve a token subject to a user row. A subject that no longer
    /// exists resolves to absence rather than an error.
    pub async fn resolve(&self, user_id: Option<Uuid>) -> Result<Option<User>> {
        match user_id {
            Some(id) => self.repository.find_user_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Create a guest account and issue a token for it
    #[instrument(skip(self, jwt))]
    pub async fn sign_in_anonymously(&self, jwt: &JwtManager) -> Result<SignedIn> {
        let user = self
            .repository
            .create_user(NewUser {
                is_anonymous: true,
                role: Some(Role::User),
                ..Default::default()
            })
            .await?;

        let token = jwt.generate_token(user.id)?;

        info!(user_id = %user.id, "Anonymous user signed in");

        Ok(SignedIn { token, user })
    }
}
