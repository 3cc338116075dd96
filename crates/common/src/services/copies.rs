//! Copy operations
//!
//! Reads need no viewer; writes require the owner. View and like counters
//! are adjusted with atomic updates in the repository.

use super::require_user;
use crate::db::models::{Copy, User};
use crate::db::{CopyPatch, DbPool, NewCopy, Repository};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::DEFAULT_COPY_CATEGORY;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Optional filters for listing copies.
///
/// `user_id` wins over `is_public`; `category` is applied afterwards to
/// whichever set was selected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopyFilter {
    pub user_id: Option<Uuid>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

pub struct CopyService {
    repository: Repository,
}

impl CopyService {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            repository: Repository::new(db_pool),
        }
    }

    /// Create a private copy owned by the viewer and return its id
    #[instrument(skip(self, viewer, input), fields(title = %input.title))]
    pub async fn create(&self, viewer: Option<&User>, input: NewCopy) -> Result<Uuid> {
        let user = require_user(viewer)?;
        input.validate()?;

        let category = input
            .category
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COPY_CATEGORY.to_string());
        let tags = input.tags.unwrap_or_default();

        let copy = self
            .repository
            .create_copy(user.id, input.title, input.content, category, tags)
            .await?;

        metrics::record_copy_created(&copy.category);
        info!(copy_id = %copy.id, user_id = %user.id, "Copy created");

        Ok(copy.id)
    }

    pub async fn list(&self, filter: CopyFilter) -> Result<Vec<Copy>> {
        let copies = if let Some(user_id) = filter.user_id {
            self.repository.list_copies_by_user(user_id).await?
        } else if filter.is_public == Some(true) {
            self.repository.list_public_copies().await?
        } else {
            self.repository.list_all_copies().await?
        };

        let copies = match filter.category {
            Some(category) => copies
                .into_iter()
                .filter(|copy| copy.category == category)
                .collect(),
            None => copies,
        };

        debug!(count = copies.len(), "Copies listed");
        Ok(copies)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Copy>> {
        self.repository.find_copy_by_id(id).await
    }

    /// Apply a partial update to one of the viewer's copies
    #[instrument(skip(self, viewer, patch))]
    pub async fn update(&self, viewer: Option<&User>, id: Uuid, patch: CopyPatch) -> Result<Copy> {
        let user = require_user(viewer)?;
        patch.validate()?;

        let copy = self.owned_copy(user, id).await?;
        if patch.is_empty() {
            return Ok(copy);
        }

        let updated = self.repository.update_copy(copy, patch).await?;

        info!(copy_id = %id, user_id = %user.id, "Copy updated");
        Ok(updated)
    }

    /// Delete one of the viewer's copies along with its likes
    #[instrument(skip(self, viewer))]
    pub async fn remove(&self, viewer: Option<&User>, id: Uuid) -> Result<()> {
        let user = require_user(viewer)?;
        let copy = self.owned_copy(user, id).await?;

        self.repository.delete_copy(copy.id).await?;

        info!(copy_id = %id, user_id = %user.id, "Copy deleted");
        Ok(())
    }

    /// Count one view. Returns false when the copy does not exist.
    pub async fn increment_views(&self, id: Uuid) -> Result<bool> {
        let found = self.repository.increment_copy_views(id).await?;
        if found {
            metrics::record_copy_view();
        }
        Ok(found)
    }

    /// Flip the viewer's like and return the new liked state
    #[instrument(skip(self, viewer))]
    pub async fn toggle_like(&self, viewer: Option<&User>, id: Uuid) -> Result<bool> {
        let user = require_user(viewer)?;

        let liked = self
            .repository
            .toggle_like(user.id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Copy", id))?;

        metrics::record_like_toggle(liked);
        info!(copy_id = %id, user_id = %user.id, liked, "Like toggled");

        Ok(liked)
    }

    async fn owned_copy(&self, user: &User, id: Uuid) -> Result<Copy> {
        self.repository
            .find_copy_by_id(id)
            .await?
            .filter(|copy| copy.user_id == user.id)
            .ok_or_else(|| AppError::not_found_or_unauthorized("Copy"))
    }
}
