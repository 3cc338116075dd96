//! Category operations

use super::require_user;
use crate::db::models::{Category, User};
use crate::db::{DbPool, NewCategory, Repository};
use crate::errors::{AppError, Result};
use crate::DEFAULT_CATEGORY_COLOR;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

pub struct CategoryService {
    repository: Repository,
}

impl CategoryService {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            repository: Repository::new(db_pool),
        }
    }

    /// Create a category owned by the viewer and return its id
    #[instrument(skip(self, viewer, input), fields(name = %input.name))]
    pub async fn create(&self, viewer: Option<&User>, input: NewCategory) -> Result<Uuid> {
        let user = require_user(viewer)?;
        input.validate()?;

        let color = input
            .color
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());

        let category = self
            .repository
            .create_category(user.id, input.name, input.description, color)
            .await?;

        info!(category_id = %category.id, user_id = %user.id, "Category created");
        Ok(category.id)
    }

    /// The viewer's categories, or nothing when signed out
    pub async fn list(&self, viewer: Option<&User>) -> Result<Vec<Category>> {
        match viewer {
            Some(user) => self.repository.list_categories_by_user(user.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Delete one of the viewer's categories
    #[instrument(skip(self, viewer))]
    pub async fn remove(&self, viewer: Option<&User>, id: Uuid) -> Result<()> {
        let user = require_user(viewer)?;

        let owned = self
            .repository
            .find_category_by_id(id)
            .await?
            .filter(|category| category.user_id == user.id)
            .ok_or_else(|| AppError::not_found_or_unauthorized("Category"))?;

        self.repository.delete_category(owned.id).await?;

        info!(category_id = %id, user_id = %user.id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_user, memory_pool};

    fn named(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_default_color() {
        let pool = memory_pool().await;
        let owner = insert_user(&pool, "owner@example.com").await;
        let service = CategoryService::new(pool);

        service.create(Some(&owner), named("Headlines")).await.unwrap();

        let listed = service.list(Some(&owner)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].color.as_deref(), Some(DEFAULT_CATEGORY_COLOR));
        assert_eq!(listed[0].user_id, owner.id);
    }

    #[tokio::test]
    async fn test_signed_out_viewer() {
        let service = CategoryService::new(memory_pool().await);

        assert!(service.list(None).await.unwrap().is_empty());
        assert!(matches!(
            service.create(None, named("Headlines")).await,
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let pool = memory_pool().await;
        let owner = insert_user(&pool, "owner@example.com").await;
        let service = CategoryService::new(pool);

        let err = service.create(Some(&owner), named("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_only_owner_can_remove() {
        let pool = memory_pool().await;
        let owner = insert_user(&pool, "owner@example.com").await;
        let intruder = insert_user(&pool, "intruder@example.com").await;
        let service = CategoryService::new(pool);

        let id = service.create(Some(&owner), named("Headlines")).await.unwrap();

        let foreign = service.remove(Some(&intruder), id).await.unwrap_err();
        let missing = service.remove(Some(&owner), Uuid::now_v7()).await.unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
        assert_eq!(service.list(Some(&owner)).await.unwrap().len(), 1);

        service.remove(Some(&owner), id).await.unwrap();
        assert!(service.list(Some(&owner)).await.unwrap().is_empty());
    }
}
