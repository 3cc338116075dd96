//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.
//!
//! Authorization is not checked here; callers resolve the viewer and
//! ownership before reaching for a write.

use crate::errors::{AppError, Result};
use crate::db::DbPool;
use crate::db::models::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Fields accepted when a user account is first created
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub is_anonymous: bool,
    pub role: Option<Role>,
}

/// Category fields as supplied by the caller
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub description: Option<String>,

    pub color: Option<String>,
}

/// Copy fields as supplied by the caller
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCopy {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[validate(length(min = 1))]
    pub content: String,

    pub category: Option<String>,

    pub tags: Option<Vec<String>>,
}

/// Partial update of a copy; only supplied fields are written
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CopyPatch {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub content: Option<String>,

    #[validate(length(min = 1))]
    pub category: Option<String>,

    pub tags: Option<Vec<String>>,

    pub is_public: Option<bool>,
}

impl CopyPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.is_public.is_none()
    }
}

/// A challenge row to insert when the catalog is empty
#[derive(Debug, Clone, Copy)]
pub struct ChallengeSeed {
    pub title: &'static str,
    pub description: &'static str,
    pub hp: i32,
    pub pts: i32,
    pub tag: &'static str,
}

/// Result of an idempotent seeding attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedOutcome {
    pub seeded: bool,
    pub count: u64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user account
    pub async fn create_user(&self, input: NewUser) -> Result<User> {
        let user = UserActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            email: Set(input.email),
            image: Set(input.image),
            is_anonymous: Set(input.is_anonymous),
            role: Set(input.role.map(|r| r.as_str().to_string())),
            created_at: Set(chrono::Utc::now().into()),
        };

        user.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Category Operations
    // ========================================================================

    /// Create a category owned by `user_id`
    pub async fn create_category(
        &self,
        user_id: Uuid,
        name: String,
        description: Option<String>,
        color: String,
    ) -> Result<Category> {
        let category = CategoryActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            name: Set(name),
            description: Set(description),
            color: Set(Some(color)),
            created_at: Set(chrono::Utc::now().into()),
        };

        category.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find category by ID
    pub async fn find_category_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        CategoryEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List categories owned by a user (categories_by_user index)
    pub async fn list_categories_by_user(&self, user_id: Uuid) -> Result<Vec<Category>> {
        CategoryEntity::find()
            .filter(CategoryColumn::UserId.eq(user_id))
            .order_by_asc(CategoryColumn::CreatedAt)
            .order_by_asc(CategoryColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete category by ID
    pub async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let result = CategoryEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Copy Operations
    // ========================================================================

    /// Create a private copy with zeroed counters
    pub async fn create_copy(
        &self,
        user_id: Uuid,
        title: String,
        content: String,
        category: String,
        tags: Vec<String>,
    ) -> Result<Copy> {
        let now = chrono::Utc::now();

        let copy = CopyActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            title: Set(title),
            content: Set(content),
            category: Set(category),
            tags: Set(tags.into()),
            is_public: Set(false),
            views: Set(0),
            likes: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        copy.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find copy by ID
    pub async fn find_copy_by_id(&self, id: Uuid) -> Result<Option<Copy>> {
        CopyEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List copies owned by a user (copies_by_user index)
    pub async fn list_copies_by_user(&self, user_id: Uuid) -> Result<Vec<Copy>> {
        CopyEntity::find()
            .filter(CopyColumn::UserId.eq(user_id))
            .order_by_asc(CopyColumn::CreatedAt)
            .order_by_asc(CopyColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List public copies (copies_by_public index)
    pub async fn list_public_copies(&self) -> Result<Vec<Copy>> {
        CopyEntity::find()
            .filter(CopyColumn::IsPublic.eq(true))
            .order_by_asc(CopyColumn::CreatedAt)
            .order_by_asc(CopyColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List every copy
    pub async fn list_all_copies(&self) -> Result<Vec<Copy>> {
        CopyEntity::find()
            .order_by_asc(CopyColumn::CreatedAt)
            .order_by_asc(CopyColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Apply a partial patch to an existing copy
    pub async fn update_copy(&self, copy: Copy, patch: CopyPatch) -> Result<Copy> {
        let mut active: CopyActiveModel = copy.into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(content) = patch.content {
            active.content = Set(content);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(tags) = patch.tags {
            active.tags = Set(tags.into());
        }
        if let Some(is_public) = patch.is_public {
            active.is_public = Set(is_public);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete a copy together with the likes that reference it
    pub async fn delete_copy(&self, id: Uuid) -> Result<bool> {
        let txn = self.write_conn().begin().await?;

        LikeEntity::delete_many()
            .filter(LikeColumn::CopyId.eq(id))
            .exec(&txn)
            .await?;

        let result = CopyEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    /// Atomically add one view; false when the copy does not exist
    pub async fn increment_copy_views(&self, id: Uuid) -> Result<bool> {
        let result = CopyEntity::update_many()
            .col_expr(CopyColumn::Views, Expr::col(CopyColumn::Views).add(1))
            .filter(CopyColumn::Id.eq(id))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Flip the viewer's like on a copy and adjust the counter.
    ///
    /// Returns the new liked state, or `None` when the copy does not exist.
    /// Lookup, row change and counter change commit together. On Postgres
    /// the copy row is locked first so toggles on one copy run one at a time.
    pub async fn toggle_like(&self, user_id: Uuid, copy_id: Uuid) -> Result<Option<bool>> {
        let txn = self.write_conn().begin().await?;

        let mut copy_query = CopyEntity::find_by_id(copy_id);
        if txn.get_database_backend() == DbBackend::Postgres {
            copy_query = copy_query.lock_exclusive();
        }
        if copy_query.one(&txn).await?.is_none() {
            return Ok(None);
        }

        let existing = LikeEntity::find()
            .filter(LikeColumn::UserId.eq(user_id))
            .filter(LikeColumn::CopyId.eq(copy_id))
            .one(&txn)
            .await?;

        let liked = match existing {
            Some(like) => {
                let deleted = LikeEntity::delete_by_id(like.id).exec(&txn).await?;

                // A concurrent unlike already removed the row and its count
                if deleted.rows_affected == 1 {
                    // Floored at zero
                    CopyEntity::update_many()
                        .col_expr(CopyColumn::Likes, Expr::col(CopyColumn::Likes).sub(1))
                        .filter(CopyColumn::Id.eq(copy_id))
                        .filter(CopyColumn::Likes.gt(0))
                        .exec(&txn)
                        .await?;
                }
                false
            }
            None => {
                LikeActiveModel {
                    id: Set(Uuid::now_v7()),
                    user_id: Set(user_id),
                    copy_id: Set(copy_id),
                    created_at: Set(chrono::Utc::now().into()),
                }
                .insert(&txn)
                .await
                .map_err(|e| conflict_on_unique(e, "Like already recorded"))?;

                CopyEntity::update_many()
                    .col_expr(CopyColumn::Likes, Expr::col(CopyColumn::Likes).add(1))
                    .filter(CopyColumn::Id.eq(copy_id))
                    .exec(&txn)
                    .await?;
                true
            }
        };

        txn.commit().await?;
        Ok(Some(liked))
    }

    /// Number of like rows referencing a copy
    pub async fn count_likes(&self, copy_id: Uuid) -> Result<u64> {
        LikeEntity::find()
            .filter(LikeColumn::CopyId.eq(copy_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Challenge Operations
    // ========================================================================

    /// List every challenge
    pub async fn list_challenges(&self) -> Result<Vec<Challenge>> {
        ChallengeEntity::find()
            .order_by_asc(ChallengeColumn::CreatedAt)
            .order_by_asc(ChallengeColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find challenge by ID
    pub async fn find_challenge_by_id(&self, id: Uuid) -> Result<Option<Challenge>> {
        ChallengeEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert `defaults` only if the catalog has no rows at all
    pub async fn seed_challenges(&self, defaults: &[ChallengeSeed]) -> Result<SeedOutcome> {
        let txn = self.write_conn().begin().await?;

        let existing = ChallengeEntity::find().count(&txn).await?;
        if existing > 0 {
            return Ok(SeedOutcome { seeded: false, count: existing });
        }

        for seed in defaults {
            ChallengeActiveModel {
                id: Set(Uuid::now_v7()),
                title: Set(seed.title.to_string()),
                description: Set(Some(seed.description.to_string())),
                hp: Set(seed.hp),
                pts: Set(seed.pts),
                tag: Set(seed.tag.to_string()),
                active: Set(true),
                created_at: Set(chrono::Utc::now().into()),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(SeedOutcome { seeded: true, count: defaults.len() as u64 })
    }

    /// Record a pending before/after submission
    pub async fn create_submission(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        before_file_id: Uuid,
        after_file_id: Uuid,
    ) -> Result<Submission> {
        let submission = SubmissionActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            challenge_id: Set(challenge_id),
            before_file_id: Set(before_file_id),
            after_file_id: Set(after_file_id),
            status: Set(String::from(SubmissionStatus::Pending)),
            ai_score: Set(None),
            notes: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };

        submission.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// List a user's submissions (ev_submissions_by_user_and_challenge prefix)
    pub async fn list_submissions_by_user(&self, user_id: Uuid) -> Result<Vec<Submission>> {
        SubmissionEntity::find()
            .filter(SubmissionColumn::UserId.eq(user_id))
            .order_by_asc(SubmissionColumn::CreatedAt)
            .order_by_asc(SubmissionColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}

fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict {
            message: message.to_string(),
        },
        _ => AppError::Database(err),
    }
}
