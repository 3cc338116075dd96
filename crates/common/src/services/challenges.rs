//! EcoVerse challenge catalog and photo-proof submissions

use super::require_user;
use crate::db::models::{Challenge, Submission, SubmissionStatus, User};
use crate::db::{ChallengeSeed, DbPool, Repository, SeedOutcome};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::storage::FileStorage;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Catalog inserted by [`ChallengeService::ensure_seeded`] into an empty table
pub const DEFAULT_CHALLENGES: [ChallengeSeed; 3] = [
    ChallengeSeed {
        title: "Remove litter in your area",
        description: "Pick up visible trash, bag it, and dispose responsibly.",
        hp: 5,
        pts: 15,
        tag: "Waste",
    },
    ChallengeSeed {
        title: "Clean a local spot (before/after)",
        description: "Tidy a messy corner, document before/after.",
        hp: 8,
        pts: 20,
        tag: "Community",
    },
    ChallengeSeed {
        title: "Plant a seedling and water it",
        description: "Plant and water a seedling; protect soil around it.",
        hp: 10,
        pts: 25,
        tag: "Nature",
    },
];

/// Submission as shown back to its author
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub status: SubmissionStatus,
    pub ai_score: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<Submission> for SubmissionSummary {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            challenge_id: submission.challenge_id,
            status: submission.submission_status(),
            ai_score: submission.ai_score,
            notes: submission.notes,
            created_at: submission.created_at,
        }
    }
}

pub struct ChallengeService {
    repository: Repository,
    storage: Arc<dyn FileStorage>,
}

impl ChallengeService {
    pub fn new(db_pool: DbPool, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            repository: Repository::new(db_pool),
            storage,
        }
    }

    pub async fn list(&self) -> Result<Vec<Challenge>> {
        self.repository.list_challenges().await
    }

    /// Insert the default catalog unless any challenge already exists
    pub async fn ensure_seeded(&self) -> Result<SeedOutcome> {
        let outcome = self.repository.seed_challenges(&DEFAULT_CHALLENGES).await?;

        if outcome.seeded {
            info!(count = outcome.count, "Challenge catalog seeded");
        }
        Ok(outcome)
    }

    /// Record a pending before/after submission. Repeat submissions are allowed.
    #[instrument(skip(self, viewer))]
    pub async fn submit(
        &self,
        viewer: Option<&User>,
        challenge_id: Uuid,
        before_file_id: Uuid,
        after_file_id: Uuid,
    ) -> Result<Uuid> {
        let user = require_user(viewer)?;

        self.repository
            .find_challenge_by_id(challenge_id)
            .await?
            .ok_or_else(|| AppError::not_found("Challenge", challenge_id))?;

        self.ensure_uploaded("before_file_id", before_file_id).await?;
        self.ensure_uploaded("after_file_id", after_file_id).await?;

        let submission = self
            .repository
            .create_submission(user.id, challenge_id, before_file_id, after_file_id)
            .await?;

        metrics::record_challenge_submission();
        info!(submission_id = %submission.id, user_id = %user.id, "Challenge submission recorded");

        Ok(submission.id)
    }

    /// The viewer's submissions, or nothing when signed out
    pub async fn list_my_submissions(
        &self,
        viewer: Option<&User>,
    ) -> Result<Vec<SubmissionSummary>> {
        let Some(user) = viewer else {
            return Ok(Vec::new());
        };

        let submissions = self.repository.list_submissions_by_user(user.id).await?;
        Ok(submissions.into_iter().map(SubmissionSummary::from).collect())
    }

    /// File references must name an id issued by storage
    async fn ensure_uploaded(&self, field: &str, storage_id: Uuid) -> Result<()> {
        if self.storage.get_url(storage_id).await?.is_some() {
            return Ok(());
        }
        Err(AppError::Validation {
            message: format!("Unknown storage id {}", storage_id),
            field: Some(field.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::StorageConfig;
    use crate::db::testing::{insert_user, memory_pool};
    use crate::storage::BucketStorage;

    fn storage() -> Arc<dyn FileStorage> {
        Arc::new(BucketStorage::new(
            &StorageConfig::default(),
            Arc::new(MemoryStore::new()),
        ))
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let service = ChallengeService::new(memory_pool().await, storage());

        let first = service.ensure_seeded().await.unwrap();
        assert_eq!(first, SeedOutcome { seeded: true, count: 3 });

        let second = service.ensure_seeded().await.unwrap();
        assert_eq!(second, SeedOutcome { seeded: false, count: 3 });

        let challenges = service.list().await.unwrap();
        assert_eq!(challenges.len(), 3);
        assert!(challenges.iter().all(|c| c.active));

        let mut titles: Vec<_> = challenges.iter().map(|c| c.title.as_str()).collect();
        titles.sort_unstable();
        let mut expected: Vec<_> = DEFAULT_CHALLENGES.iter().map(|c| c.title).collect();
        expected.sort_unstable();
        assert_eq!(titles, expected);
    }

    #[tokio::test]
    async fn test_submit_and_list_mine() {
        let pool = memory_pool().await;
        let user = insert_user(&pool, "planter@example.com").await;
        let other = insert_user(&pool, "other@example.com").await;
        let storage = storage();
        let service = ChallengeService::new(pool, storage.clone());
        service.ensure_seeded().await.unwrap();
        let challenge = service.list().await.unwrap().remove(0);

        let before = storage.generate_upload_url().await.unwrap().storage_id;
        let after = storage.generate_upload_url().await.unwrap().storage_id;
        service.submit(Some(&user), challenge.id, before, after).await.unwrap();
        service.submit(Some(&user), challenge.id, before, after).await.unwrap();

        let mine = service.list_my_submissions(Some(&user)).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|s| s.status == SubmissionStatus::Pending));
        assert!(mine.iter().all(|s| s.ai_score.is_none()));

        assert!(service.list_my_submissions(Some(&other)).await.unwrap().is_empty());
        assert!(service.list_my_submissions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_errors() {
        let pool = memory_pool().await;
        let user = insert_user(&pool, "planter@example.com").await;
        let storage = storage();
        let service = ChallengeService::new(pool, storage.clone());
        service.ensure_seeded().await.unwrap();
        let challenge = service.list().await.unwrap().remove(0);

        assert!(matches!(
            service.submit(Some(&user), Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7()).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.submit(None, Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7()).await,
            Err(AppError::Unauthorized { .. })
        ));

        let uploaded = storage.generate_upload_url().await.unwrap().storage_id;
        match service.submit(Some(&user), challenge.id, uploaded, Uuid::new_v4()).await {
            Err(AppError::Validation { field, .. }) => {
                assert_eq!(field.as_deref(), Some("after_file_id"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(service.list_my_submissions(Some(&user)).await.unwrap().is_empty());
    }
}
