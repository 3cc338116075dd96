//! EcoVerse gameplay engine
//!
//! Provides:
//! - Static lesson, action, leaderboard and reward catalogs
//! - The quiz bank with grading and 24-hour locks
//! - A serializable player state with pure transitions
//! - Persistence of that state through an injected key-value store
//!
//! Time always enters as an explicit `now` so countdowns are recomputed on
//! every read instead of by a ticking clock.

pub mod catalog;
pub mod quiz;
pub mod state;
pub mod store;

pub use quiz::{Difficulty, Grade, QuizLocks, QuizView};
pub use state::{ActionOutcome, GameState};
pub use store::GameStore;

use crate::cache::{keys, KeyValueStore};
use crate::db::models::User;
use crate::errors::{AppError, Result};
use crate::metrics;
use catalog::Lesson;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Lock state of one quiz for the current viewer
#[derive(Debug, Clone, Serialize)]
pub struct QuizStatus {
    pub id: &'static str,
    pub title: &'static str,
    pub tag: &'static str,
    pub difficulty: Difficulty,
    pub question_count: usize,
    pub locked: bool,
    /// `HH:MM` until the quiz reopens
    pub remaining: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub state: GameState,
    pub personal_monster_max_hp: u32,
    pub world_boss_max_hp: u32,
    pub quizzes: Vec<QuizStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    pub applied: bool,
    pub world_boss_hp: u32,
    pub eco_points: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    #[serde(flatten)]
    pub grade: Grade,
    pub eco_points: u32,
    pub unlocks_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonDetail {
    #[serde(flatten)]
    pub lesson: &'static Lesson,
    /// Percent of sections read, present for a signed-in viewer
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub reward_id: &'static str,
    pub eco_points: u32,
}

/// One async mutex per stored key
#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Lock every key, always in sorted order so overlapping callers cannot deadlock
    async fn acquire(&self, mut keys: Vec<String>) -> Vec<OwnedMutexGuard<()>> {
        keys.sort();
        keys.dedup();

        let handles: Vec<_> = {
            let mut locks = self.locks.lock().await;
            // Entries nobody else holds are idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            keys.into_iter()
                .map(|key| locks.entry(key).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }
        guards
    }
}

/// Loads, transitions and saves player state.
///
/// Read-modify-write cycles on the same stored key are serialized within
/// this process so two concurrent requests cannot lose each other's points.
/// Different players never wait on each other.
pub struct EcoVerse {
    store: GameStore,
    key_locks: KeyLocks,
}

impl EcoVerse {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: GameStore::new(kv),
            key_locks: KeyLocks::default(),
        }
    }

    async fn lock_state(&self, user_id: Uuid) -> Vec<OwnedMutexGuard<()>> {
        self.key_locks.acquire(vec![keys::game_state(user_id)]).await
    }

    /// Player state with quiz countdowns as of `now`
    pub async fn dashboard(&self, user: &User, now: DateTime<Utc>) -> Result<Dashboard> {
        let state = self.store.load_state(user.id).await?;
        let quizzes = self.quizzes(user, now).await?;

        Ok(Dashboard {
            state,
            personal_monster_max_hp: state::PERSONAL_MONSTER_MAX_HP,
            world_boss_max_hp: state::WORLD_BOSS_MAX_HP,
            quizzes,
        })
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn complete_action(&self, user: &User, action_id: &str) -> Result<ActionOutcome> {
        let action = catalog::action(action_id)
            .ok_or_else(|| AppError::not_found("Action", action_id))?;

        let _guard = self.lock_state(user.id).await;
        let mut state = self.store.load_state(user.id).await?;

        let outcome = state.complete_action(action.id, action.hp_cost, action.points);
        if let ActionOutcome::Applied { badge_awarded, .. } = &outcome {
            self.store.save_state(user.id, &state).await?;
            metrics::record_eco_action(action.id);
            info!(action = action.id, badge = ?badge_awarded, "Eco action completed");
        }

        Ok(outcome)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn contribute_to_world_boss(&self, user: &User) -> Result<Contribution> {
        let _guard = self.lock_state(user.id).await;
        let mut state = self.store.load_state(user.id).await?;

        let applied = state.contribute_to_world_boss();
        if applied {
            self.store.save_state(user.id, &state).await?;
            metrics::record_eco_action("world_boss");
        }

        Ok(Contribution {
            applied,
            world_boss_hp: state.world_boss_hp,
            eco_points: state.eco_points,
        })
    }

    pub async fn quizzes(&self, user: &User, now: DateTime<Utc>) -> Result<Vec<QuizStatus>> {
        let locks = self.store.load_locks(user.email.as_deref()).await?;

        Ok(quiz::QUIZZES
            .iter()
            .map(|q| {
                let locked = locks.is_locked(q.id, now);
                QuizStatus {
                    id: q.id,
                    title: q.title,
                    tag: q.tag,
                    difficulty: q.difficulty,
                    question_count: q.questions.len(),
                    locked,
                    remaining: locked.then(|| quiz::format_remaining(locks.remaining(q.id, now))),
                }
            })
            .collect())
    }

    /// The quiz without its answer key, unless it is locked
    pub async fn open_quiz(
        &self,
        user: &User,
        quiz_id: &str,
        now: DateTime<Utc>,
    ) -> Result<QuizView> {
        let quiz = quiz::quiz(quiz_id).ok_or_else(|| AppError::not_found("Quiz", quiz_id))?;

        let locks = self.store.load_locks(user.email.as_deref()).await?;
        locks.ensure_open(quiz.id, now)?;

        Ok(QuizView::from(quiz))
    }

    /// Grade answers, award points and close the quiz for 24 hours
    #[instrument(skip(self, user, answers), fields(user_id = %user.id))]
    pub async fn submit_quiz(
        &self,
        user: &User,
        quiz_id: &str,
        answers: &[Option<usize>],
        now: DateTime<Utc>,
    ) -> Result<QuizResult> {
        let quiz = quiz::quiz(quiz_id).ok_or_else(|| AppError::not_found("Quiz", quiz_id))?;
        let email = user.email.as_deref();

        let _guards = self
            .key_locks
            .acquire(vec![keys::game_state(user.id), keys::quiz_locks(email)])
            .await;
        let mut locks = self.store.load_locks(email).await?;
        locks.ensure_open(quiz.id, now)?;

        let grade = quiz::grade(quiz, answers)?;

        let mut state = self.store.load_state(user.id).await?;
        state.award_points(grade.points);

        // The lock is written before the points so a failed write can never
        // leave points awarded on a quiz that is still open.
        let previous_locks = locks.clone();
        locks.lock(quiz.id, now);
        self.store.save_locks(email, &locks).await?;

        if let Err(e) = self.store.save_state(user.id, &state).await {
            if let Err(restore) = self.store.save_locks(email, &previous_locks).await {
                warn!(
                    quiz = quiz.id,
                    error = %restore,
                    "Quiz stays locked after failed point award"
                );
            }
            return Err(e);
        }

        metrics::record_quiz_submission(quiz.id, grade.correct);
        info!(quiz = quiz.id, correct = grade.correct, points = grade.points, "Quiz graded");

        Ok(QuizResult {
            grade,
            eco_points: state.eco_points,
            unlocks_at: now + Duration::hours(quiz::QUIZ_LOCK_HOURS),
        })
    }

    pub async fn lesson(&self, viewer: Option<&User>, lesson_id: &str) -> Result<LessonDetail> {
        let lesson = find_lesson(lesson_id)?;

        let progress = match viewer {
            Some(user) => Some(self.store.load_state(user.id).await?.lesson_progress(lesson)),
            None => None,
        };

        Ok(LessonDetail { lesson, progress })
    }

    /// Mark a section read, returning the lesson progress percent
    pub async fn complete_lesson_section(
        &self,
        user: &User,
        lesson_id: &str,
        index: usize,
    ) -> Result<u8> {
        let lesson = find_lesson(lesson_id)?;

        let _guard = self.lock_state(user.id).await;
        let mut state = self.store.load_state(user.id).await?;
        let progress = state.complete_lesson_section(lesson, index)?;
        self.store.save_state(user.id, &state).await?;

        Ok(progress)
    }

    pub async fn finish_lesson(&self, user: &User, lesson_id: &str) -> Result<u8> {
        let lesson = find_lesson(lesson_id)?;

        let _guard = self.lock_state(user.id).await;
        let mut state = self.store.load_state(user.id).await?;
        let progress = state.finish_lesson(lesson);
        self.store.save_state(user.id, &state).await?;

        Ok(progress)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn redeem_reward(&self, user: &User, reward_id: &str) -> Result<Redemption> {
        let reward = catalog::reward(reward_id)
            .ok_or_else(|| AppError::not_found("Reward", reward_id))?;

        let _guard = self.lock_state(user.id).await;
        let mut state = self.store.load_state(user.id).await?;
        let eco_points = state.redeem_reward(reward)?;
        self.store.save_state(user.id, &state).await?;

        info!(reward = reward.id, cost = reward.cost, "Reward redeemed");

        Ok(Redemption { reward_id: reward.id, eco_points })
    }
}

fn find_lesson(lesson_id: &str) -> Result<&'static Lesson> {
    catalog::lesson(lesson_id).ok_or_else(|| AppError::not_found("Lesson", lesson_id))
}
