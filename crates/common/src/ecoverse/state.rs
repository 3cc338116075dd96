//! Player state and its pure transitions

use super::catalog::{Lesson, Reward};
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const STARTING_POINTS: u32 = 10;
pub const PERSONAL_MONSTER_MAX_HP: u32 = 100;
pub const STARTING_PERSONAL_MONSTER_HP: u32 = 95;
pub const WORLD_BOSS_MAX_HP: u32 = 100_000;
pub const STARTING_WORLD_BOSS_HP: u32 = 93_200;

/// Points for logging a community action against the world boss
pub const WORLD_BOSS_CONTRIBUTION_POINTS: u32 = 5;

/// Badge awarded the first time the personal monster reaches 0 HP
pub const MONSTER_SLAYER: &str = "Monster Slayer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub eco_points: u32,
    pub badges: Vec<String>,
    pub personal_monster_hp: u32,
    pub world_boss_hp: u32,
    pub completed_actions: BTreeSet<String>,
    /// Completed section indexes per lesson id
    pub lesson_progress: BTreeMap<String, BTreeSet<usize>>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            eco_points: STARTING_POINTS,
            badges: Vec::new(),
            personal_monster_hp: STARTING_PERSONAL_MONSTER_HP,
            world_boss_hp: STARTING_WORLD_BOSS_HP,
            completed_actions: BTreeSet::new(),
            lesson_progress: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action id was used before; nothing changed
    AlreadyCompleted,
    Applied {
        personal_monster_hp: u32,
        world_boss_hp: u32,
        points_awarded: u32,
        badge_awarded: Option<String>,
    },
}

impl GameState {
    /// Apply a one-off action: damage both monsters and award points.
    pub fn complete_action(&mut self, id: &str, hp_cost: u32, points: u32) -> ActionOutcome {
        if self.completed_actions.contains(id) {
            return ActionOutcome::AlreadyCompleted;
        }

        self.personal_monster_hp = self.personal_monster_hp.saturating_sub(hp_cost);
        self.world_boss_hp = self.world_boss_hp.saturating_sub(1);
        self.eco_points = self.eco_points.saturating_add(points);
        self.completed_actions.insert(id.to_string());

        let badge_awarded = self.award_badge_if_slain();

        ActionOutcome::Applied {
            personal_monster_hp: self.personal_monster_hp,
            world_boss_hp: self.world_boss_hp,
            points_awarded: points,
            badge_awarded,
        }
    }

    /// Log a community action: world boss -1 HP, +5 points.
    /// Returns false and changes nothing once the boss is down.
    pub fn contribute_to_world_boss(&mut self) -> bool {
        if self.world_boss_hp == 0 {
            return false;
        }
        self.world_boss_hp -= 1;
        self.eco_points = self.eco_points.saturating_add(WORLD_BOSS_CONTRIBUTION_POINTS);
        true
    }

    pub fn award_points(&mut self, points: u32) {
        self.eco_points = self.eco_points.saturating_add(points);
    }

    /// Spend points on a reward, returning the remaining balance
    pub fn redeem_reward(&mut self, reward: &Reward) -> Result<u32> {
        if self.eco_points < reward.cost {
            return Err(AppError::InsufficientPoints {
                required: reward.cost,
                available: self.eco_points,
            });
        }
        self.eco_points -= reward.cost;
        Ok(self.eco_points)
    }

    /// Mark one lesson section read and return the lesson progress percent
    pub fn complete_lesson_section(&mut self, lesson: &Lesson, index: usize) -> Result<u8> {
        if index >= lesson.sections.len() {
            return Err(AppError::not_found("Lesson section", format!("{}/{}", lesson.id, index)));
        }

        self.lesson_progress
            .entry(lesson.id.to_string())
            .or_default()
            .insert(index);

        Ok(self.lesson_progress(lesson))
    }

    /// Mark every section read
    pub fn finish_lesson(&mut self, lesson: &Lesson) -> u8 {
        self.lesson_progress
            .insert(lesson.id.to_string(), (0..lesson.sections.len()).collect());
        self.lesson_progress(lesson)
    }

    /// Rounded percentage of sections read
    pub fn lesson_progress(&self, lesson: &Lesson) -> u8 {
        let total = lesson.sections.len();
        if total == 0 {
            return 0;
        }

        let done = self
            .lesson_progress
            .get(lesson.id)
            .map(|sections| sections.iter().filter(|i| **i < total).count())
            .unwrap_or(0);

        ((done as f64 / total as f64) * 100.0).round() as u8
    }

    fn award_badge_if_slain(&mut self) -> Option<String> {
        if self.personal_monster_hp > 0 || self.badges.iter().any(|b| b == MONSTER_SLAYER) {
            return None;
        }
        self.badges.push(MONSTER_SLAYER.to_string());
        Some(MONSTER_SLAYER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecoverse::catalog;

    #[test]
    fn test_starting_state() {
        let state = GameState::default();
        assert_eq!(state.eco_points, 10);
        assert_eq!(state.personal_monster_hp, 95);
        assert_eq!(state.world_boss_hp, 93_200);
        assert!(state.badges.is_empty());
    }

    #[test]
    fn test_repeated_action_has_no_effect() {
        let mut state = GameState::default();

        let first = state.complete_action("quick", 5, 10);
        assert!(matches!(first, ActionOutcome::Applied { points_awarded: 10, .. }));
        let snapshot = state.clone();

        assert_eq!(state.complete_action("quick", 5, 10), ActionOutcome::AlreadyCompleted);
        assert_eq!(state.complete_action("quick", 5, 10), ActionOutcome::AlreadyCompleted);
        assert_eq!(state, snapshot);
        assert_eq!(state.personal_monster_hp, 90);
        assert_eq!(state.world_boss_hp, 93_199);
        assert_eq!(state.eco_points, 20);
    }

    #[test]
    fn test_hp_floors_at_zero_and_badge_awarded_once() {
        let mut state = GameState {
            personal_monster_hp: 5,
            ..Default::default()
        };

        let outcome = state.complete_action("bonus", 10, 20);
        assert_eq!(
            outcome,
            ActionOutcome::Applied {
                personal_monster_hp: 0,
                world_boss_hp: 93_199,
                points_awarded: 20,
                badge_awarded: Some(MONSTER_SLAYER.to_string()),
            }
        );

        let outcome = state.complete_action("c3", 10, 25);
        assert!(matches!(
            outcome,
            ActionOutcome::Applied { badge_awarded: None, personal_monster_hp: 0, .. }
        ));
        assert_eq!(state.badges, vec![MONSTER_SLAYER.to_string()]);
    }

    #[test]
    fn test_world_boss_contribution() {
        let mut state = GameState {
            world_boss_hp: 1,
            ..Default::default()
        };

        assert!(state.contribute_to_world_boss());
        assert_eq!((state.world_boss_hp, state.eco_points), (0, 15));

        assert!(!state.contribute_to_world_boss());
        assert_eq!((state.world_boss_hp, state.eco_points), (0, 15));
    }

    #[test]
    fn test_redeem_reward() {
        let silver_leaf = catalog::reward("r1").unwrap();
        let mut state = GameState::default();

        assert!(matches!(
            state.redeem_reward(silver_leaf),
            Err(AppError::InsufficientPoints { required: 150, available: 10 })
        ));

        state.award_points(150);
        assert_eq!(state.redeem_reward(silver_leaf).unwrap(), 10);
    }

    #[test]
    fn test_lesson_progress() {
        let lesson = catalog::lesson("l1").unwrap();
        let mut state = GameState::default();
        assert_eq!(state.lesson_progress(lesson), 0);

        assert_eq!(state.complete_lesson_section(lesson, 0).unwrap(), 33);
        assert_eq!(state.complete_lesson_section(lesson, 0).unwrap(), 33);
        assert_eq!(state.complete_lesson_section(lesson, 2).unwrap(), 67);
        assert!(state.complete_lesson_section(lesson, 3).is_err());

        assert_eq!(state.finish_lesson(lesson), 100);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let state: GameState = serde_json::from_str(r#"{"eco_points": 42}"#).unwrap();
        assert_eq!(state.eco_points, 42);
        assert_eq!(state.personal_monster_hp, STARTING_PERSONAL_MONSTER_HP);
    }
}
