//! Quiz bank, grading and 24-hour quiz locks

use crate::errors::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How long a quiz stays closed after a graded submission
pub const QUIZ_LOCK_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn points_per_correct(self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 8,
            Difficulty::Hard => 12,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub prompt: &'static str,
    pub options: &'static [&'static str],
    pub correct: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Quiz {
    pub id: &'static str,
    pub title: &'static str,
    pub tag: &'static str,
    pub difficulty: Difficulty,
    pub questions: &'static [Question],
}

/// A question as shown to a player, without its answer key
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    pub id: &'static str,
    pub title: &'static str,
    pub tag: &'static str,
    pub difficulty: Difficulty,
    pub questions: Vec<QuestionView>,
}

impl From<&Quiz> for QuizView {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            tag: quiz.tag,
            difficulty: quiz.difficulty,
            questions: quiz
                .questions
                .iter()
                .map(|q| QuestionView { prompt: q.prompt, options: q.options })
                .collect(),
        }
    }
}

/// Result of grading one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grade {
    /// Per-question correctness, in question order
    pub results: Vec<bool>,
    pub correct: usize,
    pub total: usize,
    pub points: u32,
}

macro_rules! question {
    ($prompt:expr, [$($opt:expr),+ $(,)?], $correct:expr) => {
        Question { prompt: $prompt, options: &[$($opt),+], correct: $correct }
    };
}

pub static QUIZZES: [Quiz; 6] = [
    Quiz {
        id: "q1",
        title: "Carbon Quiz",
        tag: "Climate",
        difficulty: Difficulty::Medium,
        questions: &[
            question!("Which gas is the primary contributor to human-caused climate change?",
                ["Oxygen (O2)", "Carbon Dioxide (CO2)", "Nitrogen (N2)", "Ozone (O3)"], 1),
            question!("Which activity generally has the lowest carbon footprint?",
                ["Driving alone in a car", "Eating beef daily", "Cycling or walking",
                 "Taking short flights frequently"], 2),
            question!("What does 'carbon footprint' measure?",
                ["Money spent on energy", "Amount of waste produced",
                 "Total greenhouse gases emitted", "Electricity used per day"], 2),
            question!("Which sector is a major source of CO2 emissions globally?",
                ["Transportation", "Entertainment", "Sports", "Libraries"], 0),
            question!("Which diet change most effectively lowers emissions?",
                ["More beef", "More lamb", "More plant-based meals", "More cheese"], 2),
            question!("Best way to cut home electricity emissions?",
                ["Leave lights on", "Use LED bulbs and efficient appliances",
                 "Open windows in winter", "Run devices 24/7"], 1),
        ],
    },
    Quiz {
        id: "q2",
        title: "Waste Sorting",
        tag: "Waste",
        difficulty: Difficulty::Easy,
        questions: &[
            question!(
                "Which of the following should typically go into recycling (check local rules)?",
                ["Clean paper and cardboard", "Food scraps", "Used tissues", "Ceramic plates"], 0),
            question!("What's the best place for fruit and vegetable peels?",
                ["General trash", "Recycling bin", "Compost", "Glass-only bin"], 2),
            question!("Why rinse containers before recycling?",
                ["To reduce odor only", "To remove food residue that can contaminate recycling",
                 "To make them shinier", "It's not necessary"], 1),
            question!("Which is typically NOT recyclable curbside?",
                ["Plastic bags/films", "Aluminum cans", "Glass bottles", "Cardboard boxes"], 0),
            question!("Best way to avoid contamination?",
                ["Bag recyclables tightly", "Put liquids in bottles",
                 "Keep materials clean and dry", "Mix trash into recycling"], 2),
        ],
    },
    Quiz {
        id: "q3",
        title: "Renewable Energy",
        tag: "Energy",
        difficulty: Difficulty::Medium,
        questions: &[
            question!("Solar PV panels convert sunlight into...",
                ["Heat energy", "Mechanical energy", "Electrical energy", "Sound energy"], 2),
            question!("Wind turbines capture energy from...",
                ["Ocean currents", "Moving air", "Geothermal vents", "Tides"], 1),
            question!("Why is storage important for renewables?",
                ["It decorates the grid", "It smooths intermittent supply",
                 "It increases fossil fuels", "It reduces efficiency"], 1),
            question!("Which is a form of energy storage?",
                ["Pumped hydro", "Wooden crates", "Plastic bags", "Paper bins"], 0),
        ],
    },
    Quiz {
        id: "q4",
        title: "Water Savers",
        tag: "Water",
        difficulty: Difficulty::Easy,
        questions: &[
            question!("Which habit saves the most water at home?",
                ["Shorter showers", "Running tap while brushing", "Leaky toilet",
                 "Half-load laundry frequently"], 0),
            question!("Best time to water plants?",
                ["Midday", "Early morning", "Evening", "Anytime"], 1),
            question!("Good way to reduce outdoor water use?",
                ["Use native plants and mulch", "Wash driveway with hose", "Water daily at noon",
                 "Over-fertilize lawn"], 0),
        ],
    },
    Quiz {
        id: "q5",
        title: "Sustainable Transport",
        tag: "Transport",
        difficulty: Difficulty::Hard,
        questions: &[
            question!("Which mode typically has the lowest per-km emissions?",
                ["Solo driving", "Bus transit", "Cycling", "Short-haul flights"], 2),
            question!("What is a key co-benefit of cycling and walking?",
                ["Higher fuel costs", "Air pollution", "Better health outcomes",
                 "More traffic"], 2),
            question!("EV emissions are lowest when...",
                ["Charging from coal-heavy grids", "Charging from clean energy",
                 "Idling for long periods", "Driving at high speeds constantly"], 1),
            question!("A practical way to cut transport emissions is to...",
                ["Drive solo everywhere", "Combine errands and carpool", "Always take flights",
                 "Keep tires underinflated"], 1),
            question!("City designs that reduce emissions include...",
                ["Unsafe bike lanes", "Sprawl and long commutes",
                 "Mixed-use, walkable neighborhoods", "High parking minimums"], 2),
        ],
    },
    Quiz {
        id: "q6",
        title: "Biodiversity Basics",
        tag: "Biodiversity",
        difficulty: Difficulty::Medium,
        questions: &[
            question!("Biodiversity includes...",
                ["Only number of species", "Species, ecosystems, and genetic diversity",
                 "Just large animals", "Only plants"], 1),
            question!("A major threat to biodiversity is...",
                ["Habitat loss", "Reading books", "Cloudy weather", "Recycling"], 0),
            question!("Pollinators support...",
                ["Soil erosion", "Food production and ecosystems", "Indoor air pollution",
                 "Ocean currents"], 1),
            question!("A good backyard action is to...",
                ["Use many pesticides", "Plant native species", "Remove all flowers",
                 "Pave the garden"], 1),
        ],
    },
];

pub fn quiz(id: &str) -> Option<&'static Quiz> {
    QUIZZES.iter().find(|q| q.id == id)
}

/// Grade answers given as one chosen option index per question.
///
/// Every question must be answered; `None` marks a skipped question.
pub fn grade(quiz: &Quiz, answers: &[Option<usize>]) -> Result<Grade> {
    if answers.len() != quiz.questions.len() || answers.iter().any(Option::is_none) {
        return Err(AppError::Validation {
            message: "Please answer all questions before submitting".to_string(),
            field: Some("answers".to_string()),
        });
    }

    let results: Vec<bool> = quiz
        .questions
        .iter()
        .zip(answers)
        .map(|(question, answer)| *answer == Some(question.correct))
        .collect();
    let correct = results.iter().filter(|ok| **ok).count();

    Ok(Grade {
        total: results.len(),
        points: correct as u32 * quiz.difficulty.points_per_correct(),
        correct,
        results,
    })
}

/// Unlock instants per quiz id, stored as epoch milliseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizLocks(HashMap<String, i64>);

impl QuizLocks {
    pub fn is_locked(&self, quiz_id: &str, now: DateTime<Utc>) -> bool {
        self.0
            .get(quiz_id)
            .is_some_and(|unlock_ms| *unlock_ms > now.timestamp_millis())
    }

    /// Time left until the quiz reopens, zero when it is open
    pub fn remaining(&self, quiz_id: &str, now: DateTime<Utc>) -> Duration {
        let unlock_ms = self.0.get(quiz_id).copied().unwrap_or(0);
        Duration::milliseconds((unlock_ms - now.timestamp_millis()).max(0))
    }

    /// Close the quiz for [`QUIZ_LOCK_HOURS`] from `now`
    pub fn lock(&mut self, quiz_id: &str, now: DateTime<Utc>) {
        let unlock = now + Duration::hours(QUIZ_LOCK_HOURS);
        self.0.insert(quiz_id.to_string(), unlock.timestamp_millis());
    }

    /// Fail with `QuizLocked` while the quiz is closed
    pub fn ensure_open(&self, quiz_id: &str, now: DateTime<Utc>) -> Result<()> {
        if self.is_locked(quiz_id, now) {
            return Err(AppError::QuizLocked {
                quiz_id: quiz_id.to_string(),
                remaining: format_remaining(self.remaining(quiz_id, now)),
            });
        }
        Ok(())
    }
}

/// Render a countdown as `HH:MM`, rounding up to the next whole minute
pub fn format_remaining(remaining: Duration) -> String {
    let ms = remaining.num_milliseconds().max(0);
    let total_minutes = (ms + 59_999) / 60_000;
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 22, 9, 0, 0).unwrap()
    }

    fn answer_key(quiz: &Quiz) -> Vec<Option<usize>> {
        quiz.questions.iter().map(|q| Some(q.correct)).collect()
    }

    #[test]
    fn test_bank_shape() {
        assert_eq!(QUIZZES.len(), 6);
        for quiz in &QUIZZES {
            assert!(quiz.questions.iter().all(|q| q.correct < q.options.len()));
        }
        assert_eq!(quiz("q5").map(|q| q.difficulty), Some(Difficulty::Hard));
    }

    #[test]
    fn test_grade_scales_with_difficulty() {
        let carbon = quiz("q1").unwrap();
        let grade = grade(carbon, &answer_key(carbon)).unwrap();
        assert_eq!(grade.correct, 6);
        assert_eq!(grade.points, 6 * 8);

        let transport = quiz("q5").unwrap();
        let mut answers = answer_key(transport);
        answers[0] = Some(0);
        let grade = super::grade(transport, &answers).unwrap();
        assert_eq!(grade.correct, 4);
        assert_eq!(grade.points, 4 * 12);
        assert!(!grade.results[0]);
    }

    #[test]
    fn test_grade_requires_every_answer() {
        let water = quiz("q4").unwrap();
        assert!(matches!(
            grade(water, &[Some(0), None, Some(0)]),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(grade(water, &[Some(0)]), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_lock_lasts_twenty_four_hours() {
        let mut locks = QuizLocks::default();
        assert!(!locks.is_locked("q1", t0()));

        locks.lock("q1", t0());
        assert!(locks.is_locked("q1", t0() + Duration::hours(23)));
        assert!(locks.ensure_open("q1", t0() + Duration::minutes(1)).is_err());
        assert!(!locks.is_locked("q1", t0() + Duration::hours(24)));
        assert!(locks.ensure_open("q1", t0() + Duration::hours(25)).is_ok());
        assert!(!locks.is_locked("q2", t0()));
    }

    #[test]
    fn test_format_remaining_rounds_up() {
        assert_eq!(format_remaining(Duration::hours(24)), "24:00");
        assert_eq!(format_remaining(Duration::seconds(1)), "00:01");
        assert_eq!(format_remaining(Duration::minutes(61) + Duration::seconds(30)), "01:02");
        assert_eq!(format_remaining(Duration::zero()), "00:00");
    }

    #[test]
    fn test_locks_use_epoch_millis_on_the_wire() {
        let mut locks = QuizLocks::default();
        locks.lock("q2", t0());

        let json = serde_json::to_value(&locks).unwrap();
        let expected = (t0() + Duration::hours(24)).timestamp_millis();
        assert_eq!(json, serde_json::json!({ "q2": expected }));
    }
}
