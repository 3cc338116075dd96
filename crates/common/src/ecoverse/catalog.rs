//! Static EcoVerse content: lessons, daily actions, leaderboard and rewards

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Section {
    pub heading: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Lesson {
    pub id: &'static str,
    pub title: &'static str,
    pub tag: &'static str,
    pub duration: &'static str,
    pub summary: &'static str,
    pub objectives: &'static [&'static str],
    pub sections: &'static [Section],
}

/// A one-off action that damages the personal monster
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Action {
    pub id: &'static str,
    pub title: &'static str,
    pub hp_cost: u32,
    pub points: u32,
    pub tag: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LeaderboardEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Reward {
    pub id: &'static str,
    pub title: &'static str,
    pub cost: u32,
    pub description: &'static str,
}

pub static LESSONS: [Lesson; 6] = [
    Lesson {
        id: "l1",
        title: "Climate Change Basics",
        tag: "Beginner",
        duration: "15 min",
        summary: "Learn about the fundamentals of climate change and its impact on our planet. \
                  Understand causes, effects, and everyday actions you can take.",
        objectives: &[
            "Explain the greenhouse effect in simple terms",
            "Recognize key human activities driving warming",
            "List 3 everyday actions to reduce emissions",
        ],
        sections: &[
            Section {
                heading: "What is Climate Change?",
                body: "Climate change refers to long-term shifts in temperatures and weather \
                       patterns. While these shifts can be natural, human activities, primarily \
                       the burning of fossil fuels, have been the main driver since the 1800s.",
            },
            Section {
                heading: "Greenhouse Effect",
                body: "Certain gases trap heat in the atmosphere like a blanket around Earth. This \
                       natural effect keeps our planet warm, but excess greenhouse gases cause too \
                       much warming.",
            },
            Section {
                heading: "What You Can Do",
                body: "Use public transit or cycle for short trips, reduce energy waste at home, \
                       and choose climate-friendly foods more often.",
            },
        ],
    },
    Lesson {
        id: "l2",
        title: "Renewable Energy Sources",
        tag: "Intermediate",
        duration: "20 min",
        summary: "Explore solar, wind, hydro, and more. See how renewables power communities while \
                  cutting carbon emissions.",
        objectives: &[
            "Differentiate common renewable sources",
            "Understand intermittency and storage basics",
            "Identify where renewables fit in daily life",
        ],
        sections: &[
            Section {
                heading: "Why Renewables?",
                body: "Renewables produce electricity without burning fossil fuels, lowering \
                       greenhouse gas emissions and air pollution.",
            },
            Section {
                heading: "Common Sources",
                body: "Solar panels capture sunlight; wind turbines harvest moving air; hydropower \
                       taps flowing water. Each has pros, cons, and ideal locations.",
            },
            Section {
                heading: "Storage & Grids",
                body: "Batteries and smart grids help balance supply and demand, keeping reliable \
                       power even when the sun or wind is low.",
            },
        ],
    },
    Lesson {
        id: "l3",
        title: "Ocean Conservation",
        tag: "Beginner",
        duration: "18 min",
        summary: "Understand the importance of protecting our oceans and marine life. Learn how \
                  pollution and overfishing threaten ecosystems.",
        objectives: &[
            "Describe why healthy oceans matter",
            "Recognize key threats like plastics and overfishing",
            "Adopt habits that reduce ocean pollution",
        ],
        sections: &[
            Section {
                heading: "Why Oceans Matter",
                body: "Oceans regulate climate, produce oxygen, and support billions of \
                       livelihoods. They're home to incredible biodiversity.",
            },
            Section {
                heading: "Main Threats",
                body: "Plastic pollution, warming waters, acidification, and overfishing harm \
                       marine life and coastal communities.",
            },
            Section {
                heading: "Protecting Our Seas",
                body: "Cut single-use plastics, support sustainable seafood, and join local \
                       clean-ups to keep waterways healthy.",
            },
        ],
    },
    Lesson {
        id: "l4",
        title: "Sustainable Transport",
        tag: "Beginner",
        duration: "16 min",
        summary: "Discover low-carbon travel choices and how cities and individuals can move \
                  smarter and greener.",
        objectives: &[
            "Recognize sustainable transport modes",
            "Compare emissions across commute options",
            "Adopt at least one greener travel habit",
        ],
        sections: &[
            Section {
                heading: "Why Transport Matters",
                body: "Transport is a major source of greenhouse gas emissions. Shifting to \
                       cleaner modes can greatly reduce your footprint.",
            },
            Section {
                heading: "Greener Commute Options",
                body: "Walking, cycling, public transit, and carpooling reduce emissions. E-bikes \
                       and e-scooters are great for short trips.",
            },
            Section {
                heading: "Plan Your Trip",
                body: "Use route planners to combine modes, avoid traffic, and pick the \
                       lowest-emission option that fits your time.",
            },
        ],
    },
    Lesson {
        id: "l5",
        title: "Water Conservation",
        tag: "Beginner",
        duration: "14 min",
        summary: "Learn practical ways to save water at home and in your community to protect this \
                  essential resource.",
        objectives: &[
            "Understand household water hotspots",
            "Apply quick-saving habits daily",
            "Spot and fix leaks efficiently",
        ],
        sections: &[
            Section {
                heading: "The Value of Water",
                body: "Freshwater is limited. Conserving it supports ecosystems, agriculture, and \
                       future generations.",
            },
            Section {
                heading: "Easy Savings at Home",
                body: "Turn off taps when not in use, run full loads in washers, and take shorter \
                       showers to cut daily use.",
            },
            Section {
                heading: "Detect Leaks",
                body: "Small leaks waste huge volumes over time. Check faucets, toilets, and \
                       outdoor hoses regularly.",
            },
        ],
    },
    Lesson {
        id: "l6",
        title: "Biodiversity Basics",
        tag: "Intermediate",
        duration: "22 min",
        summary: "Explore why biodiversity matters and how we can protect habitats for a thriving \
                  planet.",
        objectives: &[
            "Define biodiversity and ecosystem services",
            "Identify major threats to species",
            "Support local biodiversity actions",
        ],
        sections: &[
            Section {
                heading: "What is Biodiversity?",
                body: "Biodiversity is the variety of life on Earth. It supports clean air, water, \
                       food, and resilience.",
            },
            Section {
                heading: "Key Threats",
                body: "Habitat loss, pollution, invasive species, and climate change all reduce \
                       biodiversity worldwide.",
            },
            Section {
                heading: "Protecting Habitats",
                body: "Create pollinator-friendly spaces, reduce chemical use, and support \
                       conservation efforts locally.",
            },
        ],
    },
];

/// Personal monster actions and the daily challenge cards
pub static ACTIONS: [Action; 5] = [
    Action { id: "quick", title: "Daily Eco Action", hp_cost: 5, points: 10, tag: "Daily" },
    Action { id: "bonus", title: "Bonus Action", hp_cost: 10, points: 20, tag: "Daily" },
    Action {
        id: "c1",
        title: "Carry a Reusable Bottle Today",
        hp_cost: 5,
        points: 10,
        tag: "Water",
    },
    Action { id: "c2", title: "Skip Plastic Cutlery", hp_cost: 5, points: 12, tag: "Waste" },
    Action { id: "c3", title: "Plant a Seed or Sapling", hp_cost: 10, points: 25, tag: "Nature" },
];

pub static LEADERBOARD: [LeaderboardEntry; 3] = [
    LeaderboardEntry { id: "u1", name: "Aditi", points: 320 },
    LeaderboardEntry { id: "u2", name: "Rohan", points: 285 },
    LeaderboardEntry { id: "u3", name: "Kiran", points: 260 },
];

pub static REWARDS: [Reward; 2] = [
    Reward {
        id: "r1",
        title: "Eco Badge — Silver Leaf",
        cost: 150,
        description: "Showcase your eco-journey with a silver leaf badge.",
    },
    Reward {
        id: "r2",
        title: "Plant a Tree (Sponsor)",
        cost: 250,
        description: "Sponsor a sapling via our partner.",
    },
];

pub fn lesson(id: &str) -> Option<&'static Lesson> {
    LESSONS.iter().find(|l| l.id == id)
}

pub fn action(id: &str) -> Option<&'static Action> {
    ACTIONS.iter().find(|a| a.id == id)
}

pub fn reward(id: &str) -> Option<&'static Reward> {
    REWARDS.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        assert_eq!(lesson("l3").map(|l| l.title), Some("Ocean Conservation"));
        assert!(lesson("l7").is_none());

        let quick = action("quick").unwrap();
        assert_eq!((quick.hp_cost, quick.points), (5, 10));
        let bonus = action("bonus").unwrap();
        assert_eq!((bonus.hp_cost, bonus.points), (10, 20));

        assert_eq!(reward("r2").map(|r| r.cost), Some(250));
    }

    #[test]
    fn test_every_lesson_has_sections() {
        assert!(LESSONS.iter().all(|l| !l.sections.is_empty()));
    }

    #[test]
    fn test_leaderboard_is_ranked() {
        assert!(LEADERBOARD.windows(2).all(|w| w[0].points >= w[1].points));
    }
}
