//! Player, Gender and PlayerStats data structures.

use serde::{Deserialize, Serialize};

/// Player key inside a schedule (names are unique per run).
pub type PlayerName = String;

/// Gender, used only for court-composition rules (and the optional rating offset).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[serde(alias = "m", alias = "M", alias = "Male")]
    Male,
    #[serde(alias = "f", alias = "F", alias = "Female")]
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// A player supplied to the scheduler. Never mutated by a scheduling run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: PlayerName,
    /// Skill rating ("ELO"); higher is stronger.
    pub rating: f64,
    pub gender: Gender,
}

impl Player {
    pub fn new(name: impl Into<String>, rating: f64, gender: Gender) -> Self {
        Self {
            name: name.into(),
            rating,
            gender,
        }
    }

    pub fn is_female(&self) -> bool {
        self.gender == Gender::Female
    }

    /// Rating used for balance checks in one run.
    ///
    /// With gender balancing disabled, female ratings are lowered by `female_offset`
    /// so gender still counts towards skill balance without structural court rules.
    pub fn adjusted_rating(&self, ignore_gender_balance: bool, female_offset: f64) -> f64 {
        if ignore_gender_balance && self.is_female() {
            self.rating - female_offset
        } else {
            self.rating
        }
    }
}

/// Per-player view of a finished schedule (for API / display).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub name: PlayerName,
    pub games: u32,
    pub rests: u32,
    /// Distinct teammates across the schedule.
    pub partners: Vec<PlayerName>,
    /// Courts where this player's team had the higher average rating.
    pub favored_courts: u32,
    /// Longest run of consecutive rounds played without a rest.
    pub longest_active_streak: u32,
}
