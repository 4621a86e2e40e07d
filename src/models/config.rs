//! Scheduling parameters and search budgets.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_court_count() -> usize {
    2
}

fn default_games_per_player() -> usize {
    4
}

fn default_match_balance_threshold() -> f64 {
    100.0
}

fn default_teammate_rating_cap() -> f64 {
    300.0
}

fn default_max_opponent_frequency() -> u32 {
    2
}

fn default_max_consecutive_active_rounds() -> usize {
    4
}

fn default_female_rating_offset() -> f64 {
    100.0
}

fn default_max_attempts() -> u32 {
    10
}

fn default_max_round_retries() -> u32 {
    10_000
}

fn default_max_court_steps() -> u64 {
    2_000
}

fn default_max_rest_plan_steps() -> u64 {
    50_000
}

/// Bounds on the randomized search. Each layer of retries has its own limit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Full restarts with a reshuffled player order.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Reshuffled retries of a single round before the attempt is abandoned.
    #[serde(default = "default_max_round_retries")]
    pub max_round_retries: u32,
    /// Candidate teams examined by one court-search retry.
    #[serde(default = "default_max_court_steps")]
    pub max_court_steps: u64,
    /// Rest combinations examined by the rest planner in one attempt.
    #[serde(default = "default_max_rest_plan_steps")]
    pub max_rest_plan_steps: u64,
    /// Wall-clock limit for the whole run, in milliseconds.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_round_retries: default_max_round_retries(),
            max_court_steps: default_max_court_steps(),
            max_rest_plan_steps: default_max_rest_plan_steps(),
            time_limit_ms: None,
        }
    }
}

impl SearchBudget {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Everything a scheduling run needs besides the players.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_court_count")]
    pub court_count: usize,
    #[serde(default = "default_games_per_player")]
    pub games_per_player: usize,
    /// Max difference between the two teams' average ratings on a court.
    #[serde(default = "default_match_balance_threshold")]
    pub match_balance_threshold: f64,
    /// Max rating difference between two teammates.
    #[serde(default = "default_teammate_rating_cap")]
    pub teammate_rating_cap: f64,
    /// Max times any two players face each other across the net.
    #[serde(default = "default_max_opponent_frequency")]
    pub max_opponent_frequency: u32,
    /// Longest run of rounds played without a rest. With `r` rests a player's games fall into
    /// at most `r + 1` runs, so the cap must be at least `games / (r + 1)`, rounded up.
    #[serde(default = "default_max_consecutive_active_rounds")]
    pub max_consecutive_active_rounds: usize,
    /// Drop gender court rules; fold gender into rating via `female_rating_offset` instead.
    #[serde(default)]
    pub ignore_gender_balance: bool,
    /// Subtracted from female ratings, only when `ignore_gender_balance` is set.
    #[serde(default = "default_female_rating_offset")]
    pub female_rating_offset: f64,
    /// Favoured-side courts the underdog must still be able to reach; 0 keeps the check advisory.
    #[serde(default)]
    pub min_expected_wins: u32,
    /// Fixed RNG seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub budget: SearchBudget,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            court_count: default_court_count(),
            games_per_player: default_games_per_player(),
            match_balance_threshold: default_match_balance_threshold(),
            teammate_rating_cap: default_teammate_rating_cap(),
            max_opponent_frequency: default_max_opponent_frequency(),
            max_consecutive_active_rounds: default_max_consecutive_active_rounds(),
            ignore_gender_balance: false,
            female_rating_offset: default_female_rating_offset(),
            min_expected_wins: 0,
            seed: None,
            budget: SearchBudget::default(),
        }
    }
}
