//! Doubles round-robin scheduler: library with models, scheduling logic and roster parsing.

pub mod logic;
pub mod models;
pub mod roster;

pub use logic::{
    check_feasibility, generate_schedule, generate_schedule_with_rng, plan_rounds, validate_schedule,
    Violation,
};
pub use models::{
    Court, CourtId, CourtMode, Gender, Player, PlayerName, PlayerStats, Round, RoundPlan, Schedule,
    ScheduleConfig, ScheduleError, ScheduleId, SearchBudget, Side, Team,
};
pub use roster::{parse_roster, parse_roster_str};
