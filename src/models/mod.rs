//! Data structures for the scheduler: players, configuration, schedules.

mod config;
mod player;
mod schedule;

pub use config::{ScheduleConfig, SearchBudget};
pub use player::{Gender, Player, PlayerName, PlayerStats};
pub use schedule::{Court, CourtId, CourtMode, Round, RoundPlan, Schedule, ScheduleError, ScheduleId, Side, Team};
