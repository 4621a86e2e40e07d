//! Scheduling logic: round plan and pre-checks, rest planning, court search, validation.

mod court_search;
mod ledger;
mod orchestrator;
mod rest_plan;
mod round_plan;
mod validate;

pub use orchestrator::{generate_schedule, generate_schedule_with_rng};
pub use round_plan::{check_feasibility, plan_rounds};
pub use validate::{validate_schedule, Violation};
