//! Schedule generation: pre-checks, then randomized restarts of rest planning and per-round
//! court assignment until one attempt produces a complete, valid schedule.

use crate::logic::court_search::{assign_round, CourtRules, RoundFailure, RoundLimits, SeatCourt};
use crate::logic::ledger::{FairnessLedger, Seat};
use crate::logic::rest_plan::{plan_rests, RestProblem};
use crate::logic::round_plan::check_feasibility;
use crate::logic::validate::validate_schedule;
use crate::models::{Court, Player, Round, RoundPlan, Schedule, ScheduleConfig, ScheduleError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Why a single attempt was abandoned.
#[derive(Debug)]
enum AttemptFailure {
    RestPlan,
    Round { number: usize, reason: RoundFailure },
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::RestPlan => write!(f, "no rest plan found"),
            AttemptFailure::Round { number, reason } => write!(f, "round {}: {}", number, reason),
        }
    }
}

/// Generate a schedule, seeding the RNG from `config.seed` when set.
pub fn generate_schedule(players: &[Player], config: &ScheduleConfig) -> Result<Schedule, ScheduleError> {
    match config.seed {
        Some(seed) => generate_schedule_with_rng(players, config, &mut StdRng::seed_from_u64(seed)),
        None => generate_schedule_with_rng(players, config, &mut rand::thread_rng()),
    }
}

/// Generate a schedule with a caller-supplied RNG.
///
/// 1. Check the configuration and compute the round plan (no randomness).
/// 2. Per attempt: shuffle the players, plan every round's rests, then assign courts round
///    by round. Any failure abandons the attempt.
/// 3. Return the first schedule that passes validation, or `SearchExhausted`.
pub fn generate_schedule_with_rng<R: Rng>(
    players: &[Player],
    config: &ScheduleConfig,
    rng: &mut R,
) -> Result<Schedule, ScheduleError> {
    let plan = check_feasibility(players, config)?;
    if plan.total_rounds() == 0 {
        return Ok(Schedule::new(plan, Vec::new(), 1));
    }

    let deadline = config.budget.time_limit().map(|d| Instant::now() + d);
    let max_attempts = config.budget.max_attempts;
    let mut order: Vec<&Player> = players.iter().collect();

    for attempt in 1..=max_attempts {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ScheduleError::TimeLimitExceeded);
        }
        order.shuffle(rng);
        let rounds = match run_attempt(&order, &plan, config, deadline, rng) {
            Ok(rounds) => rounds,
            Err(AttemptFailure::Round {
                reason: RoundFailure::TimedOut,
                ..
            }) => return Err(ScheduleError::TimeLimitExceeded),
            Err(failure) => {
                log::debug!("Attempt {}/{} failed: {}", attempt, max_attempts, failure);
                continue;
            }
        };

        let schedule = Schedule::new(plan.clone(), rounds, attempt);
        match validate_schedule(&schedule, players, config) {
            Ok(()) => {
                log::info!(
                    "Generated {} rounds for {} players on attempt {}",
                    schedule.rounds.len(),
                    players.len(),
                    attempt
                );
                return Ok(schedule);
            }
            Err(violations) => {
                for v in &violations {
                    log::error!("Attempt {} produced an invalid schedule: {}", attempt, v);
                }
            }
        }
    }

    log::info!("No schedule found after {} attempts", max_attempts);
    Err(ScheduleError::SearchExhausted {
        attempts: max_attempts,
    })
}

/// One attempt over a fixed player order. Seat `i` is `order[i]`.
fn run_attempt<R: Rng>(
    order: &[&Player],
    plan: &RoundPlan,
    config: &ScheduleConfig,
    deadline: Option<Instant>,
    rng: &mut R,
) -> Result<Vec<Round>, AttemptFailure> {
    let seats = order.len();
    let female: Vec<bool> = order.iter().map(|p| p.is_female()).collect();
    let ratings: Vec<f64> = order
        .iter()
        .map(|p| p.adjusted_rating(config.ignore_gender_balance, config.female_rating_offset))
        .collect();
    let extra_seats = extra_game_seats(&female, !config.ignore_gender_balance, plan.extra_games);
    let extra = |s: Seat| usize::from(extra_seats[s]);
    let rest_targets: Vec<usize> = (0..seats).map(|s| plan.target_rest - extra(s)).collect();
    let game_targets: Vec<u32> = (0..seats)
        .map(|s| (plan.games_per_player + extra(s)) as u32)
        .collect();
    let rest_slots = plan.rest_slots();

    let problem = RestProblem {
        female: &female,
        rest_targets: &rest_targets,
        rest_slots: &rest_slots,
        max_consecutive_active: config.max_consecutive_active_rounds,
        female_parity: !config.ignore_gender_balance,
    };
    let rest_plan = plan_rests(&problem, rng, config.budget.max_rest_plan_steps).ok_or(AttemptFailure::RestPlan)?;

    let rules = CourtRules {
        female: &female,
        ratings: &ratings,
        gender_balance: !config.ignore_gender_balance,
        match_balance_threshold: config.match_balance_threshold,
        teammate_rating_cap: config.teammate_rating_cap,
        max_opponent_frequency: config.max_opponent_frequency,
        min_expected_wins: config.min_expected_wins,
    };
    let limits = RoundLimits {
        max_retries: config.budget.max_round_retries,
        max_steps: config.budget.max_court_steps,
        deadline,
    };

    let mut ledger = FairnessLedger::new(game_targets);
    let mut rounds = Vec::with_capacity(plan.total_rounds());
    for (index, resting) in rest_plan.into_iter().enumerate() {
        let number = index + 1;
        let active: Vec<Seat> = (0..seats).filter(|s| !resting.contains(s)).collect();
        let courts = assign_round(
            &active,
            plan.courts_per_round[index],
            &mut ledger,
            &rules,
            &limits,
            rng,
        )
        .map_err(|reason| AttemptFailure::Round { number, reason })?;

        rounds.push(Round {
            number: number as u32,
            courts: courts.iter().map(|c| to_court(order, c)).collect(),
            resting: resting.iter().map(|&s| order[s].name.clone()).collect(),
        });
    }
    Ok(rounds)
}

/// Seats that fill the partial round's spare slots: one game more, one rest less.
///
/// Taken in seat order, skipping the members of a two-player gender group while others are
/// available. Those two always play or rest together, so only one of them taking the extra
/// game would leave their rest targets unreachable.
fn extra_game_seats(female: &[bool], gender_balance: bool, extra_games: usize) -> Vec<bool> {
    let females = female.iter().filter(|&&f| f).count();
    let paired = |s: Seat| {
        let same = if female[s] { females } else { female.len() - females };
        gender_balance && same == 2
    };
    let mut preference: Vec<Seat> = (0..female.len()).collect();
    preference.sort_by_key(|&s| paired(s));

    let mut extra = vec![false; female.len()];
    for &s in preference.iter().take(extra_games) {
        extra[s] = true;
    }
    extra
}

fn to_court(order: &[&Player], court: &SeatCourt) -> Court {
    let name = |s: Seat| order[s].name.clone();
    Court::new(
        court.mode,
        [name(court.team_1[0]), name(court.team_1[1])],
        [name(court.team_2[0]), name(court.team_2[1])],
        court.team_1_rating,
        court.team_2_rating,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_games_skip_a_two_player_gender_group() {
        let female = [true, true, false, false, false, false, false, false, false];
        assert_eq!(
            extra_game_seats(&female, true, 1),
            vec![false, false, true, false, false, false, false, false, false]
        );
        // Without gender balancing seat order decides.
        assert_eq!(
            extra_game_seats(&female, false, 2),
            vec![true, true, false, false, false, false, false, false, false]
        );
        // Larger groups are not held together.
        let female = [true, true, true, false, false];
        assert_eq!(
            extra_game_seats(&female, true, 1),
            vec![true, false, false, false, false]
        );
    }
}
