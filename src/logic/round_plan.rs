//! Round counts and the configuration checks that run before any search.

use crate::models::{Gender, Player, RoundPlan, ScheduleConfig, ScheduleError};
use std::collections::HashSet;

/// Compute how many rounds are played and how many courts each round uses.
///
/// Every full round fills all courts. Leftover player-slots go into one partial final
/// round with `ceil(remainder / 4)` courts.
pub fn plan_rounds(player_count: usize, court_count: usize, games_per_player: usize) -> RoundPlan {
    let mut courts_per_round = Vec::new();
    let mut extra_games = 0;
    if court_count > 0 {
        let total_slots = player_count * games_per_player;
        let slots_per_round = court_count * 4;
        let full_rounds = total_slots / slots_per_round;
        let remainder = total_slots % slots_per_round;
        courts_per_round = vec![court_count; full_rounds];
        if remainder > 0 {
            courts_per_round.push(remainder.div_ceil(4));
            extra_games = (4 - remainder % 4) % 4;
        }
    }
    let target_rest = courts_per_round.len().saturating_sub(games_per_player);
    RoundPlan {
        player_count,
        games_per_player,
        courts_per_round,
        target_rest,
        extra_games,
    }
}

fn ensure(cond: bool, msg: &str) -> Result<(), ScheduleError> {
    if cond {
        Ok(())
    } else {
        Err(ScheduleError::InvalidConfig(msg.to_string()))
    }
}

/// Validate players and configuration and return the round plan.
///
/// Deterministic: no randomness is involved, so calling it twice gives the same verdict.
pub fn check_feasibility(players: &[Player], config: &ScheduleConfig) -> Result<RoundPlan, ScheduleError> {
    if players.len() < 4 {
        return Err(ScheduleError::NotEnoughPlayers {
            found: players.len(),
        });
    }
    ensure(config.court_count >= 1, "court_count must be at least 1")?;
    if players.len() < config.court_count * 4 {
        return Err(ScheduleError::NotEnoughPlayersForCourts {
            players: players.len(),
            courts: config.court_count,
        });
    }

    let mut seen = HashSet::new();
    for p in players {
        let key = p.name.trim().to_lowercase();
        ensure(!key.is_empty(), "player names must not be empty")?;
        if !seen.insert(key) {
            return Err(ScheduleError::DuplicatePlayerName(p.name.clone()));
        }
        if !p.rating.is_finite() {
            return Err(ScheduleError::InvalidConfig(format!(
                "rating of '{}' is not a number",
                p.name
            )));
        }
    }

    ensure(
        config.match_balance_threshold.is_finite() && config.match_balance_threshold >= 0.0,
        "match_balance_threshold must be a non-negative number",
    )?;
    ensure(
        config.teammate_rating_cap.is_finite() && config.teammate_rating_cap >= 0.0,
        "teammate_rating_cap must be a non-negative number",
    )?;
    ensure(
        config.female_rating_offset.is_finite(),
        "female_rating_offset must be a number",
    )?;
    ensure(
        config.games_per_player == 0 || config.max_consecutive_active_rounds >= 1,
        "max_consecutive_active_rounds must be at least 1",
    )?;
    ensure(
        config.budget.max_attempts >= 1,
        "budget.max_attempts must be at least 1",
    )?;

    let plan = plan_rounds(players.len(), config.court_count, config.games_per_player);
    if plan.total_rounds() < config.games_per_player
        || (plan.extra_games > 0 && plan.target_rest == 0)
    {
        return Err(ScheduleError::TooManyGames {
            games_per_player: config.games_per_player,
            total_rounds: plan.total_rounds(),
        });
    }

    check_streak_cap(&plan, config)?;
    if !config.ignore_gender_balance {
        check_gender_split(players, config)?;
    }
    Ok(plan)
}

/// `rests` rests split a player's games into at most `rests + 1` active runs, each no longer
/// than the cap. Seats taking an extra game in the partial round rest once less.
fn check_streak_cap(plan: &RoundPlan, config: &ScheduleConfig) -> Result<(), ScheduleError> {
    let cap = config.max_consecutive_active_rounds;
    let mut loads = vec![(plan.games_per_player, plan.target_rest)];
    if plan.extra_games > 0 {
        loads.push((plan.games_per_player + 1, plan.target_rest - 1));
    }
    for (games, rests) in loads {
        if games > cap * (rests + 1) {
            return Err(ScheduleError::StreakCapTooLow {
                games,
                rests,
                max_consecutive_active_rounds: cap,
            });
        }
    }
    Ok(())
}

/// One player of a gender can never be paired; two players of a gender meet in every game.
fn check_gender_split(players: &[Player], config: &ScheduleConfig) -> Result<(), ScheduleError> {
    for gender in [Gender::Female, Gender::Male] {
        let count = players.iter().filter(|p| p.gender == gender).count();
        match count {
            1 => return Err(ScheduleError::LoneGender(gender)),
            2 if (config.max_opponent_frequency as usize) < config.games_per_player => {
                return Err(ScheduleError::PairedGender {
                    gender,
                    games_per_player: config.games_per_player,
                    max_opponent_frequency: config.max_opponent_frequency,
                });
            }
            _ => {}
        }
    }
    Ok(())
}
