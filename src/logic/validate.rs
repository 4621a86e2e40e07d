//! Post-hoc schedule checks: every constraint a finished schedule must satisfy.

use crate::models::{CourtMode, Gender, Player, Schedule, ScheduleConfig, Team};
use std::collections::{HashMap, HashSet};

/// One broken constraint found in a schedule.
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    RoundCount { expected: usize, found: usize },
    CourtCount { round: u32, expected: usize, found: usize },
    UnknownPlayer { round: u32, name: String },
    /// Listed twice in a round (two courts, or resting and playing).
    DoubleBooked { round: u32, name: String },
    /// Neither playing nor resting in a round.
    Missing { round: u32, name: String },
    GameCount { name: String, games: usize },
    /// Number of players with one extra game differs from the plan.
    ExtraGames { expected: usize, found: usize },
    RestCount { name: String, rests: usize, expected: usize },
    RepeatPartnership { a: String, b: String },
    OpponentLimit { a: String, b: String, count: u32 },
    ConsecutiveActive { name: String, round: u32 },
    CourtMode { round: u32, court: usize, mode: CourtMode },
    TeammateGap { round: u32, team: Team },
    MatchBalance { round: u32, court: usize },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::RoundCount { expected, found } => {
                write!(f, "expected {} rounds, found {}", expected, found)
            }
            Violation::CourtCount { round, expected, found } => {
                write!(f, "round {}: expected {} courts, found {}", round, expected, found)
            }
            Violation::UnknownPlayer { round, name } => {
                write!(f, "round {}: unknown player '{}'", round, name)
            }
            Violation::DoubleBooked { round, name } => {
                write!(f, "round {}: '{}' is listed twice", round, name)
            }
            Violation::Missing { round, name } => {
                write!(f, "round {}: '{}' neither plays nor rests", round, name)
            }
            Violation::GameCount { name, games } => write!(f, "'{}' plays {} games", name, games),
            Violation::ExtraGames { expected, found } => write!(
                f,
                "{} players play an extra game, expected {}",
                found, expected
            ),
            Violation::RestCount { name, rests, expected } => {
                write!(f, "'{}' rests {} times, expected {}", name, rests, expected)
            }
            Violation::RepeatPartnership { a, b } => {
                write!(f, "'{}' and '{}' are teamed more than once", a, b)
            }
            Violation::OpponentLimit { a, b, count } => {
                write!(f, "'{}' and '{}' face each other {} times", a, b, count)
            }
            Violation::ConsecutiveActive { name, round } => {
                write!(f, "'{}' exceeds the consecutive-round limit in round {}", name, round)
            }
            Violation::CourtMode { round, court, mode } => {
                write!(f, "round {} court {}: players do not fit mode {:?}", round, court + 1, mode)
            }
            Violation::TeammateGap { round, team } => write!(
                f,
                "round {}: '{}' and '{}' are too far apart to be teammates",
                round, team[0], team[1]
            ),
            Violation::MatchBalance { round, court } => {
                write!(f, "round {} court {}: teams are unbalanced", round, court + 1)
            }
        }
    }
}

fn key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Check `schedule` against `players` and `config`. Returns every violation found.
pub fn validate_schedule(
    schedule: &Schedule,
    players: &[Player],
    config: &ScheduleConfig,
) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();
    let plan = &schedule.plan;
    let by_name: HashMap<&str, &Player> = players.iter().map(|p| (p.name.as_str(), p)).collect();
    let rating = |name: &str| {
        by_name
            .get(name)
            .map(|p| p.adjusted_rating(config.ignore_gender_balance, config.female_rating_offset))
            .unwrap_or(0.0)
    };

    if schedule.rounds.len() != plan.total_rounds() {
        violations.push(Violation::RoundCount {
            expected: plan.total_rounds(),
            found: schedule.rounds.len(),
        });
    }

    let mut games: HashMap<&str, usize> = HashMap::new();
    let mut rests: HashMap<&str, usize> = HashMap::new();
    let mut streaks: HashMap<&str, usize> = HashMap::new();
    let mut partnerships: HashSet<(&str, &str)> = HashSet::new();
    let mut opponents: HashMap<(&str, &str), u32> = HashMap::new();

    for (index, round) in schedule.rounds.iter().enumerate() {
        let number = round.number;
        if let Some(&expected) = plan.courts_per_round.get(index) {
            if round.courts.len() != expected {
                violations.push(Violation::CourtCount {
                    round: number,
                    expected,
                    found: round.courts.len(),
                });
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let listed = round
            .resting
            .iter()
            .chain(round.courts.iter().flat_map(|c| c.players()));
        for name in listed {
            if !by_name.contains_key(name.as_str()) {
                violations.push(Violation::UnknownPlayer {
                    round: number,
                    name: name.clone(),
                });
            } else if !seen.insert(name.as_str()) {
                violations.push(Violation::DoubleBooked {
                    round: number,
                    name: name.clone(),
                });
            }
        }
        for p in players {
            if !seen.contains(p.name.as_str()) {
                violations.push(Violation::Missing {
                    round: number,
                    name: p.name.clone(),
                });
            }
        }

        for name in &round.resting {
            *rests.entry(name.as_str()).or_insert(0) += 1;
            streaks.insert(name.as_str(), 0);
        }

        for (ci, court) in round.courts.iter().enumerate() {
            for name in court.players() {
                *games.entry(name.as_str()).or_insert(0) += 1;
                let streak = streaks.entry(name.as_str()).or_insert(0);
                *streak += 1;
                if *streak == config.max_consecutive_active_rounds + 1 {
                    violations.push(Violation::ConsecutiveActive {
                        name: name.clone(),
                        round: number,
                    });
                }
            }

            for team in [&court.team_1, &court.team_2] {
                if !partnerships.insert(key(&team[0], &team[1])) {
                    violations.push(Violation::RepeatPartnership {
                        a: team[0].clone(),
                        b: team[1].clone(),
                    });
                }
                if (rating(&team[0]) - rating(&team[1])).abs() > config.teammate_rating_cap {
                    violations.push(Violation::TeammateGap {
                        round: number,
                        team: team.clone(),
                    });
                }
            }
            for a in &court.team_1 {
                for b in &court.team_2 {
                    let count = opponents.entry(key(a, b)).or_insert(0);
                    *count += 1;
                    if *count == config.max_opponent_frequency + 1 {
                        violations.push(Violation::OpponentLimit {
                            a: a.clone(),
                            b: b.clone(),
                            count: *count,
                        });
                    }
                }
            }

            let avg_1 = (rating(&court.team_1[0]) + rating(&court.team_1[1])) / 2.0;
            let avg_2 = (rating(&court.team_2[0]) + rating(&court.team_2[1])) / 2.0;
            if (avg_1 - avg_2).abs() > config.match_balance_threshold {
                violations.push(Violation::MatchBalance {
                    round: number,
                    court: ci,
                });
            }

            let gender = |name: &str| by_name.get(name).map(|p| p.gender);
            if !mode_fits(court.mode, config.ignore_gender_balance, |name| gender(name), [&court.team_1, &court.team_2]) {
                violations.push(Violation::CourtMode {
                    round: number,
                    court: ci,
                    mode: court.mode,
                });
            }
        }
    }

    let total_rounds = schedule.rounds.len();
    let mut extra = 0;
    for p in players {
        let g = games.get(p.name.as_str()).copied().unwrap_or(0);
        let r = rests.get(p.name.as_str()).copied().unwrap_or(0);
        if g == plan.games_per_player + 1 && plan.extra_games > 0 {
            extra += 1;
        } else if g != plan.games_per_player {
            violations.push(Violation::GameCount {
                name: p.name.clone(),
                games: g,
            });
        }
        if r + g != total_rounds {
            violations.push(Violation::RestCount {
                name: p.name.clone(),
                rests: r,
                expected: total_rounds.saturating_sub(g),
            });
        }
    }
    if extra != plan.extra_games {
        violations.push(Violation::ExtraGames {
            expected: plan.extra_games,
            found: extra,
        });
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn mode_fits<F>(mode: CourtMode, ignore_gender_balance: bool, gender: F, teams: [&Team; 2]) -> bool
where
    F: Fn(&str) -> Option<Gender>,
{
    let females = |team: &Team| {
        team.iter()
            .filter(|n| gender(n.as_str()) == Some(Gender::Female))
            .count()
    };
    let (f1, f2) = (females(teams[0]), females(teams[1]));
    match (mode, ignore_gender_balance) {
        (CourtMode::Open, true) => true,
        (_, true) | (CourtMode::Open, false) => false,
        (CourtMode::Mixed, false) => f1 == 1 && f2 == 1,
        (CourtMode::AllFemale, false) => f1 == 2 && f2 == 2,
        (CourtMode::AllMale, false) => f1 == 0 && f2 == 0,
    }
}
