//! Schedule output: rounds, courts, teams, plus the round plan and ScheduleError.

use crate::models::player::{Gender, Player, PlayerName, PlayerStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Unique identifier for a generated schedule.
pub type ScheduleId = Uuid;

/// Unique identifier for a court assignment.
pub type CourtId = Uuid;

/// Which side of the net.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    One,
    Two,
}

impl Side {
    /// Side with the strictly higher average rating, if any.
    pub fn favored(team_1_rating: f64, team_2_rating: f64) -> Option<Side> {
        if team_1_rating > team_2_rating {
            Some(Side::One)
        } else if team_2_rating > team_1_rating {
            Some(Side::Two)
        } else {
            None
        }
    }
}

/// Gender arrangement of a court.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtMode {
    /// One female and one male on each team.
    Mixed,
    AllFemale,
    AllMale,
    /// Gender ignored (gender balancing disabled).
    Open,
}

/// Two players on the same side of a court.
pub type Team = [PlayerName; 2];

/// One court in one round: two teams of two.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    pub mode: CourtMode,
    pub team_1: Team,
    pub team_2: Team,
    /// Average adjusted rating of team 1.
    pub team_1_rating: f64,
    /// Average adjusted rating of team 2.
    pub team_2_rating: f64,
    /// Side with the strictly higher average; None on a tie.
    pub favored: Option<Side>,
}

impl Court {
    pub fn new(mode: CourtMode, team_1: Team, team_2: Team, team_1_rating: f64, team_2_rating: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            team_1,
            team_2,
            team_1_rating,
            team_2_rating,
            favored: Side::favored(team_1_rating, team_2_rating),
        }
    }

    /// All four players on the court.
    pub fn players(&self) -> impl Iterator<Item = &PlayerName> {
        self.team_1.iter().chain(self.team_2.iter())
    }

    pub fn team(&self, side: Side) -> &Team {
        match side {
            Side::One => &self.team_1,
            Side::Two => &self.team_2,
        }
    }
}

/// One round: the courts in play and who sits out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based round number.
    pub number: u32,
    pub courts: Vec<Court>,
    pub resting: Vec<PlayerName>,
}

/// Round counts derived from player count, court count and games per player.
///
/// A pure function of its three inputs; see [`crate::plan_rounds`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundPlan {
    pub player_count: usize,
    pub games_per_player: usize,
    /// Courts in play for each round. Only the last one can be smaller.
    pub courts_per_round: Vec<usize>,
    /// Rests each player owes (`total_rounds - games_per_player`).
    pub target_rest: usize,
    /// Players who play one extra game because the partial round has spare slots.
    pub extra_games: usize,
}

impl RoundPlan {
    pub fn total_rounds(&self) -> usize {
        self.courts_per_round.len()
    }

    /// Number of players sitting out in each round.
    pub fn rest_slots(&self) -> Vec<usize> {
        self.courts_per_round
            .iter()
            .map(|c| self.player_count - c * 4)
            .collect()
    }

    pub fn has_partial_round(&self) -> bool {
        match (self.courts_per_round.first(), self.courts_per_round.last()) {
            (Some(first), Some(last)) => last < first,
            _ => false,
        }
    }
}

/// A complete schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub generated_at: DateTime<Utc>,
    /// 1-based index of the attempt that produced this schedule.
    pub attempts: u32,
    pub plan: RoundPlan,
    pub rounds: Vec<Round>,
}

impl Schedule {
    pub fn new(plan: RoundPlan, rounds: Vec<Round>, attempts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            attempts,
            plan,
            rounds,
        }
    }

    /// Resting players, one list per round.
    pub fn rests(&self) -> Vec<Vec<PlayerName>> {
        self.rounds.iter().map(|r| r.resting.clone()).collect()
    }

    /// Per round, per court, the two teams.
    pub fn court_grid(&self) -> Vec<Vec<[Team; 2]>> {
        self.rounds
            .iter()
            .map(|r| {
                r.courts
                    .iter()
                    .map(|c| [c.team_1.clone(), c.team_2.clone()])
                    .collect()
            })
            .collect()
    }

    /// Per-player summary, in the order of `players`.
    pub fn player_stats(&self, players: &[Player]) -> Vec<PlayerStats> {
        let mut partners: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        let mut stats: HashMap<&str, PlayerStats> = players
            .iter()
            .map(|p| {
                (
                    p.name.as_str(),
                    PlayerStats {
                        name: p.name.clone(),
                        ..PlayerStats::default()
                    },
                )
            })
            .collect();
        let mut streaks: HashMap<&str, u32> = HashMap::new();

        for round in &self.rounds {
            for name in &round.resting {
                if let Some(s) = stats.get_mut(name.as_str()) {
                    s.rests += 1;
                }
                streaks.insert(name.as_str(), 0);
            }
            for court in &round.courts {
                for side in [Side::One, Side::Two] {
                    let team = court.team(side);
                    for (i, name) in team.iter().enumerate() {
                        let mate = &team[1 - i];
                        partners.entry(name.as_str()).or_default().insert(mate.as_str());
                        let streak = streaks.entry(name.as_str()).or_insert(0);
                        *streak += 1;
                        if let Some(s) = stats.get_mut(name.as_str()) {
                            s.games += 1;
                            s.longest_active_streak = s.longest_active_streak.max(*streak);
                            if court.favored == Some(side) {
                                s.favored_courts += 1;
                            }
                        }
                    }
                }
            }
        }

        players
            .iter()
            .filter_map(|p| {
                let mut s = stats.remove(p.name.as_str())?;
                s.partners = partners
                    .get(p.name.as_str())
                    .map(|set| set.iter().map(|n| n.to_string()).collect())
                    .unwrap_or_default();
                Some(s)
            })
            .collect()
    }
}

/// Errors reported by the scheduler. Nothing is returned on failure: a schedule is all-or-nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum ScheduleError {
    /// Need at least 4 players.
    NotEnoughPlayers { found: usize },
    /// Fewer players than the courts can hold.
    NotEnoughPlayersForCourts { players: usize, courts: usize },
    /// Names are unique per run (case-insensitive).
    DuplicatePlayerName(PlayerName),
    /// A configuration value is out of range.
    InvalidConfig(String),
    /// More games per player than the round count can provide.
    TooManyGames { games_per_player: usize, total_rounds: usize },
    /// A player must play more rounds in a row than `max_consecutive_active_rounds` allows.
    StreakCapTooLow {
        games: usize,
        rests: usize,
        max_consecutive_active_rounds: usize,
    },
    /// Roster text could not be parsed.
    InvalidRoster { line: u64, message: String },
    /// Exactly one player of this gender: they can never be paired under gender balancing.
    LoneGender(Gender),
    /// Exactly two players of this gender always face each other, so the opponent cap must cover every game.
    PairedGender {
        gender: Gender,
        games_per_player: usize,
        max_opponent_frequency: u32,
    },
    /// Every attempt failed; relax the constraints and retry.
    SearchExhausted { attempts: u32 },
    /// The configured time limit ran out before a schedule was found.
    TimeLimitExceeded,
}

impl ScheduleError {
    /// Stable machine-readable tag (used by the HTTP layer).
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::NotEnoughPlayers { .. } => "not_enough_players",
            ScheduleError::NotEnoughPlayersForCourts { .. } => "not_enough_players_for_courts",
            ScheduleError::DuplicatePlayerName(_) => "duplicate_player_name",
            ScheduleError::InvalidConfig(_) => "invalid_config",
            ScheduleError::TooManyGames { .. } => "too_many_games",
            ScheduleError::StreakCapTooLow { .. } => "streak_cap_too_low",
            ScheduleError::InvalidRoster { .. } => "invalid_roster",
            ScheduleError::LoneGender(_) => "lone_gender",
            ScheduleError::PairedGender { .. } => "paired_gender",
            ScheduleError::SearchExhausted { .. } => "search_exhausted",
            ScheduleError::TimeLimitExceeded => "time_limit_exceeded",
        }
    }

    /// True for errors found before any search starts.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            ScheduleError::SearchExhausted { .. } | ScheduleError::TimeLimitExceeded
        )
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::NotEnoughPlayers { found } => {
                write!(f, "Need at least 4 players (got {})", found)
            }
            ScheduleError::NotEnoughPlayersForCourts { players, courts } => write!(
                f,
                "{} courts need at least {} players (got {})",
                courts,
                courts * 4,
                players
            ),
            ScheduleError::DuplicatePlayerName(name) => {
                write!(f, "A player named '{}' already exists", name)
            }
            ScheduleError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ScheduleError::TooManyGames {
                games_per_player,
                total_rounds,
            } => write!(
                f,
                "{} games per player do not fit in {} rounds",
                games_per_player, total_rounds
            ),
            ScheduleError::StreakCapTooLow {
                games,
                rests,
                max_consecutive_active_rounds,
            } => write!(
                f,
                "{} games with {} rests need max_consecutive_active_rounds of at least {} (got {})",
                games,
                rests,
                games.div_ceil(rests + 1),
                max_consecutive_active_rounds
            ),
            ScheduleError::InvalidRoster { line, message } => {
                write!(f, "Roster line {}: {}", line, message)
            }
            ScheduleError::LoneGender(g) => write!(
                f,
                "Only one {} player: disable gender balancing to schedule this group",
                g
            ),
            ScheduleError::PairedGender {
                gender,
                games_per_player,
                max_opponent_frequency,
            } => write!(
                f,
                "The two {} players face each other in every game: raise the opponent limit from {} to at least {}",
                gender, max_opponent_frequency, games_per_player
            ),
            ScheduleError::SearchExhausted { attempts } => write!(
                f,
                "Could not satisfy constraints after {} attempts; relax the settings and retry",
                attempts
            ),
            ScheduleError::TimeLimitExceeded => {
                write!(f, "Time limit reached before a schedule was found")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}
