//! Run-scoped fairness counters shared by every round of one scheduling attempt.
//!
//! Players are referred to by their index in the attempt's shuffled order. The ledger is
//! cloned as a snapshot before each court is tried and restored on backtrack.

use crate::models::Side;
use std::collections::{HashMap, HashSet};

/// Index of a player in the attempt's player order.
pub(crate) type Seat = usize;

/// Unordered pair of seats, stored low-first.
pub(crate) type Pair = (Seat, Seat);

pub(crate) fn pair(a: Seat, b: Seat) -> Pair {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct FairnessLedger {
    partnerships: HashSet<Pair>,
    opponent_counts: HashMap<Pair, u32>,
    expected_wins: Vec<u32>,
    remaining_games: Vec<u32>,
}

impl FairnessLedger {
    /// Start an attempt where seat `i` still owes `remaining_games[i]` games.
    pub fn new(remaining_games: Vec<u32>) -> Self {
        Self {
            expected_wins: vec![0; remaining_games.len()],
            remaining_games,
            ..Self::default()
        }
    }

    pub fn has_partnered(&self, a: Seat, b: Seat) -> bool {
        self.partnerships.contains(&pair(a, b))
    }

    pub fn opponent_count(&self, a: Seat, b: Seat) -> u32 {
        self.opponent_counts.get(&pair(a, b)).copied().unwrap_or(0)
    }

    pub fn expected_wins(&self, seat: Seat) -> u32 {
        self.expected_wins[seat]
    }

    pub fn remaining_games(&self, seat: Seat) -> u32 {
        self.remaining_games[seat]
    }

    /// Would every pairing across the net stay within `max` meetings?
    pub fn opponents_within(&self, team_1: [Seat; 2], team_2: [Seat; 2], max: u32) -> bool {
        team_1
            .iter()
            .all(|&a| team_2.iter().all(|&b| self.opponent_count(a, b) < max))
    }

    /// Record a finished court: both partnerships, four opponent meetings, one game each,
    /// and an expected win for the favoured side.
    pub fn record_court(&mut self, team_1: [Seat; 2], team_2: [Seat; 2], favored: Option<Side>) {
        self.partnerships.insert(pair(team_1[0], team_1[1]));
        self.partnerships.insert(pair(team_2[0], team_2[1]));
        for &a in &team_1 {
            for &b in &team_2 {
                *self.opponent_counts.entry(pair(a, b)).or_insert(0) += 1;
            }
        }
        for &s in team_1.iter().chain(team_2.iter()) {
            self.remaining_games[s] = self.remaining_games[s].saturating_sub(1);
        }
        let winners = match favored {
            Some(Side::One) => Some(team_1),
            Some(Side::Two) => Some(team_2),
            None => None,
        };
        if let Some(team) = winners {
            for s in team {
                self.expected_wins[s] += 1;
            }
        }
    }
}
