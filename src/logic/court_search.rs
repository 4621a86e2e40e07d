//! Court assignment for a single round.
//!
//! Depth-first search over courts: pick a legal composition mode, scan team 1 then team 2,
//! record the court in the ledger and recurse. A failed branch restores the ledger snapshot
//! taken before the court. Each retry reshuffles the active players and is bounded by a
//! step budget; a search that runs out of candidates without hitting the budget proves the
//! round infeasible.

use crate::logic::ledger::{FairnessLedger, Seat};
use crate::models::{CourtMode, Side};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;

/// Balance and fairness limits for one attempt. Slices are indexed by seat.
pub(crate) struct CourtRules<'a> {
    pub female: &'a [bool],
    /// Adjusted ratings.
    pub ratings: &'a [f64],
    pub gender_balance: bool,
    pub match_balance_threshold: f64,
    pub teammate_rating_cap: f64,
    pub max_opponent_frequency: u32,
    pub min_expected_wins: u32,
}

/// Retry limits for one round.
pub(crate) struct RoundLimits {
    pub max_retries: u32,
    pub max_steps: u64,
    pub deadline: Option<Instant>,
}

/// A court found by the search, in seats.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SeatCourt {
    pub mode: CourtMode,
    pub team_1: [Seat; 2],
    pub team_2: [Seat; 2],
    pub team_1_rating: f64,
    pub team_2_rating: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RoundFailure {
    /// Every candidate was examined: no assignment exists for this round.
    Infeasible,
    /// All retries hit the step budget.
    RetriesExhausted,
    TimedOut,
}

impl std::fmt::Display for RoundFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundFailure::Infeasible => write!(f, "no valid court assignment"),
            RoundFailure::RetriesExhausted => write!(f, "retry budget exhausted"),
            RoundFailure::TimedOut => write!(f, "time limit reached"),
        }
    }
}

/// Players not yet placed on a court this round.
#[derive(Clone, Debug, Default)]
struct Pool {
    female: Vec<Seat>,
    male: Vec<Seat>,
    /// Everyone, when gender is ignored.
    open: Vec<Seat>,
}

impl Pool {
    fn new(active: &[Seat], rules: &CourtRules) -> Self {
        let mut pool = Pool::default();
        for &s in active {
            if !rules.gender_balance {
                pool.open.push(s);
            } else if rules.female[s] {
                pool.female.push(s);
            } else {
                pool.male.push(s);
            }
        }
        pool
    }

    fn without(&self, team: &[Seat; 2]) -> Self {
        let keep = |v: &Vec<Seat>| -> Vec<Seat> { v.iter().copied().filter(|s| !team.contains(s)).collect() };
        Pool {
            female: keep(&self.female),
            male: keep(&self.male),
            open: keep(&self.open),
        }
    }

    /// Modes that can still be filled. Courts are unordered, so the court holding the
    /// first remaining female is always placed before any all-male court.
    fn legal_modes(&self, gender_balance: bool) -> Vec<CourtMode> {
        if !gender_balance {
            return if self.open.len() >= 4 {
                vec![CourtMode::Open]
            } else {
                Vec::new()
            };
        }
        let (f, m) = (self.female.len(), self.male.len());
        let mut modes = Vec::new();
        if f >= 2 && m >= 2 {
            modes.push(CourtMode::Mixed);
        }
        if f >= 4 {
            modes.push(CourtMode::AllFemale);
        }
        if f == 0 && m >= 4 {
            modes.push(CourtMode::AllMale);
        }
        modes
    }

    /// Candidate teams for `mode`. Anchored candidates all contain the first player of the
    /// mode's pool, which removes team-order and court-order duplicates.
    fn teams(&self, mode: CourtMode, anchored: bool) -> Vec<[Seat; 2]> {
        match mode {
            CourtMode::Mixed => {
                let females: &[Seat] = if anchored {
                    &self.female[..self.female.len().min(1)]
                } else {
                    &self.female
                };
                females
                    .iter()
                    .flat_map(|&f| self.male.iter().map(move |&m| [f, m]))
                    .collect()
            }
            CourtMode::AllFemale => pairs_of(&self.female, anchored),
            CourtMode::AllMale => pairs_of(&self.male, anchored),
            CourtMode::Open => pairs_of(&self.open, anchored),
        }
    }
}

fn pairs_of(seats: &[Seat], anchored: bool) -> Vec<[Seat; 2]> {
    let firsts = if anchored { seats.len().min(1) } else { seats.len() };
    (0..firsts)
        .flat_map(|i| (i + 1..seats.len()).map(move |j| [seats[i], seats[j]]))
        .collect()
}

fn average(ratings: &[f64], team: [Seat; 2]) -> f64 {
    (ratings[team[0]] + ratings[team[1]]) / 2.0
}

struct Search<'a, 'r, R: Rng> {
    rules: &'a CourtRules<'a>,
    rng: &'r mut R,
    steps_left: u64,
    truncated: bool,
}

impl<'a, 'r, R: Rng> Search<'a, 'r, R> {
    fn step(&mut self) -> bool {
        if self.steps_left == 0 {
            self.truncated = true;
            return false;
        }
        self.steps_left -= 1;
        true
    }

    fn team_ok(&self, team: [Seat; 2], ledger: &FairnessLedger) -> bool {
        let r = self.rules.ratings;
        !ledger.has_partnered(team[0], team[1])
            && (r[team[0]] - r[team[1]]).abs() <= self.rules.teammate_rating_cap
    }

    fn match_ok(&self, team_1: [Seat; 2], team_2: [Seat; 2], ledger: &FairnessLedger) -> bool {
        let avg_1 = average(self.rules.ratings, team_1);
        let avg_2 = average(self.rules.ratings, team_2);
        if (avg_1 - avg_2).abs() > self.rules.match_balance_threshold {
            return false;
        }
        if !ledger.opponents_within(team_1, team_2, self.rules.max_opponent_frequency) {
            return false;
        }
        // The underdog loses this court's chance to be favoured; it must still be able to
        // reach the minimum with the games it has left.
        let underdog = match Side::favored(avg_1, avg_2) {
            Some(Side::One) => Some(team_2),
            Some(Side::Two) => Some(team_1),
            None => None,
        };
        underdog.map_or(true, |team| {
            team.iter().all(|&s| {
                ledger.expected_wins(s) + ledger.remaining_games(s).saturating_sub(1)
                    >= self.rules.min_expected_wins
            })
        })
    }

    /// Fill `courts_left` courts from `pool`. On failure `ledger` and `out` are unchanged.
    fn fill(
        &mut self,
        pool: &Pool,
        courts_left: usize,
        ledger: &mut FairnessLedger,
        out: &mut Vec<SeatCourt>,
    ) -> bool {
        if courts_left == 0 {
            return true;
        }
        let mut modes = pool.legal_modes(self.rules.gender_balance);
        modes.shuffle(&mut *self.rng);

        for mode in modes {
            for team_1 in pool.teams(mode, true) {
                if !self.step() {
                    return false;
                }
                if !self.team_ok(team_1, ledger) {
                    continue;
                }
                let rest = pool.without(&team_1);
                for team_2 in rest.teams(mode, false) {
                    if !self.step() {
                        return false;
                    }
                    if !self.team_ok(team_2, ledger) || !self.match_ok(team_1, team_2, ledger) {
                        continue;
                    }
                    let court = SeatCourt {
                        mode,
                        team_1,
                        team_2,
                        team_1_rating: average(self.rules.ratings, team_1),
                        team_2_rating: average(self.rules.ratings, team_2),
                    };
                    let snapshot = ledger.clone();
                    ledger.record_court(
                        team_1,
                        team_2,
                        Side::favored(court.team_1_rating, court.team_2_rating),
                    );
                    out.push(court);
                    if self.fill(&rest.without(&team_2), courts_left - 1, ledger, out) {
                        return true;
                    }
                    out.pop();
                    *ledger = snapshot;
                    if self.truncated {
                        return false;
                    }
                }
            }
        }
        false
    }
}

/// Assign `active` seats to `court_count` courts, updating `ledger` on success.
///
/// On failure the ledger is left as it was at the start of the round.
pub(crate) fn assign_round<R: Rng>(
    active: &[Seat],
    court_count: usize,
    ledger: &mut FairnessLedger,
    rules: &CourtRules,
    limits: &RoundLimits,
    rng: &mut R,
) -> Result<Vec<SeatCourt>, RoundFailure> {
    let round_start = ledger.clone();
    let mut order = active.to_vec();
    for _ in 0..limits.max_retries {
        if limits.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RoundFailure::TimedOut);
        }
        order.shuffle(rng);
        let pool = Pool::new(&order, rules);
        let mut search = Search {
            rules,
            rng: &mut *rng,
            steps_left: limits.max_steps,
            truncated: false,
        };
        let mut courts = Vec::with_capacity(court_count);
        if search.fill(&pool, court_count, ledger, &mut courts) {
            return Ok(courts);
        }
        *ledger = round_start.clone();
        if !search.truncated {
            return Err(RoundFailure::Infeasible);
        }
    }
    Err(RoundFailure::RetriesExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn limits() -> RoundLimits {
        RoundLimits {
            max_retries: 100,
            max_steps: 5_000,
            deadline: None,
        }
    }

    fn rules<'a>(female: &'a [bool], ratings: &'a [f64], gender_balance: bool) -> CourtRules<'a> {
        CourtRules {
            female,
            ratings,
            gender_balance,
            match_balance_threshold: 100.0,
            teammate_rating_cap: 300.0,
            max_opponent_frequency: 2,
            min_expected_wins: 0,
        }
    }

    #[test]
    fn pairs_of_anchored_keeps_first_seat() {
        assert_eq!(pairs_of(&[4, 7, 9], true), vec![[4, 7], [4, 9]]);
        assert_eq!(pairs_of(&[4, 7, 9], false).len(), 3);
        assert!(pairs_of(&[4], true).is_empty());
    }

    #[test]
    fn legal_modes_follow_pool_counts() {
        let female = [true, true, false, false, false, false];
        let ratings = [1500.0; 6];
        let r = rules(&female, &ratings, true);
        let pool = Pool::new(&[0, 1, 2, 3, 4, 5], &r);
        assert_eq!(pool.legal_modes(true), vec![CourtMode::Mixed]);
        let males_only = pool.without(&[0, 1]);
        assert_eq!(males_only.legal_modes(true), vec![CourtMode::AllMale]);

        let open = Pool::new(&[0, 1, 2, 3], &rules(&female, &ratings, false));
        assert_eq!(open.legal_modes(false), vec![CourtMode::Open]);
    }

    #[test]
    fn mixed_round_uses_one_female_per_team() {
        let female = [true, true, true, true, false, false, false, false];
        let ratings = [1500.0, 1520.0, 1540.0, 1560.0, 1500.0, 1520.0, 1540.0, 1560.0];
        let r = rules(&female, &ratings, true);
        let mut ledger = FairnessLedger::new(vec![4; 8]);
        let mut rng = StdRng::seed_from_u64(3);
        let active: Vec<Seat> = (0..8).collect();
        let courts = assign_round(&active, 2, &mut ledger, &r, &limits(), &mut rng).expect("round");

        assert_eq!(courts.len(), 2);
        let mut seen = HashSet::new();
        for c in &courts {
            for s in c.team_1.iter().chain(c.team_2.iter()) {
                assert!(seen.insert(*s), "seat {s} placed twice");
            }
            let females = |t: [Seat; 2]| t.iter().filter(|&&s| female[s]).count();
            match c.mode {
                CourtMode::Mixed => {
                    assert_eq!(females(c.team_1), 1);
                    assert_eq!(females(c.team_2), 1);
                }
                CourtMode::AllFemale => assert_eq!(females(c.team_1) + females(c.team_2), 4),
                CourtMode::AllMale => assert_eq!(females(c.team_1) + females(c.team_2), 0),
                CourtMode::Open => panic!("open court with gender balancing"),
            }
            assert!(ledger.has_partnered(c.team_1[0], c.team_1[1]));
            assert_eq!(ledger.remaining_games(c.team_2[0]), 3);
        }
    }

    #[test]
    fn exhausted_partners_make_round_infeasible() {
        let female = [false; 4];
        let ratings = [1500.0; 4];
        let r = rules(&female, &ratings, false);
        let mut ledger = FairnessLedger::new(vec![4; 4]);
        ledger.record_court([0, 1], [2, 3], None);
        ledger.record_court([0, 2], [1, 3], None);
        ledger.record_court([0, 3], [1, 2], None);
        let before = ledger.clone();
        let mut rng = StdRng::seed_from_u64(5);
        let result = assign_round(&[0, 1, 2, 3], 1, &mut ledger, &r, &limits(), &mut rng);
        assert_eq!(result, Err(RoundFailure::Infeasible));
        assert_eq!(ledger.remaining_games(0), before.remaining_games(0));
    }

    #[test]
    fn rating_limits_are_respected() {
        let female = [false; 4];
        let ratings = [1000.0, 1900.0, 1010.0, 1890.0];
        let mut r = rules(&female, &ratings, false);
        r.teammate_rating_cap = 1000.0;
        r.match_balance_threshold = 20.0;
        let mut ledger = FairnessLedger::new(vec![1; 4]);
        let mut rng = StdRng::seed_from_u64(9);
        let courts = assign_round(&[0, 1, 2, 3], 1, &mut ledger, &r, &limits(), &mut rng).expect("round");
        let c = &courts[0];
        assert!((c.team_1_rating - c.team_2_rating).abs() <= 20.0);

        r.teammate_rating_cap = 50.0;
        let mut ledger = FairnessLedger::new(vec![1; 4]);
        let result = assign_round(&[0, 1, 2, 3], 1, &mut ledger, &r, &limits(), &mut rng);
        assert_eq!(result, Err(RoundFailure::Infeasible));
    }

    #[test]
    fn expected_win_floor_rejects_hopeless_underdogs() {
        let female = [false; 4];
        let ratings = [1500.0, 1600.0, 1700.0, 1850.0];
        let mut r = rules(&female, &ratings, false);
        r.match_balance_threshold = 1_000.0;
        r.min_expected_wins = 1;
        // Last game for everyone and no split is level: every underdog misses the floor.
        let mut ledger = FairnessLedger::new(vec![1; 4]);
        let mut rng = StdRng::seed_from_u64(2);
        let result = assign_round(&[0, 1, 2, 3], 1, &mut ledger, &r, &limits(), &mut rng);
        assert_eq!(result, Err(RoundFailure::Infeasible));

        // 1500+1800 against 1600+1700 is level, so nobody is the underdog.
        let level = [1500.0, 1600.0, 1700.0, 1800.0];
        let mut r = rules(&female, &level, false);
        r.match_balance_threshold = 0.0;
        r.min_expected_wins = 1;
        let mut ledger = FairnessLedger::new(vec![1; 4]);
        let courts = assign_round(&[0, 1, 2, 3], 1, &mut ledger, &r, &limits(), &mut rng).expect("round");
        assert_eq!(
            Side::favored(courts[0].team_1_rating, courts[0].team_2_rating),
            None
        );
    }
}
