//! Rest planning: who sits out in each round, decided once for the whole schedule.
//!
//! Backtracks round by round. Players are forced to rest when their active streak hits the
//! cap or when the remaining rounds can no longer absorb the rests they still owe. The rest
//! of the round's slots are filled from players still owing rest, trying each (females, males)
//! split that keeps the number of active females even.

use crate::logic::ledger::Seat;
use rand::seq::SliceRandom;
use rand::Rng;

/// Inputs for one attempt's rest plan. All slices are indexed by seat.
pub(crate) struct RestProblem<'a> {
    pub female: &'a [bool],
    /// Rests each seat must take over the schedule.
    pub rest_targets: &'a [usize],
    /// Players sitting out in each round.
    pub rest_slots: &'a [usize],
    pub max_consecutive_active: usize,
    /// Keep the active female count even (only with gender balancing).
    pub female_parity: bool,
}

#[derive(Clone, Debug)]
struct RestState {
    needed: Vec<usize>,
    streak: Vec<usize>,
    rounds: Vec<Vec<Seat>>,
}

struct StepBudget {
    left: u64,
}

impl StepBudget {
    fn take(&mut self) -> bool {
        if self.left == 0 {
            return false;
        }
        self.left -= 1;
        true
    }
}

/// Resting seats for every round, or None if no plan was found within `max_steps`.
pub(crate) fn plan_rests<R: Rng>(problem: &RestProblem, rng: &mut R, max_steps: u64) -> Option<Vec<Vec<Seat>>> {
    let state = RestState {
        needed: problem.rest_targets.to_vec(),
        streak: vec![0; problem.rest_targets.len()],
        rounds: Vec::with_capacity(problem.rest_slots.len()),
    };
    let mut budget = StepBudget { left: max_steps };
    plan_from(0, state, problem, rng, &mut budget).map(|s| s.rounds)
}

fn plan_from<R: Rng>(
    round: usize,
    state: RestState,
    problem: &RestProblem,
    rng: &mut R,
    budget: &mut StepBudget,
) -> Option<RestState> {
    let total_rounds = problem.rest_slots.len();
    if round == total_rounds {
        return state.needed.iter().all(|&n| n == 0).then_some(state);
    }
    let rounds_left = total_rounds - round;
    let slots = problem.rest_slots[round];
    let seats = state.needed.len();

    let forced: Vec<Seat> = (0..seats)
        .filter(|&s| {
            state.streak[s] >= problem.max_consecutive_active || state.needed[s] > rounds_left - 1
        })
        .collect();
    // Streak-capped but owes no rest: resting would overshoot the target.
    if forced.len() > slots || forced.iter().any(|&s| state.needed[s] == 0) {
        return None;
    }
    let open_slots = slots - forced.len();

    let mut candidates: Vec<(Seat, u32)> = (0..seats)
        .filter(|&s| state.needed[s] > 0 && !forced.contains(&s))
        .map(|s| (s, rng.gen::<u32>()))
        .collect();
    candidates.sort_by_key(|&(s, t)| (std::cmp::Reverse((state.needed[s], state.streak[s])), t));

    let is_female = |s: Seat| problem.female_parity && problem.female[s];
    let females: Vec<Seat> = candidates.iter().map(|&(s, _)| s).filter(|&s| is_female(s)).collect();
    let males: Vec<Seat> = candidates.iter().map(|&(s, _)| s).filter(|&s| !is_female(s)).collect();

    let mut splits = rest_splits(problem, &forced, open_slots, females.len(), males.len());
    splits.shuffle(rng);

    for (f, m) in splits {
        if !budget.take() {
            return None;
        }
        let mut resting = forced.clone();
        resting.extend_from_slice(&females[..f]);
        resting.extend_from_slice(&males[..m]);

        let mut next = state.clone();
        for s in 0..seats {
            if resting.contains(&s) {
                next.needed[s] -= 1;
                next.streak[s] = 0;
            } else {
                next.streak[s] += 1;
            }
        }
        resting.sort_unstable();
        next.rounds.push(resting);

        if let Some(done) = plan_from(round + 1, next, problem, rng, budget) {
            return Some(done);
        }
    }
    None
}

/// Every (extra females, extra males) split of `open_slots` that the candidate pools can
/// cover and that leaves an even number of active females.
fn rest_splits(
    problem: &RestProblem,
    forced: &[Seat],
    open_slots: usize,
    females_available: usize,
    males_available: usize,
) -> Vec<(usize, usize)> {
    let parity = if problem.female_parity {
        let females_total = problem.female.iter().filter(|&&f| f).count();
        let forced_females = forced.iter().filter(|&&s| problem.female[s]).count();
        Some((females_total - forced_females) % 2)
    } else {
        None
    };
    (0..=open_slots.min(females_available))
        .filter(|f| parity.map_or(true, |p| f % 2 == p))
        .map(|f| (f, open_slots - f))
        .filter(|&(_, m)| m <= males_available)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn check_plan(problem: &RestProblem, rounds: &[Vec<Seat>]) {
        assert_eq!(rounds.len(), problem.rest_slots.len());
        let seats = problem.rest_targets.len();
        let mut rests = vec![0; seats];
        let mut streak = vec![0; seats];
        for (r, resting) in rounds.iter().enumerate() {
            assert_eq!(resting.len(), problem.rest_slots[r]);
            let active_females = (0..seats)
                .filter(|s| problem.female[*s] && !resting.contains(s))
                .count();
            if problem.female_parity {
                assert_eq!(active_females % 2, 0, "round {r}");
            }
            for s in 0..seats {
                if resting.contains(&s) {
                    rests[s] += 1;
                    streak[s] = 0;
                } else {
                    streak[s] += 1;
                    assert!(streak[s] <= problem.max_consecutive_active);
                }
            }
        }
        assert_eq!(rests, problem.rest_targets);
    }

    #[test]
    fn splits_keep_active_females_even() {
        let female = [true, true, true, false, false, false];
        let problem = RestProblem {
            female: &female,
            rest_targets: &[1; 6],
            rest_slots: &[2],
            max_consecutive_active: 3,
            female_parity: true,
        };
        // 3 females, none forced: an odd number must rest.
        assert_eq!(rest_splits(&problem, &[], 2, 3, 3), vec![(1, 1)]);
        // One female already forced: only even extra counts.
        let mut splits = rest_splits(&problem, &[0], 2, 2, 3);
        splits.sort();
        assert_eq!(splits, vec![(0, 2), (2, 0)]);
    }

    #[test]
    fn splits_ignore_gender_without_parity() {
        let female = [true, false, false, false, false];
        let problem = RestProblem {
            female: &female,
            rest_targets: &[1; 5],
            rest_slots: &[1],
            max_consecutive_active: 4,
            female_parity: false,
        };
        assert_eq!(rest_splits(&problem, &[], 1, 0, 5), vec![(0, 1)]);
    }

    #[test]
    fn plans_ten_players_two_courts() {
        let female = [true, true, true, true, false, false, false, false, false, false];
        let problem = RestProblem {
            female: &female,
            rest_targets: &[1; 10],
            rest_slots: &[2; 5],
            max_consecutive_active: 4,
            female_parity: true,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let rounds = plan_rests(&problem, &mut rng, 10_000).expect("plan");
        check_plan(&problem, &rounds);
    }

    #[test]
    fn streak_cap_forces_spread_out_rests() {
        let female = [false; 6];
        let problem = RestProblem {
            female: &female,
            rest_targets: &[3; 6],
            rest_slots: &[2; 9],
            max_consecutive_active: 2,
            female_parity: false,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let rounds = plan_rests(&problem, &mut rng, 100_000).expect("plan");
        check_plan(&problem, &rounds);
    }

    #[test]
    fn odd_females_without_rests_is_infeasible() {
        let female = [true, true, true, false, false, false, false, false];
        let problem = RestProblem {
            female: &female,
            rest_targets: &[0; 8],
            rest_slots: &[0; 4],
            max_consecutive_active: 4,
            female_parity: true,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(plan_rests(&problem, &mut rng, 1_000).is_none());
    }

    #[test]
    fn streak_cap_below_round_count_without_rests_is_infeasible() {
        let female = [false; 4];
        let problem = RestProblem {
            female: &female,
            rest_targets: &[0; 4],
            rest_slots: &[0; 3],
            max_consecutive_active: 2,
            female_parity: false,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(plan_rests(&problem, &mut rng, 1_000).is_none());
    }
}
