//! Shared helpers for the integration tests.

#![allow(dead_code)]

use doubles_scheduler::{CourtMode, Gender, Player, Schedule, ScheduleConfig, SearchBudget};
use std::collections::{HashMap, HashSet};

/// `females` women then `males` men, ratings rising by `step` from `base`.
pub fn group(females: usize, males: usize, base: f64, step: f64) -> Vec<Player> {
    let f = (0..females).map(|i| Player::new(format!("F{i}"), base + step * i as f64, Gender::Female));
    let m = (0..males).map(|i| Player::new(format!("M{i}"), base + step * i as f64, Gender::Male));
    f.chain(m).collect()
}

/// Generous limits: only partnerships, gender and rest rules bind.
pub fn relaxed_config(court_count: usize, games_per_player: usize) -> ScheduleConfig {
    ScheduleConfig {
        court_count,
        games_per_player,
        match_balance_threshold: 150.0,
        teammate_rating_cap: 200.0,
        max_opponent_frequency: 4,
        max_consecutive_active_rounds: 4,
        seed: Some(20240601),
        budget: SearchBudget {
            max_attempts: 50,
            ..SearchBudget::default()
        },
        ..ScheduleConfig::default()
    }
}

fn key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Check every schedule invariant directly, independent of the library's validator.
pub fn assert_invariants(schedule: &Schedule, players: &[Player], config: &ScheduleConfig) {
    let plan = &schedule.plan;
    assert_eq!(schedule.rounds.len(), plan.total_rounds());

    let by_name: HashMap<&str, &Player> = players.iter().map(|p| (p.name.as_str(), p)).collect();
    let rating = |n: &str| by_name[n].adjusted_rating(config.ignore_gender_balance, config.female_rating_offset);
    let female = |n: &str| by_name[n].gender == Gender::Female;

    let mut games: HashMap<String, usize> = HashMap::new();
    let mut rests: HashMap<String, usize> = HashMap::new();
    let mut streak: HashMap<String, usize> = HashMap::new();
    let mut partners = HashSet::new();
    let mut opponents: HashMap<(String, String), u32> = HashMap::new();

    for (i, round) in schedule.rounds.iter().enumerate() {
        assert_eq!(round.courts.len(), plan.courts_per_round[i], "round {}", round.number);

        let mut seen = HashSet::new();
        for name in round.resting.iter().chain(round.courts.iter().flat_map(|c| c.players())) {
            assert!(seen.insert(name.clone()), "{name} twice in round {}", round.number);
        }
        assert_eq!(seen.len(), players.len(), "round {}", round.number);

        for name in &round.resting {
            *rests.entry(name.clone()).or_default() += 1;
            streak.insert(name.clone(), 0);
        }
        for court in &round.courts {
            for name in court.players() {
                *games.entry(name.clone()).or_default() += 1;
                let s = streak.entry(name.clone()).or_default();
                *s += 1;
                assert!(*s <= config.max_consecutive_active_rounds, "{name} streak {s}");
            }
            for team in [&court.team_1, &court.team_2] {
                assert!(partners.insert(key(&team[0], &team[1])), "repeat partners {team:?}");
                assert!((rating(&team[0]) - rating(&team[1])).abs() <= config.teammate_rating_cap);
            }
            for a in &court.team_1 {
                for b in &court.team_2 {
                    let c = opponents.entry(key(a, b)).or_default();
                    *c += 1;
                    assert!(*c <= config.max_opponent_frequency, "{a} vs {b} {c} times");
                }
            }
            let avg = |t: &[String; 2]| (rating(&t[0]) + rating(&t[1])) / 2.0;
            assert!((avg(&court.team_1) - avg(&court.team_2)).abs() <= config.match_balance_threshold);

            let f = |t: &[String; 2]| t.iter().filter(|n| female(n)).count();
            let (f1, f2) = (f(&court.team_1), f(&court.team_2));
            if config.ignore_gender_balance {
                assert_eq!(court.mode, CourtMode::Open);
            } else {
                match court.mode {
                    CourtMode::Mixed => assert!(f1 == 1 && f2 == 1),
                    CourtMode::AllFemale => assert!(f1 == 2 && f2 == 2),
                    CourtMode::AllMale => assert!(f1 == 0 && f2 == 0),
                    CourtMode::Open => panic!("open court with gender balancing"),
                }
            }
        }
    }

    let total_rounds = schedule.rounds.len();
    let mut extra = 0;
    for p in players {
        let g = games.get(&p.name).copied().unwrap_or(0);
        let r = rests.get(&p.name).copied().unwrap_or(0);
        if g == plan.games_per_player + 1 {
            extra += 1;
        } else {
            assert_eq!(g, plan.games_per_player, "{} games", p.name);
        }
        assert_eq!(r, total_rounds - g, "{} rests", p.name);
    }
    assert_eq!(extra, plan.extra_games);
}
