use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use keno_db::models::{Draw, NumberStats, apply_draw, empty_stats};
use keno_engine::prediction::{PredictionKind, generate_prediction};
use keno_engine::scoring::compute_scores;
use keno_engine::scoring::confidence::MAX_CONFIDENCE;
use proptest::prelude::*;
use proptest::sample::subsequence;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn draw_numbers() -> impl Strategy<Value = Vec<u8>> {
    subsequence((1..=80u8).collect::<Vec<u8>>(), 20)
}

/// Most recent first, one minute apart.
fn history(max_len: usize) -> impl Strategy<Value = Vec<Draw>> {
    prop::collection::vec(draw_numbers(), 0..max_len).prop_map(|sets| {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let len = sets.len();
        sets.into_iter()
            .enumerate()
            .map(|(i, numbers)| {
                let at = start + Duration::minutes((len - i) as i64);
                Draw::new(format!("d{}", len - i), at, &numbers).unwrap()
            })
            .collect()
    })
}

fn stats_for(history: &[Draw]) -> NumberStats {
    let mut stats = empty_stats();
    for draw in history.iter().rev() {
        apply_draw(&mut stats, draw);
    }
    stats
}

proptest! {
    #[test]
    fn scores_are_a_distribution(draws in history(40)) {
        let scores = compute_scores(&draws, &stats_for(&draws));
        prop_assert_eq!(scores.values().len(), 80);
        prop_assert!(scores.values().iter().all(|&v| v > 0.0));
        let sum: f64 = scores.values().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9, "sum = {}", sum);
    }

    #[test]
    fn scoring_is_repeatable(draws in history(30)) {
        let stats = stats_for(&draws);
        let a = compute_scores(&draws, &stats);
        let b = compute_scores(&draws, &stats);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prediction_picks_fourteen_distinct(draws in history(40), seed in any::<u64>()) {
        let total = draws.len() as u32;
        let result = generate_prediction(&draws, total, &stats_for(&draws), &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(result.very_high.len(), 4);
        prop_assert_eq!(result.high.len(), 10);
        let all: HashSet<u8> = result.very_high.iter().chain(&result.high).copied().collect();
        prop_assert_eq!(all.len(), 14);
        prop_assert!(all.iter().all(|n| (1..=80).contains(n)));
        prop_assert!((0.0..=MAX_CONFIDENCE).contains(&result.confidence));
    }

    #[test]
    fn low_total_falls_back(draws in history(5), seed in any::<u64>()) {
        let total = draws.len() as u32;
        let result = generate_prediction(&draws, total, &stats_for(&draws), &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(result.kind, PredictionKind::Fallback);
        prop_assert_eq!(result.confidence, 0.1);
    }

    #[test]
    fn short_history_has_fixed_confidence(draws in history(10), extra in 0u32..500) {
        let total = 5 + extra;
        let result = generate_prediction(&draws, total, &stats_for(&draws), &mut StdRng::seed_from_u64(0));
        prop_assert_eq!(result.kind, PredictionKind::Scored);
        prop_assert_eq!(result.confidence, 0.3);
    }
}
