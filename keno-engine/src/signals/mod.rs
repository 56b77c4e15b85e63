pub mod frequency;
pub mod recency;
pub mod hot_cold;
pub mod pattern;
pub mod streak;

use chrono::{Duration, TimeZone, Utc};
use keno_db::models::{Draw, NumberStats, POOL_SIZE};

/// One heuristic view of the draw history.
pub trait Signal: Send + Sync {
    fn name(&self) -> &str;
    /// history[0] = most recent draw. Returns one sub-score per number (index 0 = number 1), each in [0, 1].
    fn score(&self, history: &[Draw], stats: &NumberStats) -> Vec<f64>;
}

pub fn validate_sub_scores(scores: &[f64]) -> bool {
    scores.len() == POOL_SIZE && scores.iter().all(|&s| (0.0..=1.0).contains(&s))
}

/// The five signals with their fixed blend weights.
pub fn default_signals() -> Vec<(Box<dyn Signal>, f64)> {
    vec![
        (Box::new(frequency::FrequencySignal), 0.25),
        (Box::new(recency::RecencySignal::default()), 0.30),
        (Box::new(hot_cold::HotColdSignal::default()), 0.20),
        (Box::new(pattern::PatternSignal), 0.15),
        (Box::new(streak::StreakSignal), 0.10),
    ]
}

/// `n` distinct synthetic draws, most recent first, 90 seconds apart.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default();
    (0..n)
        .map(|i| {
            let numbers: Vec<u8> = (0..20)
                .map(|k| ((i * 7 + k * 4) % POOL_SIZE) as u8 + 1)
                .collect();
            let drawn_at = start + Duration::seconds(90 * (n - i) as i64);
            Draw::new(format!("{:04}", n - i), drawn_at, &numbers)
                .unwrap_or_else(|e| panic!("synthetic draw {i} invalid: {e}"))
        })
        .collect()
}
