use keno_db::models::{Draw, NumberStats, POOL_SIZE};

use super::Signal;

/// Share of the history's draws in which each number appeared.
pub struct FrequencySignal;

/// Used for every number when there is no history at all.
const EMPTY_HISTORY_SCORE: f64 = 0.01;

impl Signal for FrequencySignal {
    fn name(&self) -> &str {
        "Frequency"
    }

    fn score(&self, history: &[Draw], _stats: &NumberStats) -> Vec<f64> {
        if history.is_empty() {
            return vec![EMPTY_HISTORY_SCORE; POOL_SIZE];
        }

        let mut counts = vec![0u32; POOL_SIZE];
        for draw in history {
            for &n in &draw.numbers {
                counts[(n - 1) as usize] += 1;
            }
        }

        let total = history.len() as f64;
        counts.iter().map(|&c| c as f64 / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::make_test_draws;
    use keno_db::models::empty_stats;

    #[test]
    fn test_frequency_empty_history() {
        let scores = FrequencySignal.score(&[], &empty_stats());
        assert!(scores.iter().all(|&s| (s - 0.01).abs() < 1e-12));
    }

    #[test]
    fn test_frequency_identical_draws() {
        let draw = make_test_draws(1).remove(0);
        let draws = vec![draw; 10];
        let scores = FrequencySignal.score(&draws, &empty_stats());
        for n in 1..=80u8 {
            let expected = if draws[0].contains(n) { 1.0 } else { 0.0 };
            assert_eq!(scores[(n - 1) as usize], expected, "number {}", n);
        }
    }

    #[test]
    fn test_frequency_counts_share() {
        let draws = make_test_draws(4);
        let scores = FrequencySignal.score(&draws, &empty_stats());
        let appearances = draws.iter().filter(|d| d.contains(1)).count() as f64;
        assert!((scores[0] - appearances / 4.0).abs() < 1e-12);
        // 20 numbers per draw: shares sum to 20
        let sum: f64 = scores.iter().sum();
        assert!((sum - 20.0).abs() < 1e-9);
    }
}
