use keno_db::models::{Draw, NumberStats, POOL_SIZE};

use super::Signal;

/// Appearances weighted by how recent the draw is, scaled so the best number scores 1.0.
///
/// The draw at position `i` (0 = most recent) of a history of length `N` weighs
/// `1.0 + (N - i) * step`.
pub struct RecencySignal {
    step: f64,
}

impl RecencySignal {
    pub fn new(step: f64) -> Self {
        Self { step }
    }
}

impl Default for RecencySignal {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Signal for RecencySignal {
    fn name(&self) -> &str {
        "Recency"
    }

    fn score(&self, history: &[Draw], _stats: &NumberStats) -> Vec<f64> {
        let mut scores = vec![0.0f64; POOL_SIZE];
        let total = history.len();

        for (i, draw) in history.iter().enumerate() {
            let weight = 1.0 + (total - i) as f64 * self.step;
            for &n in &draw.numbers {
                scores[(n - 1) as usize] += weight;
            }
        }

        let max = scores.iter().cloned().fold(0.0f64, f64::max);
        if max > 0.0 {
            for s in &mut scores {
                *s /= max;
            }
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::make_test_draws;
    use keno_db::models::empty_stats;

    #[test]
    fn test_recency_empty_is_zero() {
        let scores = RecencySignal::default().score(&[], &empty_stats());
        assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_recency_top_is_one() {
        let draws = make_test_draws(12);
        let scores = RecencySignal::default().score(&draws, &empty_stats());
        let max = scores.iter().cloned().fold(0.0f64, f64::max);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_recency_recent_higher() {
        let all = make_test_draws(2);
        // draws[0] = 1 + 2*0.1 = 1.2, draws[1] = 1 + 1*0.1 = 1.1
        let scores = RecencySignal::default().score(&all, &empty_stats());
        let only_recent = all[0].numbers.iter().find(|n| !all[1].contains(**n)).unwrap();
        let only_older = all[1].numbers.iter().find(|n| !all[0].contains(**n)).unwrap();
        let r = scores[(*only_recent - 1) as usize];
        let o = scores[(*only_older - 1) as usize];
        assert!(r > o, "recent={} older={}", r, o);
        assert!((o / r - 1.1 / 1.2).abs() < 1e-12);
    }
}
