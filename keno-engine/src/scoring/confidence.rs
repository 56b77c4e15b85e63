use std::fmt;

use keno_db::models::Draw;
use serde::Serialize;

use super::ScoreVector;
use crate::signals::pattern::DrawPattern;

pub const MAX_CONFIDENCE: f64 = 0.95;
/// Confidence reported when the history is too short for the weighted formula.
pub const SHORT_HISTORY_CONFIDENCE: f64 = 0.3;
pub const MIN_CONFIDENCE_HISTORY: usize = 10;
/// History length at which data confidence saturates.
const FULL_DATA_HISTORY: f64 = 50.0;
const TOP_MASS_COUNT: usize = 10;
const MAX_PATTERN_PAIRS: usize = 5;

/// `0.4 * data + 0.4 * top-10 mass + 0.2 * pattern consistency`, capped at 0.95, rounded to 3 decimals.
pub fn confidence(history: &[Draw], scores: &ScoreVector) -> f64 {
    if history.len() < MIN_CONFIDENCE_HISTORY {
        return SHORT_HISTORY_CONFIDENCE;
    }

    let data = (history.len() as f64 / FULL_DATA_HISTORY).min(1.0);
    let mass = scores.top_mass(TOP_MASS_COUNT);
    let pattern = pattern_consistency(history);

    let blended = (data * 0.4 + mass * 0.4 + pattern * 0.2).min(MAX_CONFIDENCE);
    round3(blended.max(0.0))
}

/// Fraction of the first consecutive draw pairs whose last-digit sets are identical.
pub fn pattern_consistency(history: &[Draw]) -> f64 {
    if history.len() < 5 {
        return 0.5;
    }

    let pairs = MAX_PATTERN_PAIRS.min(history.len() - 1);
    let changes = history
        .windows(2)
        .take(pairs)
        .filter(|pair| {
            DrawPattern::analyze(&pair[0].numbers).endings
                != DrawPattern::analyze(&pair[1].numbers).endings
        })
        .count();

    1.0 - changes as f64 / pairs as f64
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Good,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::High
        } else if confidence >= 0.6 {
            ConfidenceLevel::Good
        } else if confidence >= 0.4 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "HIGH CONFIDENCE"),
            ConfidenceLevel::Good => write!(f, "GOOD CONFIDENCE"),
            ConfidenceLevel::Moderate => write!(f, "MODERATE CONFIDENCE"),
            ConfidenceLevel::Low => write!(f, "LOW CONFIDENCE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::compute_scores;
    use crate::signals::make_test_draws;
    use keno_db::models::empty_stats;

    #[test]
    fn test_short_history_fixed() {
        for n in 0..10 {
            let draws = make_test_draws(n);
            let scores = compute_scores(&draws, &empty_stats());
            assert_eq!(confidence(&draws, &scores), SHORT_HISTORY_CONFIDENCE);
        }
    }

    #[test]
    fn test_confidence_bounds() {
        for n in [10, 11, 30, 50, 100] {
            let draws = make_test_draws(n);
            let scores = compute_scores(&draws, &empty_stats());
            let c = confidence(&draws, &scores);
            assert!((0.0..=MAX_CONFIDENCE).contains(&c), "{} draws -> {}", n, c);
        }
    }

    #[test]
    fn test_confidence_formula() {
        let draws = make_test_draws(25);
        let scores = compute_scores(&draws, &empty_stats());
        let expected = 0.5 * 0.4 + scores.top_mass(10) * 0.4 + pattern_consistency(&draws) * 0.2;
        let c = confidence(&draws, &scores);
        assert!((c - expected).abs() <= 0.0005 + 1e-12, "c={} expected={}", c, expected);
    }

    #[test]
    fn test_identical_draws_are_consistent() {
        let draw = make_test_draws(1).remove(0);
        let draws = vec![draw; 12];
        assert_eq!(pattern_consistency(&draws), 1.0);
    }

    #[test]
    fn test_consistency_counts_changes() {
        // synthetic draws alternate between odd-only and even-only numbers
        let draws = make_test_draws(12);
        assert_eq!(pattern_consistency(&draws), 0.0);
        assert_eq!(pattern_consistency(&draws[..4]), 0.5);
    }

    #[test]
    fn test_capped_at_max() {
        let draw = make_test_draws(1).remove(0);
        let draws = vec![draw; 60];
        let mut raw = vec![0.0; 80];
        for v in raw.iter_mut().take(10) {
            *v = 1000.0;
        }
        // data = 1.0, pattern = 1.0, top-10 mass close to 1.0
        let scores = ScoreVector::from_raw(raw);
        assert_eq!(confidence(&draws, &scores), MAX_CONFIDENCE);
    }

    #[test]
    fn test_levels() {
        assert_eq!(ConfidenceLevel::from_confidence(0.95), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.6), ConfidenceLevel::Good);
        assert_eq!(ConfidenceLevel::from_confidence(0.45), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_confidence(0.1), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::Moderate.to_string(), "MODERATE CONFIDENCE");
    }
}
