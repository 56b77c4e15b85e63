pub mod confidence;

use keno_db::models::{Draw, NumberStats, POOL_SIZE};
use serde::Serialize;

use crate::signals::{Signal, default_signals};

/// Below this many draws every number gets the same score.
pub const MIN_SCORING_HISTORY: usize = 3;
/// No number's blended score goes below this before normalization.
pub const SCORE_FLOOR: f64 = 0.001;

/// Normalized score per number. Sums to 1.0, every value strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreVector {
    values: Vec<f64>,
}

impl ScoreVector {
    pub fn uniform() -> Self {
        Self {
            values: vec![1.0 / POOL_SIZE as f64; POOL_SIZE],
        }
    }

    /// Floors each raw value then normalizes.
    fn from_raw(raw: Vec<f64>) -> Self {
        let mut values: Vec<f64> = raw.into_iter().map(|v| v.max(SCORE_FLOOR)).collect();
        let total: f64 = values.iter().sum();
        for v in &mut values {
            *v /= total;
        }
        Self { values }
    }

    /// `None` outside 1..=80.
    pub fn get(&self, number: u8) -> Option<f64> {
        let index = usize::from(number).checked_sub(1)?;
        self.values.get(index).copied()
    }

    /// Index 0 = number 1.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| ((i + 1) as u8, v))
    }

    /// Highest score first; equal scores by ascending number.
    pub fn ranked(&self) -> Vec<(u8, f64)> {
        let mut ranked: Vec<(u8, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked
    }

    /// Sum of the `k` best scores.
    pub fn top_mass(&self, k: usize) -> f64 {
        self.ranked().iter().take(k).map(|(_, s)| s).sum()
    }
}

/// Per-signal sub-scores behind a [`ScoreVector`].
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub scores: ScoreVector,
    pub components: Vec<SignalComponent>,
}

#[derive(Debug, Clone)]
pub struct SignalComponent {
    pub name: String,
    pub weight: f64,
    pub sub_scores: Vec<f64>,
}

/// Weighted blend of signals.
pub struct ScoringEngine {
    signals: Vec<(Box<dyn Signal>, f64)>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(default_signals())
    }
}

impl ScoringEngine {
    pub fn new(signals: Vec<(Box<dyn Signal>, f64)>) -> Self {
        Self { signals }
    }

    pub fn signals(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.signals.iter().map(|(s, w)| (s.name(), *w))
    }

    /// history[0] = most recent draw.
    pub fn compute_scores(&self, history: &[Draw], stats: &NumberStats) -> ScoreVector {
        self.breakdown(history, stats).scores
    }

    pub fn breakdown(&self, history: &[Draw], stats: &NumberStats) -> ScoreBreakdown {
        if history.len() < MIN_SCORING_HISTORY {
            return ScoreBreakdown {
                scores: ScoreVector::uniform(),
                components: Vec::new(),
            };
        }

        let mut combined = vec![0.0f64; POOL_SIZE];
        let mut components = Vec::with_capacity(self.signals.len());

        for (signal, weight) in &self.signals {
            let sub_scores = signal.score(history, stats);
            for (c, s) in combined.iter_mut().zip(&sub_scores) {
                *c += weight * s;
            }
            components.push(SignalComponent {
                name: signal.name().to_string(),
                weight: *weight,
                sub_scores,
            });
        }

        ScoreBreakdown {
            scores: ScoreVector::from_raw(combined),
            components,
        }
    }
}

/// Scores with the default five-signal blend.
pub fn compute_scores(history: &[Draw], stats: &NumberStats) -> ScoreVector {
    ScoringEngine::default().compute_scores(history, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::make_test_draws;
    use keno_db::models::{apply_draw, empty_stats};

    fn stats_for(history: &[Draw]) -> NumberStats {
        let mut stats = empty_stats();
        for draw in history.iter().rev() {
            apply_draw(&mut stats, draw);
        }
        stats
    }

    fn assert_distribution(scores: &ScoreVector) {
        assert_eq!(scores.values().len(), 80);
        assert!(scores.values().iter().all(|&v| v > 0.0));
        let sum: f64 = scores.values().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "Sum = {}", sum);
    }

    #[test]
    fn test_short_history_is_uniform() {
        for n in 0..3 {
            let draws = make_test_draws(n);
            let scores = compute_scores(&draws, &stats_for(&draws));
            for &v in scores.values() {
                assert!((v - 1.0 / 80.0).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_scores_form_distribution() {
        for n in [3, 5, 10, 25, 60] {
            let draws = make_test_draws(n);
            let scores = compute_scores(&draws, &stats_for(&draws));
            assert_distribution(&scores);
        }
    }

    #[test]
    fn test_scores_are_repeatable() {
        let draws = make_test_draws(20);
        let stats = stats_for(&draws);
        let a = compute_scores(&draws, &stats);
        let b = compute_scores(&draws, &stats);
        let bits_a: Vec<u64> = a.values().iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u64> = b.values().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn test_identical_draws_favor_drawn_numbers() {
        let draw = make_test_draws(1).remove(0);
        let draws = vec![draw.clone(); 10];
        let engine = ScoringEngine::default();
        let breakdown = engine.breakdown(&draws, &empty_stats());

        let frequency = &breakdown.components[0];
        assert_eq!(frequency.name, "Frequency");
        for n in 1..=80u8 {
            let expected = if draw.contains(n) { 1.0 } else { 0.0 };
            assert_eq!(frequency.sub_scores[(n - 1) as usize], expected);
        }

        let top14: Vec<u8> = breakdown.scores.ranked().iter().take(14).map(|(n, _)| *n).collect();
        assert!(top14.iter().all(|&n| draw.contains(n)), "{:?}", top14);
    }

    #[test]
    fn test_floor_applies_to_zero_blend() {
        struct Zero;
        impl Signal for Zero {
            fn name(&self) -> &str {
                "Zero"
            }
            fn score(&self, _: &[Draw], _: &NumberStats) -> Vec<f64> {
                vec![0.0; POOL_SIZE]
            }
        }
        let engine = ScoringEngine::new(vec![(Box::new(Zero), 1.0)]);
        let draws = make_test_draws(5);
        let scores = engine.compute_scores(&draws, &empty_stats());
        assert_distribution(&scores);
        assert!((scores.get(40).unwrap() - 1.0 / 80.0).abs() < 1e-15);
    }

    #[test]
    fn test_get_outside_pool() {
        let scores = ScoreVector::uniform();
        assert_eq!(scores.get(0), None);
        assert_eq!(scores.get(81), None);
        assert_eq!(scores.get(1), Some(1.0 / 80.0));
        assert_eq!(scores.get(80), Some(1.0 / 80.0));
    }

    #[test]
    fn test_ranked_ties_by_number() {
        let ranked = ScoreVector::uniform().ranked();
        let numbers: Vec<u8> = ranked.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, (1..=80).collect::<Vec<u8>>());
    }

    #[test]
    fn test_top_mass() {
        let uniform = ScoreVector::uniform();
        assert!((uniform.top_mass(10) - 10.0 / 80.0).abs() < 1e-12);
        assert!((uniform.top_mass(80) - 1.0).abs() < 1e-12);
    }
}
