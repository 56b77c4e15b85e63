use std::fmt;

use chrono::{DateTime, Utc};
use keno_db::models::{Draw, NumberStats, POOL_SIZE, PredictionRecord};
use rand::Rng;
use serde::Serialize;

use crate::sampler::{sample_distinct, sample_from};
use crate::scoring::confidence::{ConfidenceLevel, confidence};
use crate::scoring::{ScoreVector, ScoringEngine};

pub const VERY_HIGH_COUNT: usize = 4;
pub const HIGH_COUNT: usize = 10;
/// Below this many recorded draws the prediction is a random pick.
pub const MIN_TOTAL_DRAWS: u32 = 5;
pub const FALLBACK_CONFIDENCE: f64 = 0.1;
pub const ESTIMATION_CONFIDENCE: f64 = 0.15;
/// Last digits the estimation draws its first two picks from.
pub const FAVOURED_ENDINGS: [u8; 4] = [1, 3, 7, 9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    /// Ranked from the score vector.
    Scored,
    /// Random pick, not enough data yet.
    Fallback,
    /// Pattern-biased guess sent while data is still being collected.
    Estimation,
}

impl fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionKind::Scored => write!(f, "scored"),
            PredictionKind::Fallback => write!(f, "fallback"),
            PredictionKind::Estimation => write!(f, "estimation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub kind: PredictionKind,
    pub very_high: Vec<u8>,
    pub high: Vec<u8>,
    pub confidence: f64,
    pub level: ConfidenceLevel,
    pub total_draws: u32,
    pub recent_draws: usize,
}

impl PredictionResult {
    pub fn to_record(&self, created_at: DateTime<Utc>) -> PredictionRecord {
        PredictionRecord {
            created_at,
            kind: self.kind.to_string(),
            very_high: self.very_high.clone(),
            high: self.high.clone(),
            confidence: self.confidence,
        }
    }

    fn fallback<R: Rng + ?Sized>(rng: &mut R, total_draws: u32, recent_draws: usize) -> Self {
        let mut picked = sample_distinct(rng, VERY_HIGH_COUNT + HIGH_COUNT);
        let high = picked.split_off(VERY_HIGH_COUNT);
        Self {
            kind: PredictionKind::Fallback,
            very_high: picked,
            high,
            confidence: FALLBACK_CONFIDENCE,
            level: ConfidenceLevel::Low,
            total_draws,
            recent_draws,
        }
    }

    fn estimation<R: Rng + ?Sized>(rng: &mut R, total_draws: u32) -> Self {
        let pool: Vec<u8> = (1..=POOL_SIZE as u8).collect();
        let favoured: Vec<u8> = pool
            .iter()
            .copied()
            .filter(|n| FAVOURED_ENDINGS.contains(&(n % 10)))
            .collect();

        let mut very_high = sample_from(rng, &favoured, 2);
        let rest: Vec<u8> = pool.iter().copied().filter(|n| !very_high.contains(n)).collect();
        very_high.extend(sample_from(rng, &rest, VERY_HIGH_COUNT - 2));

        let rest: Vec<u8> = pool.iter().copied().filter(|n| !very_high.contains(n)).collect();
        let high = sample_from(rng, &rest, HIGH_COUNT);
        Self {
            kind: PredictionKind::Estimation,
            very_high,
            high,
            confidence: ESTIMATION_CONFIDENCE,
            level: ConfidenceLevel::Low,
            total_draws,
            recent_draws: 0,
        }
    }

    fn from_scores(scores: &ScoreVector, history: &[Draw], total_draws: u32) -> Self {
        let ranked: Vec<u8> = scores
            .ranked()
            .into_iter()
            .take(VERY_HIGH_COUNT + HIGH_COUNT)
            .map(|(n, _)| n)
            .collect();
        let (very_high, high) = ranked.split_at(VERY_HIGH_COUNT.min(ranked.len()));
        let confidence = confidence(history, scores);
        Self {
            kind: PredictionKind::Scored,
            very_high: very_high.to_vec(),
            high: high.to_vec(),
            confidence,
            level: ConfidenceLevel::from_confidence(confidence),
            total_draws,
            recent_draws: history.len(),
        }
    }
}

impl ScoringEngine {
    /// `total_draws` is the store-wide count; `history` is the recent window used for scoring.
    pub fn generate_prediction<R: Rng + ?Sized>(
        &self,
        history: &[Draw],
        total_draws: u32,
        stats: &NumberStats,
        rng: &mut R,
    ) -> PredictionResult {
        if total_draws < MIN_TOTAL_DRAWS {
            return PredictionResult::fallback(rng, total_draws, history.len());
        }
        let scores = self.compute_scores(history, stats);
        PredictionResult::from_scores(&scores, history, total_draws)
    }
}

/// Prediction with the default five-signal blend.
pub fn generate_prediction<R: Rng + ?Sized>(
    history: &[Draw],
    total_draws: u32,
    stats: &NumberStats,
    rng: &mut R,
) -> PredictionResult {
    ScoringEngine::default().generate_prediction(history, total_draws, stats, rng)
}

/// Low-data guess: two numbers ending in 1, 3, 7 or 9, two more from the
/// rest of the pool, then ten from what remains. Uses no history.
pub fn estimate<R: Rng + ?Sized>(rng: &mut R, total_draws: u32) -> PredictionResult {
    PredictionResult::estimation(rng, total_draws)
}
