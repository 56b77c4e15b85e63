//! Predictor: pulls history and statistics from a [`DrawStore`] and runs the
//! scoring engine on them.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use keno_db::store::DrawStore;
use rand::Rng;
use tracing::{debug, info};

use crate::prediction::PredictionResult;
use crate::scoring::{ScoreBreakdown, ScoringEngine};

/// Scoring engine bound to a storage backend.
pub struct Predictor<S: DrawStore> {
    store: S,
    engine: ScoringEngine,
    window: Duration,
    limit: u32,
}

impl<S: DrawStore> Predictor<S> {
    pub fn new(store: S, window: Duration, limit: u32) -> Self {
        Self::with_engine(store, ScoringEngine::default(), window, limit)
    }

    pub fn with_engine(store: S, engine: ScoringEngine, window: Duration, limit: u32) -> Self {
        Self {
            store,
            engine,
            window,
            limit,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn predict<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> Result<PredictionResult> {
        let history = self
            .store
            .recent_draws(now, self.window, self.limit)
            .context("failed to load recent draws")?;
        let stats = self.store.number_stats().context("failed to load number stats")?;
        let total = self.store.total_draws().context("failed to count draws")?;

        let result = self.engine.generate_prediction(&history, total, &stats, rng);
        info!(
            kind = %result.kind,
            confidence = result.confidence,
            total_draws = total,
            recent_draws = history.len(),
            "prediction generated"
        );
        Ok(result)
    }

    /// Score vector with per-signal detail over the current window.
    pub fn scores(&self, now: DateTime<Utc>) -> Result<ScoreBreakdown> {
        let history = self
            .store
            .recent_draws(now, self.window, self.limit)
            .context("failed to load recent draws")?;
        let stats = self.store.number_stats().context("failed to load number stats")?;
        debug!(history = history.len(), "computing score breakdown");
        Ok(self.engine.breakdown(&history, &stats))
    }

    /// Generates a prediction and records it in the store.
    pub fn predict_and_save<R: Rng + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<PredictionResult> {
        let result = self.predict(now, rng)?;
        self.store
            .save_prediction(&result.to_record(now))
            .context("failed to save prediction")?;
        Ok(result)
    }
}
