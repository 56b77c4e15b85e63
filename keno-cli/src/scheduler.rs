//! Periodic prediction loop.
//!
//! One cycle per interval tick: an estimation while the store holds fewer
//! than the minimum number of draws, a saved prediction afterwards. A status
//! report goes out at start-up and every `status_every` cycles. Failed
//! deliveries and saves are retried with exponential backoff; the loop ends
//! on the shutdown signal or after `max_cycles`.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use keno_db::models::PredictionRecord;
use keno_db::store::DrawStore;
use keno_engine::{PredictionResult, Predictor, estimate};
use rand::Rng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::KenoConfig;
use crate::delivery::PredictionSink;
use crate::report::{DataStatus, estimation_message, prediction_message, status_message};

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub interval: Duration,
    pub error_backoff: Duration,
    pub max_retries: u32,
    pub status_every: u32,
    pub min_draws: u32,
    pub max_cycles: Option<u64>,
}

impl SchedulerOptions {
    pub fn from_config(config: &KenoConfig, max_cycles: Option<u64>) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            error_backoff: Duration::from_secs(config.error_backoff_secs),
            max_retries: config.max_retries.max(1),
            status_every: config.status_every,
            min_draws: config.min_draws_for_prediction,
            max_cycles,
        }
    }

    /// Backoff before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.error_backoff
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Estimation,
    Prediction,
}

enum Delivery {
    Estimation,
    Prediction(PredictionRecord),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub estimations: u64,
    pub predictions: u64,
    pub failed_cycles: u64,
}

pub struct Scheduler<S: DrawStore, K: PredictionSink, R: Rng> {
    predictor: Predictor<S>,
    sink: K,
    rng: R,
    options: SchedulerOptions,
}

impl<S: DrawStore, K: PredictionSink, R: Rng> Scheduler<S, K, R> {
    pub fn new(predictor: Predictor<S>, sink: K, rng: R, options: SchedulerOptions) -> Self {
        Self {
            predictor,
            sink,
            rng,
            options,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn predictor(&self) -> &Predictor<S> {
        &self.predictor
    }

    pub fn data_status(&self) -> Result<DataStatus> {
        let store = self.predictor.store();
        Ok(DataStatus {
            total_draws: store.total_draws().context("failed to count draws")?,
            numbers_tracked: store.number_stats().context("failed to load number stats")?.len(),
            min_draws: self.options.min_draws,
        })
    }

    pub fn send_status(&mut self) -> Result<()> {
        let status = self.data_status()?;
        let message = status_message(&status, Local::now());
        self.sink
            .deliver_status(&status, &message)
            .with_context(|| format!("{} sink rejected status", self.sink.name()))?;
        debug!(total_draws = status.total_draws, "status delivered");
        Ok(())
    }

    /// Builds and delivers this cycle's message. A delivered prediction comes
    /// back as the record still to be saved.
    fn deliver_cycle(&mut self) -> Result<Delivery> {
        let status = self.data_status()?;
        let now = Utc::now();

        if !status.is_ready() {
            let result = estimate(&mut self.rng, status.total_draws);
            let message = estimation_message(&result, &status, now.with_timezone(&Local));
            self.deliver(&result, &message)?;
            info!(total_draws = status.total_draws, needed = status.needed(), "estimation sent");
            return Ok(Delivery::Estimation);
        }

        let result = self.predictor.predict(now, &mut self.rng)?;
        let message = prediction_message(&result, now.with_timezone(&Local));
        self.deliver(&result, &message)?;
        info!(confidence = result.confidence, level = %result.level, "prediction sent");
        Ok(Delivery::Prediction(result.to_record(now)))
    }

    fn deliver(&mut self, result: &PredictionResult, message: &str) -> Result<()> {
        self.sink
            .deliver_prediction(result, message)
            .with_context(|| format!("{} sink rejected prediction", self.sink.name()))
    }

    fn save(&mut self, record: &PredictionRecord) -> Result<()> {
        self.predictor
            .store_mut()
            .save_prediction(record)
            .context("failed to save prediction")
    }

    /// One cycle without retries. Estimations are not stored.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        match self.deliver_cycle()? {
            Delivery::Estimation => Ok(CycleOutcome::Estimation),
            Delivery::Prediction(record) => {
                self.save(&record)?;
                Ok(CycleOutcome::Prediction)
            }
        }
    }

    /// Runs `step` until it succeeds or `max_retries` attempts failed.
    /// `None` when shutdown was requested while backing off.
    async fn retry<T>(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
        what: &str,
        mut step: impl FnMut(&mut Self) -> Result<T>,
    ) -> Option<Result<T>> {
        let mut attempt = 1;
        loop {
            match step(self) {
                Ok(value) => return Some(Ok(value)),
                Err(e) if attempt >= self.options.max_retries => return Some(Err(e)),
                Err(e) => {
                    let wait = self.options.backoff(attempt);
                    warn!(step = what, attempt, error = %format!("{e:#}"), wait_secs = wait.as_secs(), "cycle step failed, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        _ = shutdown.changed() => return None,
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Delivery and saving are retried separately, so a failed save never
    /// sends a second prediction for the same tick.
    async fn run_cycle_with_retry(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<Result<CycleOutcome>> {
        let delivery = match self.retry(shutdown, "delivery", Self::deliver_cycle).await? {
            Ok(delivery) => delivery,
            Err(e) => return Some(Err(e)),
        };
        match delivery {
            Delivery::Estimation => Some(Ok(CycleOutcome::Estimation)),
            Delivery::Prediction(record) => {
                let saved = self.retry(shutdown, "save", |s| s.save(&record)).await?;
                Some(saved.map(|()| CycleOutcome::Prediction))
            }
        }
    }

    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        info!(
            interval_secs = self.options.interval.as_secs(),
            min_draws = self.options.min_draws,
            "prediction scheduler started"
        );

        if let Err(e) = self.send_status() {
            error!(error = %format!("{e:#}"), "start-up status failed");
        }

        let mut ticker = tokio::time::interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            if self.options.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            summary.cycles += 1;
            match self.run_cycle_with_retry(&mut shutdown).await {
                None => break,
                Some(Ok(CycleOutcome::Estimation)) => summary.estimations += 1,
                Some(Ok(CycleOutcome::Prediction)) => summary.predictions += 1,
                Some(Err(e)) => {
                    summary.failed_cycles += 1;
                    error!(cycle = summary.cycles, error = %format!("{e:#}"), "cycle abandoned");
                }
            }

            let every = u64::from(self.options.status_every);
            if every > 0 && summary.cycles % every == 0 {
                if let Err(e) = self.send_status() {
                    error!(error = %format!("{e:#}"), "status report failed");
                }
            }
        }

        info!(
            cycles = summary.cycles,
            predictions = summary.predictions,
            estimations = summary.estimations,
            failed = summary.failed_cycles,
            "prediction scheduler stopped"
        );
        Ok(summary)
    }
}

/// Shutdown channel flipped by Ctrl-C.
pub fn ctrl_c_shutdown() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received, stopping"),
            Err(e) => error!(error = %e, "cannot listen for Ctrl-C"),
        }
        let _ = tx.send(true);
    });
    rx
}
