//! Storage collaborator seen by the prediction side.
//!
//! `SqliteStore` is the persistent backend; `MemoryStore` keeps everything in
//! process and is used for tests and dry runs. Both apply the same streak
//! bookkeeping, see [`crate::models::NumberStat::record`].

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::db;
use crate::models::{Draw, NumberStats, PredictionRecord, apply_draw, empty_stats, replay_draws};

pub trait DrawStore {
    /// Draws no older than `window` relative to `now`, most recent first, at most `limit`.
    fn recent_draws(&self, now: DateTime<Utc>, window: Duration, limit: u32) -> Result<Vec<Draw>>;
    fn number_stats(&self) -> Result<NumberStats>;
    fn total_draws(&self) -> Result<u32>;
    /// Returns `false` for an already-known draw id.
    fn record_draw(&mut self, draw: &Draw) -> Result<bool>;
    fn save_prediction(&mut self, record: &PredictionRecord) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wraps an open connection, running migrations first.
    pub fn new(conn: Connection) -> Result<Self> {
        db::migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("cannot open in-memory database")?;
        Self::new(conn)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Records draws in one transaction, oldest first regardless of input order.
    /// Returns the number of new draws.
    pub fn record_batch(&mut self, draws: &[Draw]) -> Result<u32> {
        let mut sorted: Vec<&Draw> = draws.iter().collect();
        sorted.sort_by(|a, b| a.chronological(b));

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("cannot start transaction")?;
        let inserted = db::insert_draws(&tx, sorted)?;
        tx.commit().context("commit failed")?;
        info!(inserted, total = draws.len(), "batch recorded");
        Ok(inserted)
    }
}

impl DrawStore for SqliteStore {
    fn recent_draws(&self, now: DateTime<Utc>, window: Duration, limit: u32) -> Result<Vec<Draw>> {
        let draws = db::fetch_recent_draws(&self.conn, &(now - window), limit)?;
        debug!(count = draws.len(), "recent draws fetched");
        Ok(draws)
    }

    fn number_stats(&self) -> Result<NumberStats> {
        db::fetch_number_stats(&self.conn)
    }

    fn total_draws(&self) -> Result<u32> {
        db::count_draws(&self.conn)
    }

    fn record_draw(&mut self, draw: &Draw) -> Result<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("cannot start transaction")?;
        let inserted = db::insert_draw(&tx, draw)?;
        tx.commit().context("commit failed")?;
        if inserted {
            info!(draw_id = %draw.draw_id, "draw recorded");
        } else {
            debug!(draw_id = %draw.draw_id, "duplicate draw ignored");
        }
        Ok(inserted)
    }

    fn save_prediction(&mut self, record: &PredictionRecord) -> Result<()> {
        db::insert_prediction(&self.conn, record)?;
        Ok(())
    }
}

/// Draws kept in chronological order. Statistics advance in place, or are
/// replayed when a draw arrives older than one already held.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    draws: Vec<Draw>,
    stats: NumberStats,
    predictions: Vec<PredictionRecord>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            draws: Vec::new(),
            stats: empty_stats(),
            predictions: Vec::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from draws, applied in chronological order.
    pub fn with_draws(draws: impl IntoIterator<Item = Draw>) -> Self {
        let mut store = Self::new();
        for draw in draws {
            store.push(draw);
        }
        store
    }

    fn push(&mut self, draw: Draw) -> bool {
        if self.draws.iter().any(|d| d.draw_id == draw.draw_id) {
            return false;
        }
        let backfill = self.draws.last().is_some_and(|last| draw.chronological(last).is_lt());
        if backfill {
            self.draws.push(draw);
            self.draws.sort_by(|a, b| a.chronological(b));
            self.stats = replay_draws(&self.draws);
            debug!(draws = self.draws.len(), "number stats replayed");
        } else {
            apply_draw(&mut self.stats, &draw);
            self.draws.push(draw);
        }
        true
    }

    pub fn predictions(&self) -> &[PredictionRecord] {
        &self.predictions
    }
}

impl DrawStore for MemoryStore {
    fn recent_draws(&self, now: DateTime<Utc>, window: Duration, limit: u32) -> Result<Vec<Draw>> {
        let cutoff = now - window;
        let mut recent: Vec<Draw> = self
            .draws
            .iter()
            .filter(|d| d.drawn_at >= cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.drawn_at.cmp(&a.drawn_at).then_with(|| b.draw_id.cmp(&a.draw_id)));
        recent.truncate(limit as usize);
        Ok(recent)
    }

    fn number_stats(&self) -> Result<NumberStats> {
        Ok(self.stats.clone())
    }

    fn total_draws(&self) -> Result<u32> {
        Ok(self.draws.len() as u32)
    }

    fn record_draw(&mut self, draw: &Draw) -> Result<bool> {
        Ok(self.push(draw.clone()))
    }

    fn save_prediction(&mut self, record: &PredictionRecord) -> Result<()> {
        self.predictions.push(record.clone());
        Ok(())
    }
}
