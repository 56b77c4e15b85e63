use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numbers run from 1 to `POOL_SIZE`.
pub const POOL_SIZE: usize = 80;
/// Numbers drawn per round.
pub const PICK_COUNT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("expected exactly 20 numbers, got {0}")]
    WrongCount(usize),

    #[error("number {0} out of range (1-80)")]
    OutOfRange(u32),

    #[error("duplicate number: {0}")]
    Duplicate(u8),

    #[error("cannot parse '{0}' as a number")]
    Malformed(String),
}

/// One recorded round. Immutable once built through [`Draw::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub draw_id: String,
    pub drawn_at: DateTime<Utc>,
    pub numbers: [u8; PICK_COUNT],
}

impl Draw {
    pub fn new(
        draw_id: impl Into<String>,
        drawn_at: DateTime<Utc>,
        numbers: &[u8],
    ) -> Result<Self, DrawError> {
        let numbers = validate_draw(numbers)?;
        Ok(Self {
            draw_id: draw_id.into(),
            drawn_at,
            numbers,
        })
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    /// Order in which draws are applied to the statistics: time, then id.
    pub fn chronological(&self, other: &Draw) -> Ordering {
        self.drawn_at
            .cmp(&other.drawn_at)
            .then_with(|| self.draw_id.cmp(&other.draw_id))
    }
}

/// Accumulated state of one number, maintained by the store on every ingested draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberStat {
    pub number: u8,
    pub total_appearances: u32,
    pub last_seen: Option<DateTime<Utc>>,
    pub hot_streak: u32,
    pub cold_streak: u32,
}

impl NumberStat {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            total_appearances: 0,
            last_seen: None,
            hot_streak: 0,
            cold_streak: 0,
        }
    }

    /// Present: appearance counted, hot streak extended, cold streak reset.
    /// Absent: cold streak extended, hot streak reset.
    pub fn record(&mut self, present: bool, drawn_at: DateTime<Utc>) {
        if present {
            self.total_appearances += 1;
            self.last_seen = Some(drawn_at);
            self.hot_streak += 1;
            self.cold_streak = 0;
        } else {
            self.cold_streak += 1;
            self.hot_streak = 0;
        }
    }

    pub fn frequency(&self, total_draws: u32) -> f64 {
        if total_draws == 0 {
            0.0
        } else {
            self.total_appearances as f64 / total_draws as f64
        }
    }
}

pub type NumberStats = HashMap<u8, NumberStat>;

/// A prediction as it was emitted, kept for history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub created_at: DateTime<Utc>,
    pub kind: String,
    pub very_high: Vec<u8>,
    pub high: Vec<u8>,
    pub confidence: f64,
}

/// Fresh statistics for the whole pool.
pub fn empty_stats() -> NumberStats {
    (1..=POOL_SIZE as u8).map(|n| (n, NumberStat::new(n))).collect()
}

/// Applies one draw to every number of the pool. Draws must be applied in chronological order.
pub fn apply_draw(stats: &mut NumberStats, draw: &Draw) {
    for n in 1..=POOL_SIZE as u8 {
        stats
            .entry(n)
            .or_insert_with(|| NumberStat::new(n))
            .record(draw.contains(n), draw.drawn_at);
    }
}

/// Statistics rebuilt from scratch; `draws` may be in any order.
pub fn replay_draws<'a>(draws: impl IntoIterator<Item = &'a Draw>) -> NumberStats {
    let mut ordered: Vec<&Draw> = draws.into_iter().collect();
    ordered.sort_by(|a, b| a.chronological(b));
    let mut stats = empty_stats();
    for draw in ordered {
        apply_draw(&mut stats, draw);
    }
    stats
}

pub fn validate_draw(numbers: &[u8]) -> Result<[u8; PICK_COUNT], DrawError> {
    if numbers.len() != PICK_COUNT {
        return Err(DrawError::WrongCount(numbers.len()));
    }
    for &n in numbers {
        if n < 1 || n as usize > POOL_SIZE {
            return Err(DrawError::OutOfRange(n as u32));
        }
    }
    let mut seen = [false; POOL_SIZE + 1];
    for &n in numbers {
        if seen[n as usize] {
            return Err(DrawError::Duplicate(n));
        }
        seen[n as usize] = true;
    }
    let mut arr = [0u8; PICK_COUNT];
    arr.copy_from_slice(numbers);
    Ok(arr)
}

/// Parses "1,2,3" or "1 2 3" into numbers, rejecting anything outside 1..=80.
pub fn parse_numbers(input: &str) -> Result<Vec<u8>, DrawError> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            let value: u32 = s
                .parse()
                .map_err(|_| DrawError::Malformed(s.to_string()))?;
            if value < 1 || value as usize > POOL_SIZE {
                return Err(DrawError::OutOfRange(value));
            }
            Ok(value as u8)
        })
        .collect()
}
