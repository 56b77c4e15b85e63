use keno_db::models::{Draw, NumberStats, POOL_SIZE};
use super::Signal;

/// Compares the recent part of the history with the older remainder.
pub struct HotColdSignal {
    min_history: usize,
    min_recent: usize,
}

impl HotColdSignal {
    pub fn new(min_history: usize, min_recent: usize) -> Self {
        Self { min_history, min_recent }
    }

    /// Size of the recent window: a third of the history, never less than `min_recent`.
    pub fn recent_window(&self, history_len: usize) -> usize {
        self.min_recent.max(history_len / 3)
    }
}

impl Default for HotColdSignal {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

const ONLY_RECENT: f64 = 1.0;
const BOTH: f64 = 0.7;
const ONLY_OLDER: f64 = 0.3;
const NEITHER: f64 = 0.1;

impl Signal for HotColdSignal {
    fn name(&self) -> &str {
        "HotCold"
    }

    fn score(&self, history: &[Draw], _stats: &NumberStats) -> Vec<f64> {
        if history.len() < self.min_history {
            return vec![0.0; POOL_SIZE];
        }

        let split = self.recent_window(history.len()).min(history.len());
        let (recent, older) = history.split_at(split);

        let mut in_recent = [false; POOL_SIZE];
        for draw in recent {
            for &n in &draw.numbers {
                in_recent[(n - 1) as usize] = true;
            }
        }
        let mut in_older = [false; POOL_SIZE];
        for draw in older {
            for &n in &draw.numbers {
                in_older[(n - 1) as usize] = true;
            }
        }

        (0..POOL_SIZE)
            .map(|i| match (in_recent[i], in_older[i]) {
                (true, false) => ONLY_RECENT,
                (true, true) => BOTH,
                (false, true) => ONLY_OLDER,
                (false, false) => NEITHER,
            })
            .collect()
    }
}
