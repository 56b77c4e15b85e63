use keno_db::models::{Draw, NumberStat, NumberStats, POOL_SIZE};
use super::Signal;

/// Reads the streak counters kept by the store. Long droughts score highest, then running streaks.
pub struct StreakSignal;

impl StreakSignal {
    pub fn score_stat(stat: Option<&NumberStat>) -> f64 {
        let (hot, cold) = stat.map(|s| (s.hot_streak, s.cold_streak)).unwrap_or((0, 0));
        if hot >= 3 {
            0.8
        } else if hot >= 2 {
            0.6
        } else if cold >= 5 {
            0.9
        } else if cold >= 3 {
            0.7
        } else {
            0.5
        }
    }
}

impl Signal for StreakSignal {
    fn name(&self) -> &str {
        "Streak"
    }

    fn score(&self, _history: &[Draw], stats: &NumberStats) -> Vec<f64> {
        (1..=POOL_SIZE as u8)
            .map(|n| Self::score_stat(stats.get(&n)))
            .collect()
    }
}
