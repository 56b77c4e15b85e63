use std::collections::BTreeSet;

use keno_db::models::{Draw, NumberStats, POOL_SIZE};

use super::Signal;

const ENDING_BONUS: f64 = 0.3;
const DECADE_BONUS: f64 = 0.3;
const LOW_HIGH_BONUS: f64 = 0.2;
const EVEN_ODD_BONUS: f64 = 0.2;
const LOW_HALF_MAX: u8 = 40;

/// Shape of one draw: which last digits and which tens-groups it covered, and how it leaned.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPattern {
    /// `n % 10` for every number drawn.
    pub endings: BTreeSet<u8>,
    /// `(n - 1) / 10` for every number drawn: 0 for 1-10 up to 7 for 71-80.
    pub decades: BTreeSet<u8>,
    /// Fraction of numbers in 1-40.
    pub low_high_balance: f64,
    /// Fraction of even numbers.
    pub even_odd_balance: f64,
}

impl DrawPattern {
    pub fn analyze(numbers: &[u8]) -> Self {
        let endings = numbers.iter().map(|n| n % 10).collect();
        let decades = numbers.iter().map(|n| (n - 1) / 10).collect();
        let (low_high_balance, even_odd_balance) = if numbers.is_empty() {
            (0.0, 0.0)
        } else {
            let total = numbers.len() as f64;
            let low = numbers.iter().filter(|&&n| n <= LOW_HALF_MAX).count() as f64;
            let even = numbers.iter().filter(|&&n| n % 2 == 0).count() as f64;
            (low / total, even / total)
        };
        Self {
            endings,
            decades,
            low_high_balance,
            even_odd_balance,
        }
    }

    /// Similarity of `number` to this pattern, capped at 1.0.
    pub fn score(&self, number: u8) -> f64 {
        let mut score = 0.0;

        if self.endings.contains(&(number % 10)) {
            score += ENDING_BONUS;
        }
        if self.decades.contains(&((number - 1) / 10)) {
            score += DECADE_BONUS;
        }

        let low = number <= LOW_HALF_MAX;
        if (low && self.low_high_balance > 0.5) || (!low && self.low_high_balance < 0.5) {
            score += LOW_HIGH_BONUS;
        }

        let even = number % 2 == 0;
        if (even && self.even_odd_balance > 0.5) || (!even && self.even_odd_balance < 0.5) {
            score += EVEN_ODD_BONUS;
        }

        f64::min(score, 1.0)
    }
}

/// Resemblance of each number to the most recent draw.
pub struct PatternSignal;

impl Signal for PatternSignal {
    fn name(&self) -> &str {
        "Pattern"
    }

    fn score(&self, history: &[Draw], _stats: &NumberStats) -> Vec<f64> {
        let Some(last) = history.first() else {
            return vec![0.0; POOL_SIZE];
        };
        let pattern = DrawPattern::analyze(&last.numbers);
        (1..=POOL_SIZE as u8).map(|n| pattern.score(n)).collect()
    }
}
