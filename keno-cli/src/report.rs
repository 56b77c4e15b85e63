//! Plain-text reports handed to delivery sinks.

use std::fmt::Write;

use chrono::{DateTime, Local};
use keno_engine::PredictionResult;

/// Data collection snapshot behind a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataStatus {
    pub total_draws: u32,
    pub numbers_tracked: usize,
    pub min_draws: u32,
}

impl DataStatus {
    pub fn is_ready(&self) -> bool {
        self.total_draws >= self.min_draws
    }

    pub fn needed(&self) -> u32 {
        self.min_draws.saturating_sub(self.total_draws)
    }
}

fn sorted(numbers: &[u8]) -> String {
    let mut numbers = numbers.to_vec();
    numbers.sort_unstable();
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn prediction_message(result: &PredictionResult, at: DateTime<Local>) -> String {
    let mut msg = String::new();
    let _ = writeln!(msg, "KENO PREDICTION");
    let _ = writeln!(msg, "Based on collected draw data\n");
    let _ = writeln!(msg, "Very high (4): [{}]", sorted(&result.very_high));
    let _ = writeln!(msg, "High (10):     [{}]\n", sorted(&result.high));
    let _ = writeln!(msg, "Confidence:   {:.1}% ({})", result.confidence * 100.0, result.level);
    let _ = writeln!(msg, "Total draws:  {}", result.total_draws);
    let _ = writeln!(msg, "Recent draws: {}\n", result.recent_draws);
    let _ = write!(msg, "Generated at {}", at.format("%H:%M:%S"));
    msg
}

pub fn estimation_message(result: &PredictionResult, status: &DataStatus, at: DateTime<Local>) -> String {
    let mut msg = String::new();
    let _ = writeln!(msg, "KENO PREDICTION");
    let _ = writeln!(msg, "INSUFFICIENT DATA: THIS IS AN ESTIMATION\n");
    let _ = writeln!(msg, "Estimated very high (4): [{}]", sorted(&result.very_high));
    let _ = writeln!(msg, "  based on common Keno patterns");
    let _ = writeln!(msg, "Estimated high (10):     [{}]", sorted(&result.high));
    let _ = writeln!(msg, "  random selection with pattern bias\n");
    let _ = writeln!(msg, "Draws collected: {}/{}", status.total_draws, status.min_draws);
    let _ = writeln!(msg, "Confidence:      {:.1}% (LOW)\n", result.confidence * 100.0);
    let _ = writeln!(
        msg,
        "Use these numbers cautiously. Reliable predictions start at {} draws.",
        status.min_draws
    );
    let _ = write!(msg, "Generated at {}", at.format("%H:%M:%S"));
    msg
}

pub fn status_message(status: &DataStatus, at: DateTime<Local>) -> String {
    let mut msg = String::new();
    let _ = writeln!(msg, "DATA COLLECTION STATUS\n");
    let _ = writeln!(msg, "Database draws:   {}", status.total_draws);
    let _ = writeln!(msg, "Numbers tracked:  {}", status.numbers_tracked);
    let _ = writeln!(msg, "Minimum required: {} draws", status.min_draws);
    if status.is_ready() {
        let _ = writeln!(msg, "Status:           READY\n");
        let _ = writeln!(msg, "Predictions are based on collected data.");
    } else {
        let _ = writeln!(msg, "Status:           COLLECTING DATA\n");
        let _ = writeln!(msg, "Need {} more draws for reliable predictions.", status.needed());
    }
    let _ = write!(msg, "Last update at {}", at.format("%H:%M:%S"));
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use keno_engine::PredictionKind;
    use keno_engine::scoring::confidence::ConfidenceLevel;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 7, 1, 14, 5, 9).unwrap()
    }

    fn result() -> PredictionResult {
        PredictionResult {
            kind: PredictionKind::Scored,
            very_high: vec![40, 2, 17, 9],
            high: vec![80, 1, 3, 5, 7, 11, 13, 15, 19, 21],
            confidence: 0.642,
            level: ConfidenceLevel::Good,
            total_draws: 120,
            recent_draws: 48,
        }
    }

    #[test]
    fn test_prediction_message() {
        let msg = prediction_message(&result(), at());
        assert!(msg.contains("Very high (4): [2, 9, 17, 40]"));
        assert!(msg.contains("[1, 3, 5, 7, 11, 13, 15, 19, 21, 80]"));
        assert!(msg.contains("64.2% (GOOD CONFIDENCE)"));
        assert!(msg.contains("Total draws:  120"));
        assert!(msg.contains("Recent draws: 48"));
        assert!(msg.ends_with("14:05:09"));
    }

    #[test]
    fn test_estimation_message() {
        let status = DataStatus {
            total_draws: 3,
            numbers_tracked: 80,
            min_draws: 10,
        };
        let mut estimate = result();
        estimate.kind = PredictionKind::Estimation;
        estimate.confidence = 0.15;
        let msg = estimation_message(&estimate, &status, at());
        assert!(msg.contains("ESTIMATION"));
        assert!(msg.contains("Estimated very high (4): [2, 9, 17, 40]"));
        assert!(msg.contains("Draws collected: 3/10"));
        assert!(msg.contains("15.0% (LOW)"));
    }

    #[test]
    fn test_status_message() {
        let mut status = DataStatus {
            total_draws: 7,
            numbers_tracked: 80,
            min_draws: 10,
        };
        assert_eq!(status.needed(), 3);
        let msg = status_message(&status, at());
        assert!(msg.contains("COLLECTING DATA"));
        assert!(msg.contains("Need 3 more draws"));

        status.total_draws = 12;
        assert!(status.is_ready());
        assert_eq!(status.needed(), 0);
        let msg = status_message(&status, at());
        assert!(msg.contains("READY"));
        assert!(!msg.contains("Need"));
    }
}
