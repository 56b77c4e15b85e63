//! Where scheduler output goes.

use anyhow::Result;
use keno_engine::PredictionResult;
use tracing::info;

use crate::report::DataStatus;

pub trait PredictionSink {
    fn name(&self) -> &str;
    fn deliver_prediction(&mut self, result: &PredictionResult, message: &str) -> Result<()>;
    fn deliver_status(&mut self, status: &DataStatus, message: &str) -> Result<()>;
}

/// Prints every message to stdout.
pub struct ConsoleSink;

impl PredictionSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn deliver_prediction(&mut self, _result: &PredictionResult, message: &str) -> Result<()> {
        println!("{message}\n");
        Ok(())
    }

    fn deliver_status(&mut self, _status: &DataStatus, message: &str) -> Result<()> {
        println!("{message}\n");
        Ok(())
    }
}

/// Emits structured events instead of text, for `--log-format json` deployments.
pub struct LogSink;

impl PredictionSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver_prediction(&mut self, result: &PredictionResult, _message: &str) -> Result<()> {
        info!(
            kind = %result.kind,
            very_high = ?result.very_high,
            high = ?result.high,
            confidence = result.confidence,
            level = %result.level,
            "prediction"
        );
        Ok(())
    }

    fn deliver_status(&mut self, status: &DataStatus, _message: &str) -> Result<()> {
        info!(
            total_draws = status.total_draws,
            ready = status.is_ready(),
            needed = status.needed(),
            "data status"
        );
        Ok(())
    }
}
