pub mod prediction;
pub mod predictor;
pub mod sampler;
pub mod scoring;
pub mod signals;

pub use prediction::{PredictionKind, PredictionResult, estimate, generate_prediction};
pub use predictor::Predictor;
pub use scoring::{ScoreVector, ScoringEngine, compute_scores};
