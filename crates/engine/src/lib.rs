#![warn(clippy::unwrap_used)]

//! Recommendation engine: feature encoding, amount prediction with fallbacks,
//! confidence scoring, user insights and batch fan-out.

pub mod batch;
pub mod encoder;
pub mod engine;
pub mod fallback;
pub mod insights;
pub mod jitter;
pub mod predictor;

pub use batch::BatchCoordinator;
pub use encoder::FeatureEncoder;
pub use engine::{EngineConfig, RecommendationEngine};
pub use insights::UserInsightService;
pub use jitter::UniformJitter;
pub use predictor::AmountPredictor;
