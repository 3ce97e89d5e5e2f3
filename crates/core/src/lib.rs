pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod types;

pub use config::AppConfig;
pub use error::{RecommenderError, RecommenderResult};
pub use features::{FeatureError, FeatureRecord};
