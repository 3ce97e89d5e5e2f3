use thiserror::Error;

pub type RecommenderResult<T> = Result<T, RecommenderError>;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data source error ({path}): {reason}")]
    DataSource { path: String, reason: String },

    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Encoder loading error: {0}")]
    EncoderLoad(String),

    #[error("Inference error: {0}")]
    Inference(#[from] crate::inference::InferenceError),

    #[error("Feature construction error: {0}")]
    Feature(#[from] crate::features::FeatureError),
}

impl From<config::ConfigError> for RecommenderError {
    fn from(e: config::ConfigError) -> Self {
        RecommenderError::Config(e.to_string())
    }
}

impl RecommenderError {
    pub fn data_source(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        RecommenderError::DataSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
