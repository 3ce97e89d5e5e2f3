use crate::error::RecommenderResult;
use serde::Deserialize;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `UPI_RECOMMENDER__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Locations of the tabular inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_profiles_path")]
    pub profiles_path: String,
    /// Historical transactions; optional because serving only needs profiles.
    #[serde(default)]
    pub transactions_path: Option<String>,
}

/// Trained artifacts. With no `model_path` every known-user request uses the
/// statistical baseline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub encoders_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Seed for the fallback jitter; unset draws from OS entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default = "default_batch_max_size")]
    pub batch_max_size: usize,
    #[serde(default = "default_batch_workers")]
    pub batch_workers: usize,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    5000
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_profiles_path() -> String {
    "user_behavior_profiles.csv".to_string()
}
fn default_batch_max_size() -> usize {
    1000
}
fn default_batch_workers() -> usize {
    1
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            profiles_path: default_profiles_path(),
            transactions_path: None,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            random_seed: None,
            batch_max_size: default_batch_max_size(),
            batch_workers: default_batch_workers(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            data: DataConfig::default(),
            model: ModelConfig::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file, then environment
    /// variables (which take precedence).
    pub fn load(config_file: Option<&str>) -> RecommenderResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("UPI_RECOMMENDER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
