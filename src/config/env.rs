use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub classifier: ClassifierSettings,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub web: WebContentConfig,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub threshold: f64,
    pub jobs: usize,
    pub parallel_min_batch: usize,
    pub offline: bool,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub pages_dir: String,
    pub keywords_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub retained_files: usize,
}

#[derive(Debug, Clone)]
pub struct WebContentConfig {
    pub fetch_timeout: Duration,
    pub user_agents: Vec<String>,
    pub max_retry_wait: Duration,
    pub cache_name_length: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
