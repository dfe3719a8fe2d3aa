use std::{env, str::FromStr, time::Duration};

use super::env::{
    AppConfig, ClassifierSettings, ConfigError, DirectoryConfig, LoggingConfig, WebContentConfig,
};

const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10; rv:33.0) Gecko/20100101 Firefox/33.0",
    "Mozilla/5.0 (compatible, MSIE 11, Windows NT 6.3; Trident/7.0; rv:11.0) like Gecko",
    "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36",
];

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|key| env::var(key).ok())
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_jobs = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1);

        let classifier = ClassifierSettings {
            threshold: parse_or(&var, "CLASSIFIER_THRESHOLD", 0.40)?,
            jobs: parse_or(&var, "CLASSIFIER_JOBS", default_jobs)?.max(1),
            parallel_min_batch: parse_or(&var, "PARALLEL_MIN_BATCH", 40)?,
            offline: parse_bool(&var, "OFFLINE", true)?,
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            pages_dir: var("PAGES_DIR").unwrap_or_else(|| "Pages".to_string()),
            keywords_dir: var("KEYWORDS_DIR").unwrap_or_else(|| "Keywords".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            retained_files: parse_or(&var, "LOG_RETAINED_FILES", 14)?.max(1),
        };

        let user_agents = var("FETCH_USER_AGENTS")
            .map(|value| {
                value
                    .split(';')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|agents| !agents.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENTS.iter().map(|a| a.to_string()).collect());

        let web = WebContentConfig {
            fetch_timeout: Duration::from_millis(parse_or(&var, "FETCH_TIMEOUT", 3_050)?),
            user_agents,
            max_retry_wait: Duration::from_secs(parse_or(&var, "MAX_RETRY_WAIT", 30)?),
            cache_name_length: 25,
        };

        Ok(Self {
            classifier,
            directories,
            logging,
            web,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_bool<F>(var: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(default),
    }
}
