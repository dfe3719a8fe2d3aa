pub mod env;
mod loader;

pub use env::{
    AppConfig, ClassifierSettings, ConfigError, DirectoryConfig, LoggingConfig, WebContentConfig,
};
pub use loader::load_config;
