use std::path::PathBuf;

use anyhow::{Context, Result};
use webpage_classifier::{
    app::ClassifierApp,
    config,
    infrastructure::{directories, logging},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let input = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: webpage-classifier <urls.txt | urls.json>")?;

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let app = ClassifierApp::initialize(&config, &paths)?;
    app.run(&input).await
}
