use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("malformed batch input: {0}")]
    MalformedInput(String),
    #[error("got {urls} URLs but {labels} labels")]
    LabelCountMismatch { urls: usize, labels: usize },
    #[error("threshold {0} must lie in [0.1, 0.5)")]
    InvalidThreshold(f64),
    #[error("scoring worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
