pub mod batch;
pub mod cascade;
pub mod config;
pub mod error;
pub mod extract;
pub mod labels;
pub mod prefilter;
pub mod scorers;
pub mod similarity;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    domain::{Category, ScoreVector},
    web_content::HtmlSource,
};

pub use batch::BatchOutcome;
pub use cascade::{Cascade, Stage, Verdict};
pub use config::ClassifierConfig;
pub use error::ClassifierError;
pub use labels::{undeclared_labels, Lemmatizer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FitReport {
    pub samples: usize,
    pub undeclared: Vec<String>,
}

/// Classifies URLs into page types. Keeps a side list of URLs whose HTML
/// could not be fetched; callers clear it when they are done with it.
pub struct PageClassifier {
    cascade: Cascade,
    errors: Mutex<Vec<String>>,
}

impl PageClassifier {
    pub fn new(config: ClassifierConfig, source: Arc<dyn HtmlSource>) -> Self {
        Self {
            cascade: Cascade::new(Arc::new(config), source),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        self.cascade.config()
    }

    /// Nothing is learned; this only warns about labels outside the known
    /// categories.
    pub fn fit<U, L>(&self, urls: &[U], labels: &[L]) -> Result<FitReport, ClassifierError>
    where
        L: AsRef<str>,
    {
        if urls.len() != labels.len() {
            return Err(ClassifierError::LabelCountMismatch {
                urls: urls.len(),
                labels: labels.len(),
            });
        }
        let undeclared = undeclared_labels(labels);
        if !undeclared.is_empty() {
            tracing::warn!(
                target: "fit",
                count = undeclared.len(),
                labels = ?undeclared,
                "found undeclared categories during fitting"
            );
        }
        Ok(FitReport {
            samples: urls.len(),
            undeclared,
        })
    }

    pub async fn predict_proba(&self, urls: &[String]) -> Result<Vec<ScoreVector>, ClassifierError> {
        let outcome = batch::score_batch(&self.cascade, urls).await?;
        self.errors.lock().extend(outcome.errors);
        Ok(outcome.rows)
    }

    pub async fn predict(&self, urls: &[String]) -> Result<Vec<Category>, ClassifierError> {
        let rows = self.predict_proba(urls).await?;
        Ok(rows.iter().map(ScoreVector::argmax).collect())
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn clear_errors(&self) {
        self.errors.lock().clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBatch {
    pub urls: Vec<String>,
    pub labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct LabeledUrl {
    url: String,
    #[serde(default, alias = "label")]
    pagetype: Option<String>,
}

impl UrlBatch {
    /// Accepts an array of URL strings or of `{"url", "pagetype"}` objects.
    /// Labels are kept only when every entry has one.
    pub fn from_json(value: Value) -> Result<Self, ClassifierError> {
        let items = match value {
            Value::Array(items) => items,
            Value::String(url) => {
                return Err(ClassifierError::MalformedInput(format!(
                    "expected a sequence of URLs, got the single string {url:?}"
                )))
            }
            other => {
                return Err(ClassifierError::MalformedInput(format!(
                    "expected a sequence of URLs, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut urls = Vec::with_capacity(items.len());
        let mut labels = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            match item {
                Value::String(url) => {
                    urls.push(url);
                    labels.push(None);
                }
                Value::Object(_) => {
                    let entry: LabeledUrl = serde_json::from_value(item).map_err(|err| {
                        ClassifierError::MalformedInput(format!("entry {position}: {err}"))
                    })?;
                    urls.push(entry.url);
                    labels.push(entry.pagetype);
                }
                other => {
                    return Err(ClassifierError::MalformedInput(format!(
                        "entry {position}: expected a URL string or object, got {}",
                        json_kind(&other)
                    )))
                }
            }
        }

        let labels = labels.into_iter().collect::<Option<Vec<_>>>();
        Ok(Self { urls, labels })
    }

    pub fn from_lines(text: &str) -> Self {
        let mut urls = Vec::new();
        let mut labels = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#')) {
            let mut parts = line.splitn(2, '\t');
            let url = parts.next().unwrap_or_default().trim().to_string();
            urls.push(url);
            labels.push(parts.next().map(|label| label.trim().to_string()));
        }
        let labels = labels.into_iter().collect::<Option<Vec<_>>>();
        Self { urls, labels }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
