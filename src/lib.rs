//! Page type classification from a URL and, when the URL is not enough, the
//! page's HTML.

pub mod app;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod gold_words;
pub mod infrastructure;
pub mod web_content;

pub use classifier::{ClassifierConfig, ClassifierError, PageClassifier, UrlBatch};
pub use domain::{Category, FetchedPage, GoldWordSet, ScoreVector};
pub use web_content::{FetchMode, HtmlSource, WebPageFetcher};
