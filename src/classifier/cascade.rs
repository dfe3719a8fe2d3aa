use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    domain::{Category, ScoreVector},
    web_content::{HtmlSource, HTTP_ERROR},
};

use super::{
    config::ClassifierConfig,
    extract::ParsedPage,
    prefilter::prefilter,
    scorers::{error_score, score_page},
};

/// Raw score every category starts from before any evidence is tallied.
pub const BASELINE_SCORE: f64 = 0.1;

const MAX_LOGGED_URL_LEN: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    UrlOnly,
    HtmlFetch,
    ContentScoring,
    ErrorCheck,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub scores: ScoreVector,
    pub stage: Stage,
}

impl Verdict {
    pub fn label(&self) -> Category {
        self.scores.argmax()
    }
}

#[derive(Clone)]
pub struct Cascade {
    config: Arc<ClassifierConfig>,
    source: Arc<dyn HtmlSource>,
}

impl Cascade {
    pub fn new(config: Arc<ClassifierConfig>, source: Arc<dyn HtmlSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn is_decided(&self, scores: &ScoreVector) -> bool {
        scores.max() > self.config.threshold()
    }

    pub fn url_stage(&self, url: &str) -> ScoreVector {
        let mut scores = ScoreVector::filled(BASELINE_SCORE);
        if let Some((category, score)) = prefilter(url, self.config.gold()) {
            scores.set(category, score);
        }
        scores
    }

    pub fn content_stage(&self, page: &ParsedPage, html: &str, scores: &mut ScoreVector) {
        score_page(page, html, self.config.gold()).merge_into(scores);
    }

    /// Raises the error score to the rendered-text comparison when that is
    /// the stronger signal.
    pub fn error_stage(&self, page: &ParsedPage, scores: &mut ScoreVector) {
        let rendered = error_score(page, self.config.gold().get(Category::Error));
        if rendered > scores.get(Category::Error) {
            scores.set(Category::Error, rendered);
        }
    }

    /// Gives `uncertain` whatever confidence the best guess lacks.
    pub fn fallback_stage(scores: &mut ScoreVector) {
        let best = scores.max();
        scores.set(Category::Uncertain, 1.0 - best);
    }

    /// Scores `url`, fetching its HTML only if the URL alone is inconclusive.
    /// A failed fetch is appended to `errors` and scoring carries on with
    /// whatever text came back.
    pub async fn score_url(&self, url: &str, errors: &mut Vec<String>) -> Verdict {
        let short_url: String = url.chars().take(MAX_LOGGED_URL_LEN).collect();

        let mut scores = self.url_stage(url);
        if self.is_decided(&scores) {
            debug!(target: "cascade", url = %short_url, "decided from URL");
            return finish(scores, Stage::UrlOnly);
        }

        debug!(target: "cascade", url = %short_url, stage = ?Stage::HtmlFetch, "fetching page");
        let page = self.source.fetch(url, self.config.fetch_mode()).await;
        if !page.ok || page.content.starts_with(HTTP_ERROR) {
            warn!(target: "cascade", url = %short_url, "page fetch failed; scoring degraded content");
            errors.push(url.to_string());
        }

        let parsed = ParsedPage::parse(&page.content);
        self.content_stage(&parsed, &page.content, &mut scores);
        if self.is_decided(&scores) {
            debug!(target: "cascade", url = %short_url, "decided from content");
            return finish(scores, Stage::ContentScoring);
        }

        self.error_stage(&parsed, &mut scores);
        if self.is_decided(&scores) {
            debug!(target: "cascade", url = %short_url, "decided from rendered error text");
            return finish(scores, Stage::ErrorCheck);
        }

        Self::fallback_stage(&mut scores);
        debug!(target: "cascade", url = %short_url, "no stage decided; falling back");
        finish(scores, Stage::Fallback)
    }
}

fn finish(scores: ScoreVector, stage: Stage) -> Verdict {
    Verdict {
        scores: scores.normalized(),
        stage,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use futures::future::BoxFuture;
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        domain::{FetchedPage, GoldWordSet},
        web_content::FetchMode,
    };

    /// In-memory page source that records every request it is asked for.
    #[derive(Default)]
    pub(crate) struct FakePages {
        pages: HashMap<String, FetchedPage>,
        pub(crate) calls: Mutex<Vec<(String, FetchMode)>>,
    }

    impl FakePages {
        pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), FetchedPage::ok(html));
            self
        }

        pub(crate) fn with_failure(mut self, url: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                FetchedPage::failed(format!("{HTTP_ERROR}: 404: not found")),
            );
            self
        }

        pub(crate) fn call_count(&self, url: &str) -> usize {
            self.calls.lock().iter().filter(|(u, _)| u.as_str() == url).count()
        }

        pub(crate) fn modes(&self) -> Vec<FetchMode> {
            self.calls.lock().iter().map(|(_, mode)| *mode).collect()
        }
    }

    impl HtmlSource for FakePages {
        fn fetch<'a>(&'a self, url: &'a str, mode: FetchMode) -> BoxFuture<'a, FetchedPage> {
            Box::pin(async move {
                self.calls.lock().push((url.to_string(), mode));
                self.pages
                    .get(url)
                    .cloned()
                    .unwrap_or_else(|| FetchedPage::ok("<html><body></body></html>"))
            })
        }
    }

    pub(crate) fn sample_gold() -> GoldWordSet {
        GoldWordSet::new()
            .with(Category::Blog, ["blogspot", "wordpress", "tumblr"])
            .with(Category::Forum, ["forum", "thread", "posts", "views", "replies"])
            .with(Category::News, ["world", "politics", "sports", "business", "arts"])
            .with(Category::Error, ["404", "not", "found", "error"])
            .with(Category::Shopping, ["cart", "checkout", "price", "shipping"])
            .with(Category::Classified, ["for sale", "contact", "seller", "posted"])
    }

    fn cascade_with(pages: FakePages) -> (Cascade, Arc<FakePages>) {
        cascade_with_config(ClassifierConfig::new(sample_gold()), pages)
    }

    fn cascade_with_config(config: ClassifierConfig, pages: FakePages) -> (Cascade, Arc<FakePages>) {
        let pages = Arc::new(pages);
        (Cascade::new(Arc::new(config), pages.clone()), pages)
    }

    fn assert_normalized(scores: &ScoreVector) {
        assert!((scores.sum() - 1.0).abs() < 1e-9, "sum = {}", scores.sum());
        assert!(scores.values().iter().all(|v| *v >= 0.0));
    }

    #[tokio::test]
    async fn wiki_url_decides_without_fetch() {
        let (cascade, pages) = cascade_with(FakePages::default());
        let mut errors = Vec::new();
        let url = "http://example.com/wiki/Page";
        let verdict = cascade.score_url(url, &mut errors).await;

        assert_eq!(verdict.label(), Category::Wiki);
        assert_eq!(verdict.stage, Stage::UrlOnly);
        assert_normalized(&verdict.scores);
        assert_eq!(pages.call_count(url), 0);
    }

    #[tokio::test]
    async fn blog_provider_url_never_fetches() {
        let (cascade, pages) = cascade_with(FakePages::default());
        let mut errors = Vec::new();
        let url = "http://kittens.blogspot.com/2016/12/forum-news.html";
        let verdict = cascade.score_url(url, &mut errors).await;

        assert_eq!(verdict.label(), Category::Blog);
        assert!((verdict.scores.get(Category::Blog) - 0.9 / 1.6).abs() < 1e-12);
        assert_eq!(pages.call_count(url), 0);
    }

    #[tokio::test]
    async fn competing_url_names_defer_to_content() {
        let url = "http://example.com/forumnews";
        let html = "<table><tr><td>Forum</td><td>Thread</td><td>Posts</td><td>Views</td><td>Replies</td></tr></table>";
        let (cascade, pages) = cascade_with(FakePages::default().with_page(url, html));

        let raw = cascade.url_stage(url);
        assert!(!cascade.is_decided(&raw));

        let mut errors = Vec::new();
        let verdict = cascade.score_url(url, &mut errors).await;
        assert_eq!(pages.call_count(url), 1);
        assert_eq!(verdict.stage, Stage::ContentScoring);
        assert_eq!(verdict.label(), Category::Forum);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_is_logged_once_and_still_scored() {
        let url = "http://unreachable.example.com/";
        let (cascade, _pages) = cascade_with(FakePages::default().with_failure(url));
        let mut errors = Vec::new();
        let verdict = cascade.score_url(url, &mut errors).await;

        assert_normalized(&verdict.scores);
        assert_eq!(errors, vec![url.to_string()]);
    }

    #[tokio::test]
    async fn inconclusive_pages_fall_back_to_uncertain() {
        let url = "http://example.com/about";
        let html = "<html><body><p>Lorem ipsum dolor sit amet</p></body></html>";
        let (cascade, _pages) = cascade_with(FakePages::default().with_page(url, html));
        let mut errors = Vec::new();
        let verdict = cascade.score_url(url, &mut errors).await;

        assert_eq!(verdict.stage, Stage::Fallback);
        assert_eq!(verdict.label(), Category::Uncertain);
        assert_normalized(&verdict.scores);
    }

    #[tokio::test]
    async fn configured_fetch_mode_reaches_the_source() {
        let url = "http://example.com/about";
        let config = ClassifierConfig::new(sample_gold()).with_fetch_mode(FetchMode::Online);
        let (cascade, pages) = cascade_with_config(config, FakePages::default());
        cascade.score_url(url, &mut Vec::new()).await;
        assert_eq!(pages.modes(), vec![FetchMode::Online]);

        let (cascade, pages) = cascade_with(FakePages::default());
        cascade.score_url(url, &mut Vec::new()).await;
        assert_eq!(pages.modes(), vec![FetchMode::Offline]);
    }

    #[tokio::test]
    async fn rendered_error_text_decides_before_fallback() {
        let url = "http://example.com/missing";
        let gold = GoldWordSet::new().with(
            Category::Error,
            ["404", "not", "found", "error", "page", "missing", "sorry", "unavailable", "oops"],
        );
        let html = format!(
            r#"<html><body><div class="{}">Sorry, 404: page not found or missing</div></body></html>"#,
            "error ".repeat(50)
        );
        let (cascade, _pages) =
            cascade_with_config(ClassifierConfig::new(gold), FakePages::default().with_page(url, &html));

        let verdict = cascade.score_url(url, &mut Vec::new()).await;
        assert_eq!(verdict.stage, Stage::ErrorCheck);
        assert_eq!(verdict.label(), Category::Error);
        assert_normalized(&verdict.scores);
    }

    #[test]
    fn fallback_scales_with_best_guess() {
        let mut scores = ScoreVector::filled(BASELINE_SCORE);
        scores.set(Category::News, 0.35);
        Cascade::fallback_stage(&mut scores);
        assert!((scores.get(Category::Uncertain) - 0.65).abs() < 1e-12);
    }
}
