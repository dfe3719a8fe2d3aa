use std::{
    io::{self, Write},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;

use crate::{
    classifier::{ClassifierConfig, Lemmatizer, PageClassifier, UrlBatch},
    config::AppConfig,
    domain::{Category, GoldWordSet, ScoreVector},
    infrastructure::directories::ResolvedPaths,
    web_content::WebPageFetcher,
};

pub struct ClassifierApp {
    classifier: PageClassifier,
}

#[derive(Debug, Serialize)]
struct ResultLine<'a> {
    url: &'a str,
    label: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected: Option<&'a str>,
    scores: &'a ScoreVector,
}

impl ClassifierApp {
    pub fn initialize(config: &AppConfig, paths: &ResolvedPaths) -> Result<Self> {
        let gold = GoldWordSet::load(&paths.keywords_dir)?;
        let classifier_config = ClassifierConfig::from_settings(&config.classifier, gold)?;

        let http_client = Client::builder()
            .user_agent(format!("webpage-classifier/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let fetcher = Arc::new(WebPageFetcher::new(
            http_client,
            config.web.clone(),
            paths.pages_dir.clone(),
        )?);

        Ok(Self {
            classifier: PageClassifier::new(classifier_config, fetcher),
        })
    }

    pub async fn run(&self, input: &Path) -> Result<()> {
        let batch = read_batch(input)?;
        tracing::info!(
            target: "app",
            input = %input.display(),
            urls = batch.urls.len(),
            labeled = batch.labels.is_some(),
            "classifying"
        );

        let expected = batch
            .labels
            .as_ref()
            .map(|labels| Lemmatizer::default().transform(labels));
        if let Some(labels) = &expected {
            self.classifier.fit(&batch.urls, labels)?;
        }

        let rows = self.classifier.predict_proba(&batch.urls).await?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        for (position, (url, scores)) in batch.urls.iter().zip(&rows).enumerate() {
            let line = ResultLine {
                url,
                label: scores.argmax(),
                expected: expected
                    .as_ref()
                    .and_then(|labels| labels.get(position))
                    .map(String::as_str),
                scores,
            };
            serde_json::to_writer(&mut out, &line)?;
            writeln!(out)?;
        }
        out.flush()?;

        if let Some(labels) = &expected {
            let correct = rows
                .iter()
                .zip(labels)
                .filter(|(scores, label)| scores.argmax().as_str() == label.as_str())
                .count();
            let accuracy = if rows.is_empty() {
                0.0
            } else {
                correct as f64 / rows.len() as f64
            };
            tracing::info!(
                target: "app",
                total = rows.len(),
                correct,
                accuracy = %format!("{accuracy:.2}"),
                "evaluation finished"
            );
        }

        let errors = self.classifier.errors();
        if !errors.is_empty() {
            tracing::warn!(
                target: "app",
                count = errors.len(),
                "pages could not be fetched; refresh their HTML or label them as error"
            );
            for url in &errors {
                tracing::warn!(target: "app", url = %url, "fetch error");
            }
        }
        Ok(())
    }
}

fn read_batch(path: &Path) -> Result<UrlBatch> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL list {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        Ok(UrlBatch::from_json(value)?)
    } else {
        Ok(UrlBatch::from_lines(&text))
    }
}
