use std::ops::Range;

use chrono::Local;
use futures::future::try_join_all;

use crate::domain::ScoreVector;

use super::{cascade::Cascade, error::ClassifierError};

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub rows: Vec<ScoreVector>,
    pub errors: Vec<String>,
}

impl BatchOutcome {
    fn append(&mut self, mut other: BatchOutcome) {
        self.rows.append(&mut other.rows);
        self.errors.append(&mut other.errors);
    }
}

/// Splits `0..len` into `jobs` contiguous, near-equal ranges. Chunk `i`
/// starts at `i * len / jobs`; the last one ends at `len`.
pub fn partition(len: usize, jobs: usize) -> Vec<Range<usize>> {
    let jobs = jobs.max(1);
    let starts: Vec<usize> = (0..jobs).map(|i| i * len / jobs).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| start..starts.get(i + 1).copied().unwrap_or(len))
        .collect()
}

async fn score_chunk(cascade: &Cascade, urls: &[String]) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        rows: Vec::with_capacity(urls.len()),
        errors: Vec::new(),
    };
    for url in urls {
        let verdict = cascade.score_url(url, &mut outcome.errors).await;
        outcome.rows.push(verdict.scores);
    }
    outcome
}

/// Scores every URL, fanning out over `jobs` workers once the batch is big
/// enough to be worth it. Rows come back in input order; worker error lists
/// are only merged after every worker has finished.
pub async fn score_batch(
    cascade: &Cascade,
    urls: &[String],
) -> Result<BatchOutcome, ClassifierError> {
    let config = cascade.config();
    let jobs = if urls.len() < config.parallel_min_batch() {
        1
    } else {
        config.jobs()
    };

    let started = Local::now();
    let outcome = if jobs <= 1 {
        score_chunk(cascade, urls).await
    } else {
        let handles = partition(urls.len(), jobs)
            .into_iter()
            .map(|range| {
                let cascade = cascade.clone();
                let chunk = urls[range].to_vec();
                tokio::spawn(async move { score_chunk(&cascade, &chunk).await })
            })
            .collect::<Vec<_>>();

        let mut merged = BatchOutcome::default();
        for chunk in try_join_all(handles).await? {
            merged.append(chunk);
        }
        merged
    };

    let elapsed = Local::now() - started;
    tracing::info!(
        target: "batch",
        jobs,
        urls = urls.len(),
        failed_fetches = outcome.errors.len(),
        started = %started.format("%H:%M:%S"),
        elapsed_secs = elapsed.num_milliseconds() as f64 / 1000.0,
        "TIMING"
    );
    Ok(outcome)
}
