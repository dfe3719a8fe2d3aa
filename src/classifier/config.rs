use crate::{config::ClassifierSettings, domain::GoldWordSet, web_content::FetchMode};

use super::{cascade::BASELINE_SCORE, error::ClassifierError};

pub const DEFAULT_THRESHOLD: f64 = 0.40;
pub const DEFAULT_PARALLEL_MIN_BATCH: usize = 40;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    threshold: f64,
    jobs: usize,
    parallel_min_batch: usize,
    fetch_mode: FetchMode,
    gold: GoldWordSet,
}

impl ClassifierConfig {
    pub fn new(gold: GoldWordSet) -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            jobs: 1,
            parallel_min_batch: DEFAULT_PARALLEL_MIN_BATCH,
            fetch_mode: FetchMode::Offline,
            gold,
        }
    }

    pub fn from_settings(
        settings: &ClassifierSettings,
        gold: GoldWordSet,
    ) -> Result<Self, ClassifierError> {
        let fetch_mode = if settings.offline {
            FetchMode::Offline
        } else {
            FetchMode::Online
        };
        Ok(Self::new(gold)
            .with_threshold(settings.threshold)?
            .with_jobs(settings.jobs)
            .with_parallel_min_batch(settings.parallel_min_batch)
            .with_fetch_mode(fetch_mode))
    }

    /// The threshold must sit at or above the baseline score, or every URL
    /// would be decided before looking at it, and below one half, so the
    /// fallback `uncertain` score always beats the sub-threshold maximum.
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ClassifierError> {
        if !(BASELINE_SCORE..0.5).contains(&threshold) {
            return Err(ClassifierError::InvalidThreshold(threshold));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_parallel_min_batch(mut self, size: usize) -> Self {
        self.parallel_min_batch = size;
        self
    }

    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn parallel_min_batch(&self) -> usize {
        self.parallel_min_batch
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    pub fn gold(&self) -> &GoldWordSet {
        &self.gold
    }
}
