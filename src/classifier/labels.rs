use std::collections::{BTreeSet, HashSet};

use crate::domain::Category;

/// Collapses plural labels (`forums`, `blogs`) onto the singular form.
///
/// Words in the keep list bypass stemming so `news` does not become `new`.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    keep: HashSet<String>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new(["news"])
    }
}

impl Lemmatizer {
    pub fn new<I, S>(keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep: keep.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lemmatize(&self, label: &str) -> String {
        let label = label.trim().to_lowercase();
        if self.keep.contains(&label) {
            return label;
        }
        match label.strip_suffix('s') {
            Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_string(),
            _ => label,
        }
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Vec<String> {
        labels
            .iter()
            .map(|label| self.lemmatize(label.as_ref()))
            .collect()
    }
}

pub fn undeclared_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels
        .iter()
        .map(|label| label.as_ref().trim())
        .filter(|label| label.parse::<Category>().is_err())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
