use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};

use crate::domain::{Category, GoldWordSet};

/// Reads one word per line from `path`, lowercased. A missing file is an
/// empty list.
pub fn read_gold_file(path: &Path) -> Result<Vec<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(
                target: "gold_words",
                path = %path.display(),
                "gold word file not found; using empty list"
            );
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect())
}

impl GoldWordSet {
    pub fn load(dir: &Path) -> Result<Self> {
        let mut gold = GoldWordSet::new();
        for category in Category::ALL {
            let path = dir.join(format!("{}.txt", category.as_str()));
            gold.insert(category, read_gold_file(&path)?);
        }
        tracing::info!(
            target: "gold_words",
            dir = %dir.display(),
            words = gold.total_words(),
            "gold words loaded"
        );
        Ok(gold)
    }
}
