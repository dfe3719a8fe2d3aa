use std::collections::HashMap;

use serde::{ser::SerializeMap, Serialize, Serializer};

use super::Category;

pub type WordSequence = Vec<String>;

/// Raw HTML handed back by a page source. `ok` is false when the content is
/// a fetch diagnostic rather than the page itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub content: String,
    pub ok: bool,
}

impl FetchedPage {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ok: true,
        }
    }

    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ok: false,
        }
    }
}

/// Reference words per category. Categories without a list score against an
/// empty slice.
#[derive(Debug, Clone, Default)]
pub struct GoldWordSet {
    words: HashMap<Category, Vec<String>>,
}

impl GoldWordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S>(&mut self, category: Category, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaned = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        self.words.insert(category, cleaned);
    }

    pub fn with<I, S>(mut self, category: Category, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(category, words);
        self
    }

    pub fn get(&self, category: Category) -> &[String] {
        self.words
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total_words(&self) -> usize {
        self.words.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreVector {
    values: [f64; Category::COUNT],
}

impl ScoreVector {
    pub fn filled(value: f64) -> Self {
        Self {
            values: [value; Category::COUNT],
        }
    }

    pub fn get(&self, category: Category) -> f64 {
        self.values[category.index()]
    }

    pub fn set(&mut self, category: Category, value: f64) {
        self.values[category.index()] = value;
    }

    pub fn values(&self) -> &[f64; Category::COUNT] {
        &self.values
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Highest-scoring category; ties go to the first declared category.
    pub fn argmax(&self) -> Category {
        let mut best = Category::ALL[0];
        for category in Category::ALL.iter().skip(1) {
            if self.get(*category) > self.get(best) {
                best = *category;
            }
        }
        best
    }

    /// Scales the scores to sum to one. An all-zero vector puts all of its
    /// mass on `uncertain`.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if total <= 0.0 {
            let mut degenerate = Self::filled(0.0);
            degenerate.set(Category::Uncertain, 1.0);
            return degenerate;
        }
        let mut values = self.values;
        for value in values.iter_mut() {
            *value /= total;
        }
        Self { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL
            .iter()
            .map(move |category| (*category, self.get(*category)))
    }
}

impl Serialize for ScoreVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::COUNT))?;
        for (category, value) in self.iter() {
            map.serialize_entry(category.as_str(), &value)?;
        }
        map.end()
    }
}
