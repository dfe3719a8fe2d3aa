use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::domain::WordSequence;

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid non-alphanumeric regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    pub name: String,
    pub classes: Vec<String>,
    pub text: String,
}

pub fn normalize_words(text: &str) -> WordSequence {
    NON_ALNUM
        .replace_all(text, " ")
        .split_whitespace()
        .map(|word| word.to_ascii_lowercase())
        .collect()
}

pub struct ParsedPage {
    document: Html,
}

impl ParsedPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Every element named in `tags`, in document order. Nested matches each
    /// appear with their own full subtree text.
    pub fn extract(&self, tags: &[&str]) -> Vec<TagNode> {
        let Some(selector) = scope_selector(tags) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .map(|element| TagNode {
                name: element.value().name().to_string(),
                classes: element.value().classes().map(str::to_string).collect(),
                text: element.text().collect(),
            })
            .collect()
    }

    pub fn contents(&self, tags: &[&str]) -> WordSequence {
        self.extract(tags)
            .iter()
            .flat_map(|node| normalize_words(&node.text))
            .collect()
    }
}

fn scope_selector(tags: &[&str]) -> Option<Selector> {
    if tags.is_empty() {
        return None;
    }
    match Selector::parse(&tags.join(", ")) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!(target: "extract", error = ?err, ?tags, "invalid tag scope");
            None
        }
    }
}

pub fn extract_tags(tags: &[&str], html: &str) -> Vec<TagNode> {
    ParsedPage::parse(html).extract(tags)
}

pub fn get_contents(tags: &[&str], html: &str) -> WordSequence {
    ParsedPage::parse(html).contents(tags)
}
