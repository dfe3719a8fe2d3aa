use crate::domain::{Category, GoldWordSet, ScoreVector, WordSequence};

use super::{
    extract::{normalize_words, ParsedPage},
    similarity::similarity,
};

const FORUM_TAGS: &[&str] = &["tr", "td", "table", "div", "p", "article"];
const NEWS_TAGS: &[&str] = &["nav", "header", "footer"];
const ERROR_TAGS: &[&str] = &["tr", "td", "table", "div", "p", "article", "body"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineScores {
    pub forum: f64,
    pub news: f64,
    pub error: f64,
    pub shopping: f64,
    pub classified: f64,
}

impl CosineScores {
    pub fn entries(&self) -> [(Category, f64); 5] {
        [
            (Category::Forum, self.forum),
            (Category::News, self.news),
            (Category::Error, self.error),
            (Category::Shopping, self.shopping),
            (Category::Classified, self.classified),
        ]
    }

    pub fn merge_into(&self, scores: &mut ScoreVector) {
        for (category, value) in self.entries() {
            scores.set(category, value);
        }
    }
}

/// Replaces each word by every forum gold word it contains, so `forums` and
/// `forum_threads` both count as `forum`. Words matching nothing are dropped.
pub fn canonical_forum_words(words: &[String], forum_gold: &[String]) -> WordSequence {
    words
        .iter()
        .flat_map(|word| {
            forum_gold
                .iter()
                .filter(move |gold| word.contains(gold.as_str()))
                .cloned()
        })
        .collect()
}

pub fn forum_score(page: &ParsedPage, forum_gold: &[String]) -> f64 {
    let contents = page.contents(FORUM_TAGS);
    let canonical = canonical_forum_words(&contents, forum_gold);
    tracing::debug!(
        target: "scorers",
        matched = canonical.len(),
        sample = ?canonical.iter().take(10).collect::<Vec<_>>(),
        "forum canonical words"
    );
    similarity(&canonical, forum_gold)
}

pub fn news_score(page: &ParsedPage, news_gold: &[String]) -> f64 {
    similarity(&page.contents(NEWS_TAGS), news_gold)
}

/// Rendered-text error check. Markup noise such as repeated class names can
/// drown the whole-document comparison, so the cascade runs this before
/// giving up on a page.
pub fn error_score(page: &ParsedPage, error_gold: &[String]) -> f64 {
    similarity(&page.contents(ERROR_TAGS), error_gold)
}

pub fn bigrams(words: &[String]) -> WordSequence {
    words
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect()
}

/// Forum and news look at tag-scoped text. Error, shopping and classified
/// look at the whole normalized document; classified also sees bigrams since
/// ad copy leans on phrases like "for sale".
pub fn get_cosines(html: &str, gold: &GoldWordSet) -> CosineScores {
    score_page(&ParsedPage::parse(html), html, gold)
}

pub fn score_page(page: &ParsedPage, html: &str, gold: &GoldWordSet) -> CosineScores {
    let forum = forum_score(page, gold.get(Category::Forum));
    let news = news_score(page, gold.get(Category::News));

    let mut words = normalize_words(html);
    let error = similarity(&words, gold.get(Category::Error));
    let shopping = similarity(&words, gold.get(Category::Shopping));

    let pairs = bigrams(&words);
    words.extend(pairs);
    let classified = similarity(&words, gold.get(Category::Classified));

    CosineScores {
        forum,
        news,
        error,
        shopping,
        classified,
    }
}
