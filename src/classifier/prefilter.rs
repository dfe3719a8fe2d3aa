use crate::domain::{Category, GoldWordSet};

pub const URL_MATCH_SCORE: f64 = 0.9;

const CONTESTED_NAMES: [(&str, Category); 3] = [
    ("forum", Category::Forum),
    ("blog", Category::Blog),
    ("news", Category::News),
];

pub fn url_has<S: AsRef<str>>(url: &str, words: &[S]) -> bool {
    words.iter().any(|word| url.contains(word.as_ref()))
}

/// `wiki` wins outright. Otherwise exactly one of `forum`, `blog` or `news`
/// must be present; zero or several matches give `Uncertain`.
pub fn name_in_url(url: &str) -> Category {
    if url.contains("wiki") {
        return Category::Wiki;
    }
    let mut matched = CONTESTED_NAMES
        .iter()
        .filter(|(name, _)| url.contains(*name));
    match (matched.next(), matched.next()) {
        (Some((_, category)), None) => *category,
        _ => Category::Uncertain,
    }
}

/// URL-only verdict: a blog-provider keyword first, then the category name
/// check. `None` means the URL says nothing conclusive.
pub fn prefilter(url: &str, gold: &GoldWordSet) -> Option<(Category, f64)> {
    let url = url.to_lowercase();
    if url_has(&url, gold.get(Category::Blog)) {
        return Some((Category::Blog, URL_MATCH_SCORE));
    }
    match name_in_url(&url) {
        Category::Uncertain => None,
        category => Some((category, URL_MATCH_SCORE)),
    }
}
