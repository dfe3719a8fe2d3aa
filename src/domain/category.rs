use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page types the classifier can assign, in column order.
///
/// Declaration order matters: it fixes the score vector layout and breaks
/// argmax ties (first declared wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Blog,
    Wiki,
    News,
    Forum,
    Classified,
    Shopping,
    Error,
    Uncertain,
}

impl Category {
    pub const COUNT: usize = 8;

    pub const ALL: [Category; Category::COUNT] = [
        Category::Blog,
        Category::Wiki,
        Category::News,
        Category::Forum,
        Category::Classified,
        Category::Shopping,
        Category::Error,
        Category::Uncertain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Blog => "blog",
            Category::Wiki => "wiki",
            Category::News => "news",
            Category::Forum => "forum",
            Category::Classified => "classified",
            Category::Shopping => "shopping",
            Category::Error => "error",
            Category::Uncertain => "uncertain",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown page category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
