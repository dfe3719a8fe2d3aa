pub mod category;
pub mod types;

pub use category::Category;
pub use types::{FetchedPage, GoldWordSet, ScoreVector, WordSequence};
