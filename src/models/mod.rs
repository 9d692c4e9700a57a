//! Data models for vocabfetch.

mod stats;
mod word_entry;

pub use stats::RunStatistics;
pub use word_entry::{is_empty_value, WordEntry, NULL_TOKENS};
