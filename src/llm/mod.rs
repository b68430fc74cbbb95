//! Relevance ranking through an external chat model.

pub mod analyze;
pub mod chat;
pub mod prompt;

pub use analyze::{analyze_commits, Verdict};
pub use prompt::{build_prompt, build_prompt_with_limit};
