//! Error types for the commit analysis pipeline

use thiserror::Error;

/// Everything that can fail between receiving a request and answering it.
///
/// A per-file diff failure is deliberately absent: the history walk logs it
/// and leaves that file's diff out of the record.
#[derive(Debug, Error)]
pub enum DetectiveError {
    /// Opening, cloning or walking a repository failed
    #[error("Error getting commits: {0}")]
    RepositoryAccess(String),

    /// The reasoning service could not be reached or refused the request
    #[error("Error analyzing commits: {0}")]
    ReasoningService(String),

    /// The reasoning service replied, but not with a usable JSON array
    #[error("Error parsing LLM response: {0}")]
    ResponseParse(String),

    /// Writing a save-only snapshot failed
    #[error("Error saving commits: {0}")]
    Save(String),

    /// The request itself is unusable
    #[error("{0}")]
    InvalidRequest(String),
}

impl DetectiveError {
    pub(crate) fn repo(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::RepositoryAccess(format!("{context}: {err}"))
    }
}

pub type Result<T, E = DetectiveError> = std::result::Result<T, E>;
