use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A commit that touched at least one of the requested source files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
    pub author: String,
    /// Commit time in the committer's own offset
    pub date: DateTime<FixedOffset>,
    /// Every path changed by the commit, relative to the repository root
    pub files: Vec<String>,
    /// Diffs of the requested paths, in request order. Requested paths the
    /// commit did not touch (or whose diff failed) are absent.
    pub diffs: Vec<FileDiff>,
}

/// Unified diff of one path against the commit's first parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub patch: String,
}

impl CommitRecord {
    /// True if any changed path is one of `source_files`.
    pub fn touches_any(&self, source_files: &[String]) -> bool {
        self.files.iter().any(|f| source_files.contains(f))
    }
}

/// A ranked verdict on a single commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub commit_hash: String,
    pub commit_message: String,
    pub relevance_score: f64,
    pub explanation: String,
}

/// POST /api/analyze request body
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub description: String,
    pub source_files: Vec<String>,
    pub current_commit: String,
    pub repository_url: Option<String>,
    #[serde(default)]
    pub save_only: bool,
}

/// Commit entry written by the save-only branch (no diffs).
#[derive(Debug, Clone, Serialize)]
pub struct SavedCommit<'a> {
    pub hash: &'a str,
    pub message: &'a str,
    pub author: &'a str,
    pub date: String,
    pub files: &'a [String],
}

impl<'a> From<&'a CommitRecord> for SavedCommit<'a> {
    fn from(record: &'a CommitRecord) -> Self {
        Self {
            hash: &record.hash,
            message: &record.message,
            author: &record.author,
            date: record.date.to_rfc3339(),
            files: &record.files,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}
