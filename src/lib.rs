//! # commit-detective
//!
//! An HTTP service that answers "which commits since a known-good point
//! plausibly fixed this issue in these files?"
//!
//! ## Pipeline
//!
//! ```text
//!   POST /api/analyze
//!          │
//!          ▼
//!  ┌───────────────────────┐
//!  │  Repository Accessor  │  open cwd / reuse+pull local dir /
//!  │                       │  clone to local dir / clone to temp dir
//!  └──────────┬────────────┘
//!             │ walk HEAD → reference commit (exclusive),
//!             │ keep commits touching requested files,
//!             │ per-file diff vs first parent
//!             ▼
//!  ┌───────────────────────┐        save_only
//!  │   Evidence Formatter  │ ◄───── (bypass: write commits_<ts>.json)
//!  │  issue + commit diffs │
//!  └──────────┬────────────┘
//!             ▼
//!  ┌───────────────────────┐
//!  │   Relevance Ranker    │  chat model → first `[`..last `]` →
//!  │                       │  join on hash → stable sort by score
//!  └──────────┬────────────┘
//!             ▼
//!   [{commit_hash, commit_message, relevance_score, explanation}]
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, clones and LLM
//! - [`models`] - `CommitRecord`, `AnalysisResult` and request/response types
//! - [`error`] - `DetectiveError`, one variant per failure kind
//! - [`git`] - Working-copy resolution, clone/pull, filtered history walk
//! - [`llm::prompt`] - Prompt construction from commit evidence
//! - [`llm::chat`] - Chat completion via OpenAI-compatible or Ollama APIs
//! - [`llm::analyze`] - Reply recovery, hash join and ranking
//! - [`api`] - Axum handlers, CORS and error mapping
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod models;
pub mod state;

pub use error::{DetectiveError, Result};
