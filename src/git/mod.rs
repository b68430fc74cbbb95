//! Repository access: resolving a request to a working copy, then walking
//! its history for commits that touched the requested files.

pub mod clone;
pub mod history;

pub use clone::{clone_repo, pull_repo, RepositoryAccessor};
pub use history::{changed_files, file_diff, walk_commits_after};
