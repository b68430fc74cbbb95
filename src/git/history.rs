//! Commit history filtering and per-file diff extraction

use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{Diff, DiffFormat, DiffOptions, Oid, Repository, Sort};
use std::path::Path;

use super::clone::RepositoryAccessor;
use crate::error::{DetectiveError, Result};
use crate::models::{CommitRecord, FileDiff};

impl RepositoryAccessor {
    /// Every commit newer than `reference_commit` that touched one of
    /// `source_files`, newest first.
    ///
    /// A temporary clone made for this call is removed before returning,
    /// on both the success and the error path.
    pub fn get_commits_after(
        &self,
        reference_commit: &str,
        source_files: &[String],
        repository_url: Option<&str>,
        local_directory: Option<&Path>,
    ) -> Result<Vec<CommitRecord>> {
        let opened = self.open(repository_url, local_directory)?;
        let commits = walk_commits_after(&opened.repo, reference_commit, source_files)
            .map_err(|e| {
                DetectiveError::repo(
                    format!("Failed to walk history of {}", opened.handle.path().display()),
                    e,
                )
            })?;
        tracing::info!(
            "Found {} commits after {reference_commit} touching {} requested files",
            commits.len(),
            source_files.len()
        );
        Ok(commits)
    }
}

/// Walk from HEAD backwards and stop at the reference commit.
///
/// An unresolvable reference means the whole history is walked.
pub fn walk_commits_after(
    repo: &Repository,
    reference_commit: &str,
    source_files: &[String],
) -> Result<Vec<CommitRecord>, git2::Error> {
    let stop_at = resolve_reference(repo, reference_commit);
    if stop_at.is_none() {
        tracing::warn!("Reference commit {reference_commit} not found, walking full history");
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    revwalk.push_head()?;

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid?;
        if Some(oid) == stop_at {
            break;
        }

        let commit = repo.find_commit(oid)?;
        let mut record = CommitRecord {
            hash: oid.to_string(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author: commit.author().name().unwrap_or("Unknown").to_string(),
            date: commit_date(&commit),
            files: changed_files(repo, &commit)?,
            diffs: Vec::new(),
        };
        if !record.touches_any(source_files) {
            continue;
        }

        for path in source_files {
            if !record.files.contains(path) || record.diffs.iter().any(|d| &d.path == path) {
                continue;
            }
            match file_diff(repo, &commit, path) {
                Ok(patch) => record.diffs.push(FileDiff {
                    path: path.clone(),
                    patch,
                }),
                Err(e) => tracing::debug!("Skipping diff of {path} in {oid}: {e}"),
            }
        }

        commits.push(record);
    }

    Ok(commits)
}

/// Resolve a full/short SHA or revision expression to a commit id.
fn resolve_reference(repo: &Repository, reference: &str) -> Option<Oid> {
    if reference.trim().is_empty() {
        return None;
    }
    repo.revparse_single(reference)
        .and_then(|obj| obj.peel_to_commit())
        .map(|c| c.id())
        .ok()
}

/// Diff a commit against its first parent (or the empty tree for a root commit).
fn parent_diff<'r>(
    repo: &'r Repository,
    commit: &git2::Commit<'_>,
    pathspec: Option<&str>,
) -> Result<Diff<'r>, git2::Error> {
    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let mut opts = DiffOptions::new();
    if let Some(path) = pathspec {
        opts.pathspec(path).disable_pathspec_match(true);
    }

    repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))
}

/// Paths added, modified or deleted by a commit.
pub fn changed_files(
    repo: &Repository,
    commit: &git2::Commit<'_>,
) -> Result<Vec<String>, git2::Error> {
    let diff = parent_diff(repo, commit, None)?;
    Ok(diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect())
}

/// Unified patch of one path against the commit's first parent.
pub fn file_diff(
    repo: &Repository,
    commit: &git2::Commit<'_>,
    path: &str,
) -> Result<String, git2::Error> {
    if commit.parent_count() == 0 {
        return Err(git2::Error::from_str("root commit has no parent to diff against"));
    }

    let diff = parent_diff(repo, commit, Some(path))?;
    let mut patch = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            patch.push(line.origin());
        }
        patch.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;

    Ok(patch.trim_end_matches('\n').to_string())
}

fn commit_date(commit: &git2::Commit<'_>) -> DateTime<FixedOffset> {
    let time = commit.time();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or(Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}
