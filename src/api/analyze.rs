use axum::extract::State;
use axum::Json;
use chrono::Local;
use std::path::Path;

use super::ApiError;
use crate::error::{DetectiveError, Result};
use crate::llm::analyze_commits;
use crate::models::{AnalysisResult, AnalyzeRequest, CommitRecord, SavedCommit};
use crate::state::AppState;

/// POST /api/analyze - Collect commits after `current_commit` that touched
/// `source_files`, then either rank them with the LLM or (with `save_only`)
/// write them to disk.
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Vec<AnalysisResult>>, ApiError> {
    let req = validate(req)?;

    let accessor = state.accessor.clone();
    let reference = req.current_commit.clone();
    let source_files = req.source_files.clone();
    let url = req.repository_url.clone();
    // Local checkouts are a library option only; requests never name server paths.
    let commits = tokio::task::spawn_blocking(move || {
        accessor.get_commits_after(&reference, &source_files, url.as_deref(), None)
    })
    .await
    .map_err(|e| DetectiveError::RepositoryAccess(format!("History task failed: {e}")))??;

    if req.save_only {
        let summary = save_commits(&state.config.output_dir, &commits).await?;
        return Ok(Json(vec![summary]));
    }

    let results =
        analyze_commits(&state.http_client, &state.config.llm, &req.description, &commits).await?;
    tracing::info!("Ranked {} of {} commits", results.len(), commits.len());
    Ok(Json(results))
}

/// Trim fields, drop blank file entries and reject unusable requests.
fn validate(mut req: AnalyzeRequest) -> Result<AnalyzeRequest> {
    req.current_commit = req.current_commit.trim().to_string();
    if req.current_commit.is_empty() {
        return Err(DetectiveError::InvalidRequest(
            "current_commit is required".to_string(),
        ));
    }

    req.source_files = req
        .source_files
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if req.source_files.is_empty() {
        return Err(DetectiveError::InvalidRequest(
            "At least one source file is required".to_string(),
        ));
    }

    if !req.save_only && req.description.trim().is_empty() {
        return Err(DetectiveError::InvalidRequest(
            "An issue description is required".to_string(),
        ));
    }

    req.repository_url = req
        .repository_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    if let Some(url) = &req.repository_url {
        // Keeps requests from cloning arbitrary paths off the server's disk
        let allowed = ["https://", "http://", "git://", "ssh://", "git@"]
            .iter()
            .any(|p| url.starts_with(p));
        if !allowed {
            return Err(DetectiveError::InvalidRequest(
                "Only https://, http://, git://, ssh:// and git@ URLs are allowed".to_string(),
            ));
        }
    }

    Ok(req)
}

/// Write commit metadata to `commits_<YYYYMMDD_HHMMSS>.json` and describe
/// the result as a single synthetic analysis entry.
pub async fn save_commits(output_dir: &Path, commits: &[CommitRecord]) -> Result<AnalysisResult> {
    let filename = format!("commits_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
    let saved: Vec<SavedCommit<'_>> = commits.iter().map(SavedCommit::from).collect();
    let data =
        serde_json::to_string_pretty(&saved).map_err(|e| DetectiveError::Save(e.to_string()))?;

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| DetectiveError::Save(format!("{}: {e}", output_dir.display())))?;
    let path = output_dir.join(&filename);
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| DetectiveError::Save(format!("{}: {e}", path.display())))?;
    tracing::info!("Saved {} commits to {}", commits.len(), path.display());

    let newest = commits.first();
    Ok(AnalysisResult {
        commit_hash: newest.map(|c| c.hash.clone()).unwrap_or_default(),
        commit_message: newest.map(|c| c.message.clone()).unwrap_or_default(),
        relevance_score: 1.0,
        explanation: format!("Saved {} commits to {filename}", commits.len()),
    })
}
