use serde::Deserialize;

use crate::config::LlmConfig;
use crate::error::{DetectiveError, Result};
use crate::llm::chat::{self, ChatMessage};
use crate::llm::prompt::{build_prompt_with_limit, SYSTEM_PROMPT};
use crate::models::{AnalysisResult, CommitRecord};

/// Shortest abbreviated hash accepted when joining model output to commits.
const MIN_HASH_PREFIX: usize = 7;

/// One entry of the model's JSON array.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Verdict {
    pub commit_hash: String,
    pub relevance_score: f64,
    pub explanation: String,
}

/// Rank `commits` by how likely each one fixes the described issue.
///
/// No request is made for an empty commit list.
pub async fn analyze_commits(
    client: &reqwest::Client,
    config: &LlmConfig,
    issue_description: &str,
    commits: &[CommitRecord],
) -> Result<Vec<AnalysisResult>> {
    if commits.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_prompt_with_limit(issue_description, commits, config.max_diff_chars);
    tracing::info!(
        "Asking {} to rank {} commits ({} prompt chars)",
        config.chat_model,
        commits.len(),
        prompt.len()
    );

    let reply = chat::complete(
        client,
        config,
        vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
    )
    .await?;

    let verdicts = parse_verdicts(&reply).inspect_err(|e| {
        tracing::warn!("{e}. Raw: {}", excerpt(&reply, 500));
    })?;
    Ok(rank(verdicts, commits))
}

/// Locate the first `[` ... last `]` span in free text.
pub fn extract_json_array(reply: &str) -> Result<&str> {
    let start = reply.find('[');
    let end = reply.rfind(']');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(DetectiveError::ResponseParse(
            "Could not find JSON array in response".to_string(),
        )),
    }
}

/// Parse the model's reply into verdicts. Missing or mistyped fields and
/// non-finite scores fail the whole reply; finite scores are clamped to [0, 1].
pub fn parse_verdicts(reply: &str) -> Result<Vec<Verdict>> {
    let array = extract_json_array(reply)?;
    let verdicts: Vec<Verdict> = serde_json::from_str(array)
        .map_err(|e| DetectiveError::ResponseParse(format!("Malformed JSON array: {e}")))?;

    verdicts
        .into_iter()
        .map(|mut v| {
            if !v.relevance_score.is_finite() {
                return Err(DetectiveError::ResponseParse(format!(
                    "Relevance score for {} is not a number",
                    v.commit_hash
                )));
            }
            v.relevance_score = v.relevance_score.clamp(0.0, 1.0);
            Ok(v)
        })
        .collect()
}

/// Join verdicts onto the commits they name and sort by score, highest first.
///
/// Verdicts naming a hash we did not send are dropped. The sort is stable, so
/// equal scores keep the model's order.
pub fn rank(verdicts: Vec<Verdict>, commits: &[CommitRecord]) -> Vec<AnalysisResult> {
    let total = verdicts.len();
    let mut results: Vec<AnalysisResult> = verdicts
        .into_iter()
        .filter_map(|v| {
            find_commit(commits, &v.commit_hash).map(|c| AnalysisResult {
                commit_hash: c.hash.clone(),
                commit_message: c.message.clone(),
                relevance_score: v.relevance_score,
                explanation: v.explanation,
            })
        })
        .collect();

    if results.len() < total {
        tracing::warn!(
            "Dropped {} of {total} verdicts naming unknown commits",
            total - results.len()
        );
    }

    results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    results
}

/// Exact hash match first, then a unique abbreviated prefix.
fn find_commit<'a>(commits: &'a [CommitRecord], hash: &str) -> Option<&'a CommitRecord> {
    let hash = hash.trim();
    if let Some(c) = commits.iter().find(|c| c.hash == hash) {
        return Some(c);
    }
    if hash.len() < MIN_HASH_PREFIX {
        return None;
    }
    let mut matches = commits.iter().filter(|c| c.hash.starts_with(hash));
    match (matches.next(), matches.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn commit(hash: &str) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            message: format!("msg {hash}"),
            author: "Dev".to_string(),
            date: DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap(),
            files: vec!["x.py".to_string()],
            diffs: Vec::new(),
        }
    }

    fn verdict(hash: &str, score: f64) -> Verdict {
        Verdict {
            commit_hash: hash.to_string(),
            relevance_score: score,
            explanation: format!("because {hash}"),
        }
    }

    #[test]
    fn test_extract_array_surrounded_by_prose() {
        let reply = "Sure! Here is my analysis:\n[\n {\"a\": 1}\n]\nLet me know.";
        assert_eq!(extract_json_array(reply).unwrap(), "[\n {\"a\": 1}\n]");
    }

    #[test]
    fn test_extract_array_from_markdown_fence() {
        let reply = "```json\n[{\"commit_hash\": \"a\", \"relevance_score\": 0.5, \"explanation\": \"e\"}]\n```";
        let verdicts = parse_verdicts(reply).unwrap();
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].commit_hash, "a");
    }

    #[test]
    fn test_no_array_is_parse_error() {
        let err = parse_verdicts("I could not find any relevant commits.").unwrap_err();
        assert!(matches!(err, DetectiveError::ResponseParse(_)));

        let err = parse_verdicts("] backwards [").unwrap_err();
        assert!(matches!(err, DetectiveError::ResponseParse(_)));
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let err = parse_verdicts(r#"[{"commit_hash": "a1", "explanation": "no score"}]"#)
            .unwrap_err();
        assert!(matches!(err, DetectiveError::ResponseParse(_)));
    }

    #[test]
    fn test_empty_array_is_ok() {
        assert!(parse_verdicts("Nothing relevant: []").unwrap().is_empty());
    }

    #[test]
    fn test_scores_are_clamped() {
        let verdicts = parse_verdicts(
            r#"[{"commit_hash": "a", "relevance_score": 1.7, "explanation": ""},
                {"commit_hash": "b", "relevance_score": -0.2, "explanation": ""}]"#,
        )
        .unwrap();
        assert_eq!(verdicts[0].relevance_score, 1.0);
        assert_eq!(verdicts[1].relevance_score, 0.0);
    }

    #[test]
    fn test_rank_sorts_descending_and_keeps_tie_order() {
        let commits = vec![commit("c0"), commit("c1"), commit("c2"), commit("c3")];
        let verdicts = vec![
            verdict("c0", 0.2),
            verdict("c1", 0.9),
            verdict("c2", 0.9),
            verdict("c3", 0.1),
        ];
        let ranked = rank(verdicts, &commits);
        let order: Vec<&str> = ranked.iter().map(|r| r.commit_hash.as_str()).collect();
        assert_eq!(order, vec!["c1", "c2", "c0", "c3"]);
    }

    #[test]
    fn test_rank_drops_unknown_hashes() {
        let commits = vec![commit("a1"), commit("b2")];
        let ranked = rank(vec![verdict("zz", 0.99), verdict("b2", 0.5)], &commits);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].commit_hash, "b2");
        assert_eq!(ranked[0].commit_message, "msg b2");
        assert_eq!(ranked[0].explanation, "because b2");
    }

    #[test]
    fn test_rank_accepts_unique_abbreviated_hash() {
        let full = "0123456789abcdef0123456789abcdef01234567";
        let commits = vec![commit(full), commit("fedcba9876543210fedcba9876543210fedcba98")];
        let ranked = rank(vec![verdict("0123456", 0.8)], &commits);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].commit_hash, full);

        // Too short to trust
        assert!(rank(vec![verdict("0123", 0.8)], &commits).is_empty());
    }

    #[test]
    fn test_rank_rejects_ambiguous_prefix() {
        let commits = vec![
            commit("abcdef01aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            commit("abcdef01bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
        ];
        assert!(rank(vec![verdict("abcdef01", 0.8)], &commits).is_empty());
    }

    #[tokio::test]
    async fn test_empty_commits_skip_the_network() {
        // An unroutable base URL would fail if a request were attempted.
        let config = LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..LlmConfig::default()
        };
        let results = analyze_commits(&reqwest::Client::new(), &config, "issue", &[])
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("hi", 10), "hi");
    }
}
