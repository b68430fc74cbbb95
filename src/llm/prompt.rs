//! Prompt construction for commit relevance analysis.

use std::fmt::Write;

use crate::models::CommitRecord;

/// System turn sent with every analysis request.
pub const SYSTEM_PROMPT: &str = "You are a code analysis expert that helps identify which \
commits might fix a given issue.";

const INSTRUCTIONS: &str = "\
For each commit that might fix the issue:
1. Assign a relevance score from 0.0 to 1.0
2. Provide a brief explanation of why this commit might fix the issue
3. Format your response as a JSON array of objects with the following structure:
[
  {
    \"commit_hash\": \"hash\",
    \"relevance_score\": 0.0,
    \"explanation\": \"explanation\"
  }
]
";

/// Build the analysis prompt with every diff embedded in full.
pub fn build_prompt(issue_description: &str, commits: &[CommitRecord]) -> String {
    build_prompt_with_limit(issue_description, commits, None)
}

/// Build the analysis prompt, cutting each per-file diff at `max_diff_chars`
/// characters when a limit is given.
pub fn build_prompt_with_limit(
    issue_description: &str,
    commits: &[CommitRecord],
    max_diff_chars: Option<usize>,
) -> String {
    let mut prompt = format!(
        "Please analyze the following issue and commits to determine which commits might fix the issue.\n\n\
         Issue Description:\n{issue_description}\n\n\
         Commits to analyze:\n"
    );

    for commit in commits {
        // Writing to a String cannot fail.
        let _ = write!(
            prompt,
            "\nCommit: {}\nMessage: {}\nFiles changed: {}\nDiff:\n",
            commit.hash,
            commit.message,
            commit.files.join(", ")
        );
        for diff in &commit.diffs {
            if diff.patch.is_empty() {
                continue;
            }
            let _ = write!(
                prompt,
                "\nFile: {}\n{}\n",
                diff.path,
                truncate_diff(&diff.patch, max_diff_chars)
            );
        }
        prompt.push_str("\n\n");
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}

fn truncate_diff(diff: &str, max_chars: Option<usize>) -> String {
    match max_chars {
        Some(max) => match diff.char_indices().nth(max) {
            Some((cut, _)) => format!("{}\n... [diff truncated]", &diff[..cut]),
            None => diff.to_string(),
        },
        None => diff.to_string(),
    }
}
