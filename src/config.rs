use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Where save-only commit snapshots are written
    pub output_dir: PathBuf,
    /// Parent directory for throwaway clones (None = system temp dir)
    pub scratch_dir: Option<PathBuf>,
    /// Git personal access token for cloning/pulling private repos
    pub git_token: Option<String>,
    /// Origins allowed by the CORS layer ("*" = any)
    pub cors_origins: Vec<String>,
    /// Reasoning service configuration
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for commit analysis
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Sampling temperature; kept low for literal, repeatable output
    pub temperature: f32,
    /// Per-file cap on diff text embedded in the prompt (None = unbounded)
    pub max_diff_chars: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            output_dir: PathBuf::from("."),
            scratch_dir: None,
            git_token: None,
            cors_origins: vec!["http://localhost:3000".to_string()],
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4".to_string(),
            api_key: None,
            temperature: 0.3,
            max_diff_chars: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source, falling back to
    /// defaults for anything missing or unparseable.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("COMMIT_DETECTIVE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(dir) = var("COMMIT_DETECTIVE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("COMMIT_DETECTIVE_SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(dir));
        }
        if let Some(token) = var("COMMIT_DETECTIVE_GIT_TOKEN") {
            config.git_token = Some(token);
        }
        if let Some(origins) = var("COMMIT_DETECTIVE_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(provider) = var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = var("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(key) = var("LLM_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Some(val) = var("LLM_TEMPERATURE") {
            if let Ok(t) = val.parse() {
                config.llm.temperature = t;
            }
        }
        if let Some(val) = var("LLM_MAX_DIFF_CHARS") {
            if let Ok(v) = val.parse() {
                config.llm.max_diff_chars = Some(v);
            }
        }

        config
    }
}
