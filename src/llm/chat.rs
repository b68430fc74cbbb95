use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{DetectiveError, Result};

/// One turn of a chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Send a chat exchange to the configured provider and return the reply text.
pub async fn complete(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    match config.provider.as_str() {
        "ollama" => call_ollama(client, config, messages).await,
        "openai" => call_openai(client, config, messages).await,
        other => Err(DetectiveError::ReasoningService(format!(
            "Unknown LLM provider: {other}"
        ))),
    }
}

async fn read_error_body(resp: reqwest::Response, provider: &str) -> DetectiveError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    DetectiveError::ReasoningService(format!("{provider} chat API returned {status}: {body}"))
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages,
        stream: false,
        options: OllamaOptions {
            temperature: config.temperature,
        },
    };

    let resp = client.post(&url).json(&req).send().await.map_err(|e| {
        DetectiveError::ReasoningService(format!("Failed to call Ollama chat API: {e}"))
    })?;

    if !resp.status().is_success() {
        return Err(read_error_body(resp, "Ollama").await);
    }

    let body: OllamaChatResponse = resp.json().await.map_err(|e| {
        DetectiveError::ReasoningService(format!("Malformed Ollama chat response: {e}"))
    })?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages,
        temperature: config.temperature,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .map_err(|e| {
            DetectiveError::ReasoningService(format!("Failed to call OpenAI chat API: {e}"))
        })?;

    if !resp.status().is_success() {
        return Err(read_error_body(resp, "OpenAI").await);
    }

    let body: OpenAiChatResponse = resp.json().await.map_err(|e| {
        DetectiveError::ReasoningService(format!("Malformed OpenAI chat response: {e}"))
    })?;
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| DetectiveError::ReasoningService("OpenAI returned no choices".to_string()))
}
