//! OpenAI-compatible chat completions gateway.
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, Azure-style proxies, Ollama, vLLM). Provider status codes are
//! mapped onto [`GenerationError`] so the turn executor can tell transient
//! failures from permanent ones.

use agora_application::ports::llm_gateway::{
    CompletionRequest, GenerationError, LlmGateway, ResponseFormat,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Longest error body carried into an error message
const ERROR_BODY_CHARS: usize = 300;

/// Gateway for OpenAI-compatible HTTP APIs
#[derive(Clone)]
pub struct OpenAiCompatibleGateway {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleGateway {
    pub fn new(base_url: &str, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: None,
            model: model.into(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Use a client with a transport-level timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GenerationError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Other(format!("HTTP client setup failed: {e}")))?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body(&self, request: CompletionRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt,
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            response_format: match request.format {
                ResponseFormat::Json => Some(ResponseFormatBody {
                    kind: "json_object".to_string(),
                }),
                ResponseFormat::Text => None,
            },
        }
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError> {
        let body = self.body(request);
        let mut call = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        let content = extract_content(parsed)?;
        debug!("{} returned {} bytes", self.model, content.len());
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Map a non-success HTTP status onto the generation error taxonomy
pub(crate) fn map_http_error(status: StatusCode, body: &str) -> GenerationError {
    let detail = format!(
        "HTTP {}: {}",
        status.as_u16(),
        body.chars().take(ERROR_BODY_CHARS).collect::<String>()
    );
    match status.as_u16() {
        429 => GenerationError::RateLimited(detail),
        503 | 529 => GenerationError::ResourceExhausted(detail),
        400 | 401 | 403 | 404 | 422 => GenerationError::Rejected(detail),
        408 | 504 => GenerationError::Timeout,
        _ => GenerationError::Other(detail),
    }
}

fn extract_content(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("no choices returned".to_string()))?;
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(GenerationError::Rejected(
            "response blocked by content filter".to_string(),
        ));
    }
    Ok(choice.message.content.unwrap_or_default())
}

// ==================== Wire types ====================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
