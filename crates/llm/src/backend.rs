//! HTTP-backed `LlmGateway` implementation targeting an OpenAI-compatible
//! chat completions endpoint, with one configuration per role.
//!
//! Grounded on the teacher's `OllamaBackend` (`crates/llm/src/backend.rs`):
//! same retry-with-exponential-backoff shape around a single
//! `execute_request` call, same retryable/non-retryable error split. The
//! wire format is adapted from Ollama's `/api/chat` to the more general
//! OpenAI chat-completions shape so `json_mode` (response_format) can be
//! requested, since both Tier-3 fallback and the dialogue turn processor
//! require JSON-mode responses (§4.6, §4.10).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use recept_core::{CoreError, LlmGateway, LlmRequest, LlmResponse, LlmRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::LlmError;

#[derive(Debug, Clone)]
pub struct RoleConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RoleConfig {
    pub fn dialogue(model: impl Into<String>, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            endpoint: endpoint.into(),
            api_key,
            timeout: Duration::from_millis(4_000),
            max_tokens: 220,
            temperature: 0.4,
            max_retries: 1,
            initial_backoff: Duration::from_millis(150),
        }
    }

    pub fn fallback(model: impl Into<String>, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            endpoint: endpoint.into(),
            api_key,
            timeout: Duration::from_millis(5_000),
            max_tokens: 300,
            temperature: 0.2,
            max_retries: 1,
            initial_backoff: Duration::from_millis(150),
        }
    }
}

/// Two live roles per §9: `DialogueLlm` and `FallbackLlm`. `Admin` has no
/// configured backend here and always fails closed — it must never be
/// reachable from the hot path.
pub struct HttpLlmGateway {
    client: Client,
    dialogue: RoleConfig,
    fallback: RoleConfig,
}

impl HttpLlmGateway {
    pub fn new(dialogue: RoleConfig, fallback: RoleConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self { client, dialogue, fallback })
    }

    fn config_for(&self, role: LlmRole) -> Result<&RoleConfig, LlmError> {
        match role {
            LlmRole::DialogueLlm => Ok(&self.dialogue),
            LlmRole::FallbackLlm => Ok(&self.fallback),
            LlmRole::Admin => Err(LlmError::Configuration(
                "admin role has no hot-path backend configured".to_string(),
            )),
        }
    }

    async fn execute_request(
        &self,
        config: &RoleConfig,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let mut builder = self
            .client
            .post(format!("{}/v1/chat/completions", config.endpoint))
            .timeout(config.timeout)
            .json(request);
        if let Some(key) = &config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {body}")));
            }
            return Err(LlmError::Api(body));
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }
}

#[async_trait]
impl LlmGateway for HttpLlmGateway {
    async fn generate(&self, role: LlmRole, request: LlmRequest) -> Result<LlmResponse, CoreError> {
        let config = self
            .config_for(role)
            .map_err(|e| CoreError::LlmUnavailable(format!("{role:?}: {e}")))?;

        let chat_request = ChatCompletionRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: request.system_prompt.clone() },
                ChatMessage { role: "user".to_string(), content: request.user_message.clone() },
            ],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            response_format: request
                .json_mode
                .then(|| ResponseFormat { format_type: "json_object".to_string() }),
        };

        let start = Instant::now();
        let mut last_error = None;
        let mut backoff = config.initial_backoff;

        for attempt in 0..=config.max_retries {
            if attempt > 0 {
                tracing::warn!(role = ?role, attempt, "llm request failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(config, &chat_request).await {
                Ok(result) => {
                    let choice = result.choices.into_iter().next().ok_or_else(|| {
                        CoreError::LlmUnavailable(format!("{role:?}: empty choices array"))
                    })?;
                    return Ok(LlmResponse {
                        text: choice.message.content,
                        prompt_tokens: result.usage.prompt_tokens,
                        completion_tokens: result.usage.completion_tokens,
                        latency_ms: start.elapsed().as_millis() as u64,
                    });
                }
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(CoreError::LlmUnavailable(format!("{role:?}: {e}"))),
            }
        }

        Err(CoreError::LlmUnavailable(format!(
            "{role:?}: {}",
            last_error.map(|e| e.to_string()).unwrap_or_else(|| "max retries exceeded".to_string())
        )))
    }

    fn estimate_cost(&self, response: &LlmResponse) -> f64 {
        (response.prompt_tokens as f64 * 0.0000015) + (response.completion_tokens as f64 * 0.000002)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Usage,
}
