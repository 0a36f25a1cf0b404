//! OpenAI-compatible inference backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use notekeeper_core::{
    defaults, ChatBackend, ChatRequest, CoreConfig, EmbeddingBackend, Error, InferenceBackend,
    Result, Vector,
};

use super::error::{to_core_error, CallKind, OpenAIErrorCode};
use super::types::*;

/// Configuration for an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Default model for chat completions.
    pub chat_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature used when a request does not set one.
    pub temperature: Option<f32>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            embed_model: defaults::EMBED_MODEL.to_string(),
            chat_model: defaults::CHAT_MODEL.to_string(),
            embed_dimension: defaults::EMBED_DIMENSION,
            timeout_seconds: defaults::MODEL_TIMEOUT_SECS,
            temperature: None,
        }
    }
}

impl OpenAIConfig {
    /// Endpoint settings from `OPENAI_BASE_URL`, `OPENAI_API_KEY` and
    /// `OPENAI_TIMEOUT`; model names from the core configuration.
    pub fn from_env(core: &CoreConfig) -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| defaults::OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            embed_model: core.embedding_model.name.clone(),
            chat_model: core.chat_model.name.clone(),
            embed_dimension: defaults::EMBED_DIMENSION,
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::MODEL_TIMEOUT_SECS),
            temperature: None,
        }
    }

    /// Same endpoint, pointed at the higher-capability chat model.
    pub fn powerful(&self, powerful_model: &str) -> Self {
        Self {
            chat_model: powerful_model.to_string(),
            temperature: Some(defaults::POWERFUL_TEMPERATURE),
            ..self.clone()
        }
    }
}

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            embed_model = %config.embed_model,
            chat_model = %config.chat_model,
            timeout_secs = config.timeout_seconds,
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Build a POST request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.url(endpoint));
        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }
        req.header("Content-Type", "application/json")
    }

    /// Build a GET request with authentication if configured.
    fn build_get_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(self.url(endpoint));
        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }
        req
    }
}

/// Pass successful responses through; turn anything else into a core error.
async fn check_status(response: reqwest::Response, kind: CallKind) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (message, error_type) = match serde_json::from_str::<OpenAIErrorResponse>(&body) {
        Ok(parsed) => (
            parsed.error.message,
            parsed.error.error_type.or(parsed.error.code).unwrap_or_default(),
        ),
        Err(_) if body.is_empty() => ("Unknown error".to_string(), String::new()),
        Err(_) => (body, String::new()),
    };

    let code = OpenAIErrorCode::from_response(status.as_u16(), &error_type);
    warn!(
        subsystem = "inference",
        component = "openai",
        status = status.as_u16(),
        retryable = code.is_retryable(),
        error = %message,
        "OpenAI request failed"
    );
    Err(to_core_error(
        kind,
        code,
        &format!("OpenAI returned {}: {}", status, message),
    ))
}

/// User message body, with the attachment inlined as a base64 data URL.
///
/// Images go in an `image_url` part; anything else in a `file` part.
pub(crate) fn user_content(request: &ChatRequest) -> MessageContent {
    let Some(media) = &request.media else {
        return MessageContent::Text(request.user.clone());
    };

    let data_url = format!(
        "data:{};base64,{}",
        media.mime_type,
        base64::engine::general_purpose::STANDARD.encode(&media.data)
    );
    let attachment = if media.is_image() {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: data_url },
        }
    } else {
        ContentPart::File {
            file: FileData {
                filename: media
                    .file_name
                    .clone()
                    .unwrap_or_else(|| "attachment".to_string()),
                file_data: data_url,
            },
        }
    };

    MessageContent::Parts(vec![
        ContentPart::Text {
            text: request.user.clone(),
        },
        attachment,
    ])
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "openai", op = "embed_texts", model = %self.config.embed_model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let request = EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: texts.to_vec(),
            encoding_format: Some("float".to_string()),
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;
        let response = check_status(response, CallKind::Embedding).await?;

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        let mut data = result.data;
        if data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);

        let vectors: Vec<Vector> = data
            .into_iter()
            .map(|d| Vector::from(d.embedding))
            .collect();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            result_count = vectors.len(),
            duration_ms = elapsed,
            "Embedding complete"
        );
        if elapsed > defaults::SLOW_CALL_THRESHOLD_MS {
            warn!(
                duration_ms = elapsed,
                input_count = texts.len(),
                slow = true,
                "Slow embedding operation"
            );
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    #[instrument(skip(self, request), fields(subsystem = "inference", component = "openai", op = "chat", model = %request.options.model.as_deref().unwrap_or(&self.config.chat_model), prompt_len = request.user.len(), has_media = request.media.is_some()))]
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage::system(request.system.as_str()));
        }
        messages.push(ChatMessage::user(user_content(request)));

        let body = ChatCompletionRequest {
            model: request
                .options
                .model
                .clone()
                .unwrap_or_else(|| self.config.chat_model.clone()),
            messages,
            temperature: request.options.temperature.or(self.config.temperature),
            max_tokens: request.options.max_tokens,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;
        let response = check_status(response, CallKind::Chat).await?;

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("Completion returned no choices".to_string()))?;
        let content = choice.message.content.unwrap_or_default();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            finish_reason = choice.finish_reason.as_deref().unwrap_or(""),
            "Chat completion complete"
        );
        if elapsed > defaults::SLOW_CALL_THRESHOLD_MS {
            warn!(
                duration_ms = elapsed,
                prompt_len = request.user.len(),
                slow = true,
                "Slow chat operation"
            );
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.chat_model
    }
}

#[async_trait]
impl InferenceBackend for OpenAIBackend {
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .build_get_request("/models")
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!(subsystem = "inference", component = "openai", "Health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!(
                    subsystem = "inference",
                    component = "openai",
                    status = resp.status().as_u16(),
                    "Health check failed"
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "openai",
                    error = %e,
                    "Health check error"
                );
                Ok(false)
            }
        }
    }
}
