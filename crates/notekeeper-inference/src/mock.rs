//! Mock inference backend for deterministic testing.
//!
//! Provides mock implementations of the embedding and chat backends, and an
//! in-memory [`FileReader`], for tests that must not touch a real model.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notekeeper_core::{ChatBackend, ChatRequest};
//! use notekeeper_inference::mock::{MockInferenceBackend, MockReply};
//!
//! #[tokio::test]
//! async fn test_with_mock_backend() {
//!     let backend = MockInferenceBackend::new().with_dimension(8);
//!     backend.push_reply(MockReply::Fail("model down".into()));
//!     backend.push_reply(MockReply::Text("{}".into()));
//!
//!     assert!(backend.chat(&ChatRequest::new("s", "u")).await.is_err());
//!     assert_eq!(backend.chat(&ChatRequest::new("s", "u")).await.unwrap(), "{}");
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use notekeeper_core::{
    defaults, ChatBackend, ChatRequest, EmbeddingBackend, Error, FileReader, InferenceBackend,
    Result, Vector,
};

/// Scripted chat outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Text(String),
    Fail(String),
}

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    pub system: String,
    pub mime_type: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    default_response: String,
    fail_embed: bool,
    fail_chat: bool,
    fixed_embeddings: HashMap<String, Vec<f32>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: defaults::EMBED_DIMENSION,
            default_response: "Mock response".to_string(),
            fail_embed: false,
            fail_chat: false,
            fixed_embeddings: HashMap::new(),
        }
    }
}

/// Mock embedding and chat backend.
///
/// Chat calls consume scripted replies first, then fall back to the fixed
/// response. Embeddings are deterministic per input text.
#[derive(Clone, Default)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the chat response used once the script is exhausted.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Return `vector` when embedding exactly `text`.
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_embeddings
            .insert(text.into(), vector);
        self
    }

    /// Make every embedding call fail.
    pub fn with_embed_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_embed = true;
        self
    }

    /// Make every unscripted chat call fail.
    pub fn with_chat_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_chat = true;
        self
    }

    /// Queue a reply for the next chat call.
    pub fn push_reply(&self, reply: MockReply) {
        self.script.lock().unwrap().push_back(reply);
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Logged chat calls, oldest first.
    pub fn chat_calls(&self) -> Vec<MockCall> {
        self.get_calls()
            .into_iter()
            .filter(|c| c.operation == "chat")
            .collect()
    }

    pub fn embed_call_count(&self) -> usize {
        self.count("embed")
    }

    pub fn chat_call_count(&self) -> usize {
        self.count("chat")
    }

    fn count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, call: MockCall) {
        self.call_log.lock().unwrap().push(call);
    }
}

/// Unit-length pseudo-random vector derived from `text`.
pub fn deterministic_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut values: Vec<f32> = (0..dimension)
        .map(|i| {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            (hasher.finish() % 2001) as f32 / 1000.0 - 1.0
        })
        .collect();

    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
    values
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        for text in texts {
            self.log_call(MockCall {
                operation: "embed".to_string(),
                input: text.clone(),
                system: String::new(),
                mime_type: None,
                temperature: None,
                max_tokens: None,
            });
        }

        if self.config.fail_embed {
            return Err(Error::Embedding("Mock embedding failure".to_string()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                let values = self
                    .config
                    .fixed_embeddings
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| deterministic_embedding(text, self.config.dimension));
                Vector::from(values)
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl ChatBackend for MockInferenceBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        self.log_call(MockCall {
            operation: "chat".to_string(),
            input: request.user.clone(),
            system: request.system.clone(),
            mime_type: request.media.as_ref().map(|m| m.mime_type.clone()),
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        });

        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(msg)) => Err(Error::Inference(msg)),
            None if self.config.fail_chat => {
                Err(Error::Inference("Mock chat failure".to_string()))
            }
            None => Ok(self.config.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

#[async_trait]
impl InferenceBackend for MockInferenceBackend {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// In-memory [`FileReader`] keyed by relative path.
#[derive(Clone, Default)]
pub struct MockFileReader {
    files: Arc<HashMap<String, Vec<u8>>>,
    fail_reads: bool,
}

impl MockFileReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, data: Vec<u8>) -> Self {
        Arc::make_mut(&mut self.files).insert(path.into(), data);
        self
    }

    /// Sizes resolve, but reading any file fails.
    pub fn with_read_failure(mut self) -> Self {
        self.fail_reads = true;
        self
    }
}

#[async_trait]
impl FileReader for MockFileReader {
    async fn file_size(&self, relative_path: &str) -> Result<Option<u64>> {
        Ok(self.files.get(relative_path).map(|d| d.len() as u64))
    }

    async fn read(&self, relative_path: &str) -> Result<Vec<u8>> {
        if self.fail_reads {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                relative_path.to_string(),
            )));
        }
        self.files
            .get(relative_path)
            .cloned()
            .ok_or_else(|| Error::NotFound(relative_path.to_string()))
    }
}
