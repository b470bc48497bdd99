// src/ai/mod.rs

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, DEFAULT_NUM_OPTIONS, DEFAULT_NUM_QUESTIONS},
    models::question::{Difficulty, Language, MalformedBank, QuestionBank},
};

pub mod gemini;
pub mod openai;
pub mod parse;
pub mod prompts;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

pub type SharedGenerator = Arc<dyn QuizGenerator>;
pub type SharedTutor = Arc<dyn Tutor>;

/// Timeout for a single provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub enum GenerationError {
    NotConfigured,
    /// Network failure or timeout talking to the provider.
    Request(String),
    /// The provider answered with a non-success status.
    Provider { status: u16, body: String },
    /// The answer had no usable JSON payload.
    Unparseable(String),
    /// The payload parsed but broke the bank invariants.
    Malformed(MalformedBank),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::NotConfigured => write!(f, "no AI provider is configured"),
            GenerationError::Request(msg) => write!(f, "request failed: {}", msg),
            GenerationError::Provider { status, body } => {
                write!(f, "provider returned {}: {}", status, body)
            }
            GenerationError::Unparseable(msg) => write!(f, "unparseable response: {}", msg),
            GenerationError::Malformed(err) => write!(f, "malformed bank: {}", err),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Request(err.to_string())
    }
}

impl From<MalformedBank> for GenerationError {
    fn from(err: MalformedBank) -> Self {
        GenerationError::Malformed(err)
    }
}

/// What to ask the generator for.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub num_questions: u32,
    pub num_options: u32,
    pub difficulty: Difficulty,
    pub language: Language,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            num_questions: DEFAULT_NUM_QUESTIONS,
            num_options: DEFAULT_NUM_OPTIONS,
            difficulty: Difficulty::default(),
            language: Language::default(),
        }
    }
}

/// Produces a validated question bank from a prompt.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<QuestionBank, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Tutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Chat-based tutor.
#[async_trait]
pub trait Tutor: Send + Sync {
    /// `context` is extra material (e.g. a scored attempt) the tutor should ground its answer in.
    async fn reply(
        &self,
        history: &[ChatTurn],
        message: &str,
        context: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// Tries `primary`, then `fallback` when the primary fails for any reason.
pub struct FallbackGenerator {
    primary: SharedGenerator,
    fallback: SharedGenerator,
}

impl FallbackGenerator {
    pub fn new(primary: SharedGenerator, fallback: SharedGenerator) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl QuizGenerator for FallbackGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<QuestionBank, GenerationError> {
        match self.primary.generate(request).await {
            Ok(bank) => Ok(bank),
            Err(e) => {
                tracing::warn!("Primary generator failed, falling back: {}", e);
                self.fallback.generate(request).await
            }
        }
    }
}

/// Stand-in used when no API key is configured.
pub struct Unconfigured;

#[async_trait]
impl QuizGenerator for Unconfigured {
    async fn generate(&self, _request: &GenerationRequest) -> Result<QuestionBank, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

#[async_trait]
impl Tutor for Unconfigured {
    async fn reply(
        &self,
        _history: &[ChatTurn],
        _message: &str,
        _context: Option<&str>,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// Gemini first, OpenAI as fallback, whichever keys are present.
pub fn build_generator(config: &Config, client: reqwest::Client) -> SharedGenerator {
    let gemini = config.gemini_api_key.as_ref().map(|key| {
        Arc::new(GeminiClient::new(
            client.clone(),
            key.clone(),
            config.gemini_api_url.clone(),
        )) as SharedGenerator
    });
    let openai = config.openai_api_key.as_ref().map(|key| {
        Arc::new(OpenAiClient::new(
            client.clone(),
            key.clone(),
            config.openai_api_url.clone(),
            config.quiz_model.clone(),
            config.tutor_model.clone(),
        )) as SharedGenerator
    });

    match (gemini, openai) {
        (Some(primary), Some(fallback)) => Arc::new(FallbackGenerator::new(primary, fallback)),
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => {
            tracing::warn!("No AI provider key configured; quiz generation is disabled");
            Arc::new(Unconfigured)
        }
    }
}

/// OpenAI when configured, otherwise Gemini.
pub fn build_tutor(config: &Config, client: reqwest::Client) -> SharedTutor {
    if let Some(key) = &config.openai_api_key {
        return Arc::new(OpenAiClient::new(
            client,
            key.clone(),
            config.openai_api_url.clone(),
            config.quiz_model.clone(),
            config.tutor_model.clone(),
        ));
    }
    if let Some(key) = &config.gemini_api_key {
        return Arc::new(GeminiClient::new(
            client,
            key.clone(),
            config.gemini_api_url.clone(),
        ));
    }
    tracing::warn!("No AI provider key configured; the tutor is disabled");
    Arc::new(Unconfigured)
}
