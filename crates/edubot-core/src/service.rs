//! Request orchestration.
//!
//! `ChatService` ties a `TextGenerator` to the validation engine and the
//! progress tracker: generate, validate, and substitute an apology when the
//! generated text fails validation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProgressError, ProviderError};
use crate::model::{ProgressRecord, SessionUpdate};
use crate::progress::ProgressTracker;
use crate::traits::{
    build_explanation_prompt, GenerateRequest, GenerateResponse, TextGenerator,
    EXPLAINER_SYSTEM_PROMPT, SEARCH_SYSTEM_PROMPT,
};
use crate::validation::{ValidationEngine, ValidationReport};

/// Returned in place of a generated response that failed validation.
pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I need to rephrase my response to meet our quality standards.";

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Generation settings for the chat service.
#[derive(Debug, Clone)]
pub struct ChatServiceConfig {
    /// Model for chat and search.
    pub simple_model: String,
    /// Model for explanations.
    pub complex_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Retries on transient provider errors.
    pub max_retries: u32,
    /// Initial delay between retries; doubles per attempt.
    pub retry_delay: Duration,
}

impl Default for ChatServiceConfig {
    fn default() -> Self {
        Self {
            simple_model: "gpt-3.5-turbo".to_string(),
            complex_model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// A chat message from a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, alias = "skipValidation")]
    pub skip_validation: bool,
}

/// What the student gets back from a chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Generated text, or [`APOLOGY_MESSAGE`] when validation failed.
    pub response: String,
    pub validation: ValidationReport,
    /// Messages of the failing rules, in rule order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
}

/// A request to explain a concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub topic: String,
    pub question: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// An explanation and whether it counted towards the student's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation: String,
    #[serde(default)]
    pub progress_updated: bool,
}

/// Orchestrates generation, validation, and progress tracking.
pub struct ChatService {
    generator: Arc<dyn TextGenerator>,
    validator: ValidationEngine,
    tracker: Arc<ProgressTracker>,
    config: ChatServiceConfig,
}

impl ChatService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        validator: ValidationEngine,
        tracker: Arc<ProgressTracker>,
        config: ChatServiceConfig,
    ) -> Self {
        Self {
            generator,
            validator,
            tracker,
            config,
        }
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    pub fn config(&self) -> &ChatServiceConfig {
        &self.config
    }

    /// Answer a chat message.
    ///
    /// Validation is skipped when the caller asks for it or when the message
    /// looks like arithmetic, since short numeric answers would fail the
    /// length and sentence rules.
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4()))]
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        tracing::info!("received chat message ({} chars)", request.message.chars().count());

        let generated = self
            .generate(GenerateRequest {
                model: self.config.simple_model.clone(),
                prompt: request.message.clone(),
                system_prompt: None,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            })
            .await?;

        if request.skip_validation || is_arithmetic(&request.message) {
            tracing::info!("validation skipped");
            return Ok(ChatReply {
                response: generated.content,
                validation: ValidationReport::skipped(),
                validation_errors: Vec::new(),
            });
        }

        let report = self.validator.validate(&generated.content);
        if report.is_valid() {
            tracing::info!("response passed validation");
            return Ok(ChatReply {
                response: generated.content,
                validation: report,
                validation_errors: Vec::new(),
            });
        }

        let validation_errors = report.error_messages();
        tracing::warn!(errors = ?validation_errors, "response failed validation");
        Ok(ChatReply {
            response: APOLOGY_MESSAGE.to_string(),
            validation: report,
            validation_errors,
        })
    }

    /// Explain a concept with the complex model.
    ///
    /// When a student ID is supplied the topic is marked as revisited in
    /// their progress record. This happens regardless of validation.
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4(), topic = %request.topic))]
    pub async fn explain(&self, request: &ExplanationRequest) -> Result<Explanation, ProviderError> {
        let prompt =
            build_explanation_prompt(&request.topic, &request.question, request.context.as_deref());

        let generated = self
            .generate(GenerateRequest {
                model: self.config.complex_model.clone(),
                prompt,
                system_prompt: Some(EXPLAINER_SYSTEM_PROMPT.to_string()),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            })
            .await?;

        let progress_updated = request
            .student_id
            .as_deref()
            .is_some_and(|id| self.tracker.touch_topic(id, &request.topic));

        Ok(Explanation {
            explanation: generated.content,
            progress_updated,
        })
    }

    /// Free-form question, answered without validation.
    #[instrument(skip(self, query), fields(request_id = %Uuid::new_v4()))]
    pub async fn search(&self, query: &str) -> Result<String, ProviderError> {
        let generated = self
            .generate(GenerateRequest {
                model: self.config.simple_model.clone(),
                prompt: query.to_string(),
                system_prompt: Some(SEARCH_SYSTEM_PROMPT.to_string()),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            })
            .await?;
        Ok(generated.content)
    }

    /// Check and record a study session.
    pub fn record_progress(&self, update: &SessionUpdate) -> Result<(), ProgressError> {
        update.check()?;
        self.tracker.record_session(update);
        Ok(())
    }

    pub fn progress(&self, student_id: &str) -> Result<ProgressRecord, ProgressError> {
        self.tracker.get_progress(student_id)
    }

    pub fn validate(&self, text: &str) -> ValidationReport {
        self.validator.validate(text)
    }

    /// Call the generator, retrying transient errors with exponential backoff.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let mut retry_delay = self.config.retry_delay.min(MAX_RETRY_DELAY);
        let mut retry = 0;
        loop {
            match self.generator.generate(&request).await {
                Ok(response) => {
                    tracing::info!(
                        model = %response.model,
                        latency_ms = response.latency_ms,
                        tokens = response.token_usage.total_tokens,
                        "generated response"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_permanent() || retry >= self.config.max_retries => {
                    tracing::error!("{} generation failed: {e}", self.generator.name());
                    return Err(e);
                }
                Err(e) => {
                    retry += 1;
                    let wait = e
                        .retry_after_ms()
                        .map(Duration::from_millis)
                        .unwrap_or(retry_delay)
                        .min(MAX_RETRY_DELAY);
                    tracing::warn!(
                        "{} generation failed ({e}), retry {retry}/{} in {}ms",
                        self.generator.name(),
                        self.config.max_retries,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                    retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
                }
            }
        }
    }
}

fn is_arithmetic(message: &str) -> bool {
    message.contains(&['+', '-', '*', '/'][..])
}
