//! The text-generation seam.
//!
//! `TextGenerator` is implemented by the `edubot-providers` crate. The chat
//! service only ever sees this trait, so any LLM backend (or a mock) can sit
//! behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that turn a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Generate a completion for a prompt.
    async fn generate(&self, request: &GenerateRequest)
        -> Result<GenerateResponse, ProviderError>;

    /// List available models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request to generate text from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "gpt-4").
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from an LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated text.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// System prompts
// ---------------------------------------------------------------------------

/// System prompt for open-ended search questions.
pub const SEARCH_SYSTEM_PROMPT: &str = "You are a helpful educational assistant.";

/// System prompt for concept explanations.
pub const EXPLAINER_SYSTEM_PROMPT: &str = "You are a helpful educational assistant. Explain concepts clearly and concisely, using age-appropriate language and examples.";

/// Instruction appended to every explanation prompt.
pub const EXPLANATION_INSTRUCTION: &str =
    "Please provide a clear, age-appropriate explanation suitable for elementary school students.";

/// Build the user prompt for an explanation request.
///
/// With a context the prompt reads `Context / Question / instruction`;
/// without one it falls back to `Topic / Question / instruction`.
pub fn build_explanation_prompt(topic: &str, question: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!(
            "Context: {context}\nQuestion: {question}\n{EXPLANATION_INSTRUCTION}"
        ),
        None => format!("Topic: {topic}\nQuestion: {question}\n{EXPLANATION_INSTRUCTION}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explanation_prompt_without_context() {
        let prompt = build_explanation_prompt("Fractions", "What is a half?", None);
        assert!(prompt.starts_with("Topic: Fractions\nQuestion: What is a half?\n"));
        assert!(prompt.ends_with(EXPLANATION_INSTRUCTION));
    }

    #[test]
    fn explanation_prompt_with_context() {
        let prompt =
            build_explanation_prompt("Fractions", "What is a half?", Some("Class 3 maths"));
        assert!(prompt.starts_with("Context: Class 3 maths\n"));
        assert!(!prompt.contains("Topic:"));
    }

    #[test]
    fn blank_context_is_ignored() {
        let prompt = build_explanation_prompt("Plants", "Why are leaves green?", Some("   "));
        assert!(prompt.starts_with("Topic: Plants"));
    }
}
