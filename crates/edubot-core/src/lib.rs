//! edubot-core — response validation, progress tracking, and orchestration.
//!
//! This crate defines the rule-based validation engine, the per-student
//! progress aggregate, the `TextGenerator` seam that LLM backends implement,
//! and the `ChatService` that ties them together.

pub mod error;
pub mod model;
pub mod progress;
pub mod service;
pub mod traits;
pub mod validation;

pub use error::{ProgressError, ProviderError};
pub use progress::ProgressTracker;
pub use service::ChatService;
pub use validation::{ValidationEngine, ValidationReport};
