//! Inference client module for talking to a hosted generative text model.
//!
//! This module provides a trait-based abstraction over the remote endpoint,
//! with Gemini `generateContent` as the primary implementation. Callers only
//! ever see raw text or an [`LlmError`]; interpreting the text is left to
//! the extraction layer.

mod error;
mod gemini;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiClient, DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL};

use async_trait::async_trait;

/// Trait for inference clients.
///
/// One call issues at most one request. Implementations never retry; the
/// caller decides what to do with a failure.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send a prompt and return the first text payload of the response.
    ///
    /// A response that was received but carries no text yields `Ok("")`,
    /// which is distinct from an unreachable endpoint.
    async fn infer(&self, prompt: &str) -> Result<String, LlmError>;
}
