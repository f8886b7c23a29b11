//! Core trait for generation backends.
//!
//! The drafting service never talks to a model directly. It renders a
//! [`GenerationRequest`] for an AI-generated section and hands it to a
//! `GenerationBackend`, which answers with a single prose string.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Error types for generation calls.
///
/// This is the vocabulary backend implementations outside this crate report
/// failures in; the drafting service passes every variant through unchanged
/// as `SessionError::Backend`.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Backend is not available
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the backend
    #[error("Rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    /// Content was filtered
    #[error("Content filtered: {reason}")]
    ContentFiltered { reason: String },
}

impl GenerationError {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ContentFiltered { .. })
    }
}

/// What the backend receives for one AI-generated section.
///
/// Rendering is pure, so the same session state always yields an
/// identical request and a failed call can simply be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct GenerationRequest {
    /// Section the prose is for
    pub section_id: String,
    /// Free-text drafting instructions from the template
    pub instructions: String,
    /// Prompt template with every placeholder substituted
    pub rendered_prompt: String,
}

/// A prose generator for AI-generated sections.
///
/// Timeouts and cancellation belong to the implementation; the drafting
/// service awaits the call without holding any session state.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend identifier (e.g., model name).
    fn id(&self) -> &str;

    /// Check if the backend is currently available.
    async fn is_available(&self) -> bool;

    /// Draft prose for one section.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
