//! Error types for drafting sessions.

use motion_engine::{EngineError, NotFound};
use uuid::Uuid;

use crate::backend::GenerationError;

/// Session-level failures.
///
/// All of these are returned as values; none of them invalidates the
/// session, so the UI can show the message and let the user carry on.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No active session with this id
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Template/jurisdiction combination not supported
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// Field id not defined in the session's variant
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Section id not defined in the session's variant
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    /// Prompt or generated content requested for a section that has none
    #[error("Section {0} is not AI-generated")]
    NotGenerated(String),

    /// Earlier user-input sections still need values
    #[error("Section {section} is waiting on: {}", .missing.join(", "))]
    PrerequisitesIncomplete { section: String, missing: Vec<String> },

    /// Backend answered with nothing usable
    #[error("Generation for section {0} returned no content")]
    EmptyGeneration(String),

    /// Field values changed while the backend was drafting
    #[error("Section {0} was edited during generation; generate it again")]
    StaleGeneration(String),

    /// Backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] GenerationError),

    /// Required sections are not complete
    #[error("Document incomplete: {}", .sections.join(", "))]
    Incomplete { sections: Vec<String> },

    /// Too many sessions open at once
    #[error("Session limit reached ({0} active)")]
    SessionLimit(usize),

    /// Template data failed to load
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
