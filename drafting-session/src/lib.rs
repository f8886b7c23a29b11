//! Drafting Sessions - the UI-facing side of motion drafting
//!
//! Wraps a [`motion_engine::TemplateRegistry`] with per-user sessions:
//! - Field values collected one write at a time, validated inline
//! - Section completion status for the form
//! - Rendered prompts and a trait-based generation backend seam
//! - Document plans once every required section is complete
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            DraftingService              │
//! │  (sessions keyed by id, one per form)   │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌─────────────┐
//! │ Template    │       │ Generation  │
//! │ Registry    │       │ Backend     │
//! │ (immutable) │       │ (external)  │
//! └─────────────┘       └─────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod plan;
pub mod service;
pub mod session;

// Re-export main types for convenience
pub use backend::{GenerationBackend, GenerationError, GenerationRequest, MockBackend};
pub use config::{DataConfig, DraftingConfig, SessionConfig};
pub use error::SessionError;
pub use plan::{DocumentPlan, PlannedSection};
pub use service::DraftingService;
pub use session::DraftSession;
