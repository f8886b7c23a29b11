//! Generation backend abstraction.
//!
//! The backend that drafts AI-generated sections lives outside this crate;
//! this module defines the seam it plugs into plus a mock for tests.

pub mod mock;
pub mod traits;

pub use mock::MockBackend;
pub use traits::{GenerationBackend, GenerationError, GenerationRequest};
