//! Document template composition for jurisdiction-specific motion drafting.
//!
//! A template is an ordered list of sections (static text, user-collected
//! fields, AI-drafted prose). For every supported jurisdiction the engine
//! folds the jurisdiction's legal-standard boilerplate into those sections
//! and caches the resulting variant at startup.
//!
//! # Key Components
//!
//! - [`VariantBuilder`]: folds one rule-table entry into a template's sections
//! - [`RegistryBuilder`] / [`TemplateRegistry`]: one-time registration and O(1) lookup
//! - [`is_field_valid`] / [`is_section_complete`]: completion rules
//! - [`render`]: `{{fieldId}}` prompt interpolation
//!
//! # Example
//!
//! ```no_run
//! use motion_engine::{render, TemplateRegistry};
//!
//! let registry = TemplateRegistry::builtin()?;
//! let variant = registry.lookup("motion-for-mistrial", "LA", None)?;
//! for section in &variant.sections {
//!     println!("{} {}", section.order, section.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod jurisdiction;
pub mod loader;
pub mod prompt;
pub mod registry;
pub mod types;
pub mod validation;
pub mod variant;

// Re-export main types
pub use error::{EngineError, NotFound};
pub use jurisdiction::{DistrictTable, FederalDistrict, JurisdictionRuleEntry, RuleTable};
pub use prompt::{join_list, render, NOT_PROVIDED};
pub use registry::{RegistryBuilder, TemplateDefinition, TemplateRegistry};
pub use types::*;
pub use validation::{
    incomplete_prerequisites, is_field_valid, is_section_complete, section_issues, FieldCheck,
    FieldIssue,
};
pub use variant::{
    VariantBuilder, FEDERAL_STANDARD_ID, IMMIGRATION_STANDARD_ID, JURISDICTION_STANDARD_ID,
};
