//! Error types for template registration and lookup.

use std::path::PathBuf;

/// Registration-time failures.
///
/// Any of these aborts template loading; a registry is never built from a
/// data set that produced one.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed template, rule table or district table
    #[error("Invalid configuration in {template}: {message}")]
    Config { template: String, message: String },

    /// A prompt template references a field no earlier section defines
    #[error(
        "Unknown placeholder {{{{{placeholder}}}}} in section '{section}' of {template} ({variant})"
    )]
    UnknownPlaceholder {
        template: String,
        variant: String,
        section: String,
        placeholder: String,
    },

    /// Data file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Data file could not be parsed
    #[error("Failed to parse {name}: {source}")]
    Yaml {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl EngineError {
    pub fn config(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            template: template.into(),
            message: message.into(),
        }
    }
}

/// A template/jurisdiction combination that was never registered.
///
/// Returned as a value: callers treat it as "not yet supported here".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{template_id} is not yet supported for {}", location(.jurisdiction_code, .district_code))]
pub struct NotFound {
    pub template_id: String,
    pub jurisdiction_code: String,
    pub district_code: Option<String>,
}

fn location(jurisdiction_code: &str, district_code: &Option<String>) -> String {
    match district_code {
        Some(district) => format!("{jurisdiction_code} ({district})"),
        None => jurisdiction_code.to_string(),
    }
}
