//! Field validation and section completion.
//!
//! Outcomes are values, never errors: the UI renders a [`FieldCheck`] next
//! to the offending field and keeps the rest of the form usable.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{FieldKind, FieldSchema, FieldValues, Section, SectionContent};

/// Why a field value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum FieldIssue {
    MissingRequired,
    InvalidOption,
    TooShort,
    TooLong,
    PatternMismatch,
}

impl FieldIssue {
    /// Inline message for the form.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingRequired => "This field is required",
            Self::InvalidOption => "Choose one of the listed options",
            Self::TooShort => "Please enter more detail",
            Self::TooLong => "This entry is too long",
            Self::PatternMismatch => "This entry is not in the expected format",
        }
    }
}

/// Result of validating one field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FieldCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FieldIssue>,
}

impl FieldCheck {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn failed(issue: FieldIssue) -> Self {
        Self {
            valid: false,
            reason: Some(issue),
        }
    }
}

/// Validate a value against a field schema.
///
/// Rules apply in precedence order: required, option membership, minimum
/// length, maximum length, pattern. An empty string counts as absent.
/// Lengths are counted in characters.
pub fn is_field_valid(field: &FieldSchema, value: Option<&str>) -> FieldCheck {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ if field.required => return FieldCheck::failed(FieldIssue::MissingRequired),
        _ => return FieldCheck::ok(),
    };

    if field.kind == FieldKind::Select && !field.allows_option(value) {
        return FieldCheck::failed(FieldIssue::InvalidOption);
    }

    let Some(constraints) = &field.constraints else {
        return FieldCheck::ok();
    };

    let length = value.chars().count();
    if constraints.min_length.is_some_and(|min| length < min) {
        return FieldCheck::failed(FieldIssue::TooShort);
    }
    if constraints.max_length.is_some_and(|max| length > max) {
        return FieldCheck::failed(FieldIssue::TooLong);
    }
    if let Some(pattern) = &constraints.pattern {
        if !pattern.is_match(value) {
            return FieldCheck::failed(FieldIssue::PatternMismatch);
        }
    }

    FieldCheck::ok()
}

/// Every failing field of a section with its issue.
pub fn section_issues<'a>(section: &'a Section, values: &FieldValues) -> Vec<(&'a str, FieldIssue)> {
    section
        .fields()
        .iter()
        .filter_map(|field| {
            is_field_valid(field, values.get(&field.id).map(String::as_str))
                .reason
                .map(|issue| (field.id.as_str(), issue))
        })
        .collect()
}

/// Whether a section is complete given the values collected so far.
///
/// `preceding` holds the sections ordered before `section` in the same
/// variant. Static sections are always complete; user-input sections are
/// complete when every field passes; AI-generated sections are ready when
/// every earlier user-input section is complete. Whether generated prose
/// has been accepted is tracked by the drafting session, not here.
pub fn is_section_complete(section: &Section, preceding: &[Section], values: &FieldValues) -> bool {
    match &section.content {
        SectionContent::Static { .. } => true,
        SectionContent::UserInput { .. } => section_issues(section, values).is_empty(),
        SectionContent::AiGenerated { .. } => incomplete_prerequisites(preceding, values).is_empty(),
    }
}

/// Ids of earlier user-input sections that are not yet complete.
pub fn incomplete_prerequisites<'a>(preceding: &'a [Section], values: &FieldValues) -> Vec<&'a str> {
    preceding
        .iter()
        .filter(|s| matches!(s.content, SectionContent::UserInput { .. }))
        .filter(|s| !section_issues(s, values).is_empty())
        .map(|s| s.id.as_str())
        .collect()
}
