//! Core types for document templates and their jurisdiction variants.
//!
//! A template is an ordered list of sections; each section is static text,
//! a set of user-collected fields, or an AI-drafted block driven by a prompt
//! template. Variants are the per-jurisdiction resolved section lists.
//!
//! With the `typescript` feature enabled, these types can be exported to
//! TypeScript using ts-rs for consistency with the React front end.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Collected field values for one drafting session, keyed by field id.
///
/// A missing key means the field has not been filled in.
pub type FieldValues = HashMap<String, String>;

/// Input widget / value kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Date,
    Select,
    Number,
    Checkbox,
    PartyName,
    CaseNumber,
    CourtName,
}

impl FieldKind {
    /// Get string representation used in data files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::Select => "select",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::PartyName => "party-name",
            Self::CaseNumber => "case-number",
            Self::CourtName => "court-name",
        }
    }
}

/// One `(value, label)` entry of a select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SelectOption {
    /// Submitted value
    pub value: String,
    /// Display label
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A compiled field pattern.
///
/// Serialized as its source string; deserializing an invalid regular
/// expression fails, so a loaded template never carries a broken pattern.
#[derive(Debug, Clone)]
pub struct FieldPattern(Regex);

impl FieldPattern {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unanchored match, like `RegExp.prototype.test`.
    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

impl PartialEq for FieldPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for FieldPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Validation constraints on a field value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FieldConstraints {
    /// Minimum length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression the value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "typescript", ts(type = "string | null"))]
    pub pattern: Option<FieldPattern>,
    /// Allowed values for select fields, in display order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
}

/// One collectible input within a user-input section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FieldSchema {
    /// Identifier, unique within the resolved variant
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Widget / value kind
    pub kind: FieldKind,
    /// Whether a value must be supplied
    #[serde(default)]
    pub required: bool,
    /// Placeholder text for the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Guidance shown next to the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// Length, pattern and option constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<FieldConstraints>,
    /// Value pre-filled when a session starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FieldSchema {
    /// Create a field with no constraints.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
            help_text: None,
            constraints: None,
            default_value: None,
        }
    }

    /// Builder: mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Builder: set min/max length.
    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        let constraints = self.constraints.get_or_insert_with(Default::default);
        constraints.min_length = min;
        constraints.max_length = max;
        self
    }

    /// Builder: set the pattern.
    pub fn with_pattern(mut self, pattern: FieldPattern) -> Self {
        self.constraints
            .get_or_insert_with(Default::default)
            .pattern = Some(pattern);
        self
    }

    /// Builder: set select options.
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.constraints
            .get_or_insert_with(Default::default)
            .options = Some(options);
        self
    }

    /// Select options, empty when none are configured.
    pub fn options(&self) -> &[SelectOption] {
        self.constraints
            .as_ref()
            .and_then(|c| c.options.as_deref())
            .unwrap_or(&[])
    }

    /// Whether `value` is one of the configured option values.
    pub fn allows_option(&self, value: &str) -> bool {
        self.options().iter().any(|o| o.value == value)
    }

    /// Check the schema's own invariants.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err(format!("field '{}' has an empty id", self.label));
        }

        if let Some(c) = &self.constraints {
            if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
                if min > max {
                    return Err(format!(
                        "field '{}' has min_length {} greater than max_length {}",
                        self.id, min, max
                    ));
                }
            }
        }

        if self.kind == FieldKind::Select {
            let options = self.options();
            if options.is_empty() {
                return Err(format!("select field '{}' has no options", self.id));
            }
            for (i, option) in options.iter().enumerate() {
                if options[..i].iter().any(|o| o.value == option.value) {
                    return Err(format!(
                        "select field '{}' repeats option value '{}'",
                        self.id, option.value
                    ));
                }
            }
            if let Some(default) = &self.default_value {
                if !self.allows_option(default) {
                    return Err(format!(
                        "select field '{}' defaults to '{}', which is not an option",
                        self.id, default
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Section kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Static,
    UserInput,
    AiGenerated,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::UserInput => "user-input",
            Self::AiGenerated => "ai-generated",
        }
    }
}

/// Kind-specific payload of a section.
///
/// Exactly one payload exists per section, tagged by `kind` in data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SectionContent {
    /// Fixed text
    Static { static_content: String },
    /// Fields collected from the user
    UserInput { fields: Vec<FieldSchema> },
    /// Prose drafted by the generation backend
    AiGenerated {
        prompt_template: String,
        instructions: String,
    },
}

/// A named, ordered unit of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Section {
    /// Identifier, unique within the resolved variant
    pub id: String,
    /// Display name
    pub name: String,
    /// Position; ties are broken by insertion order
    #[serde(default)]
    pub order: u32,
    /// Whether the section must be complete before the document is final
    #[serde(default)]
    pub required: bool,
    /// Guidance shown with the section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// Kind-specific payload
    #[serde(flatten)]
    pub content: SectionContent,
}

impl Section {
    /// Create a static section.
    pub fn fixed(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_content(
            id,
            name,
            SectionContent::Static {
                static_content: text.into(),
            },
        )
    }

    /// Create a user-input section.
    pub fn input(id: impl Into<String>, name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self::with_content(id, name, SectionContent::UserInput { fields })
    }

    /// Create an AI-generated section.
    pub fn generated(
        id: impl Into<String>,
        name: impl Into<String>,
        prompt_template: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self::with_content(
            id,
            name,
            SectionContent::AiGenerated {
                prompt_template: prompt_template.into(),
                instructions: instructions.into(),
            },
        )
    }

    fn with_content(id: impl Into<String>, name: impl Into<String>, content: SectionContent) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order: 0,
            required: false,
            help_text: None,
            content,
        }
    }

    /// Builder: mark the section required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Builder: set the order.
    pub fn at(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn kind(&self) -> SectionKind {
        match self.content {
            SectionContent::Static { .. } => SectionKind::Static,
            SectionContent::UserInput { .. } => SectionKind::UserInput,
            SectionContent::AiGenerated { .. } => SectionKind::AiGenerated,
        }
    }

    /// Fields of a user-input section; empty for other kinds.
    pub fn fields(&self) -> &[FieldSchema] {
        match &self.content {
            SectionContent::UserInput { fields } => fields,
            _ => &[],
        }
    }

    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields().iter().find(|f| f.id == id)
    }

    /// Prompt template and instructions of an AI-generated section.
    pub fn prompt(&self) -> Option<(&str, &str)> {
        match &self.content {
            SectionContent::AiGenerated {
                prompt_template,
                instructions,
            } => Some((prompt_template, instructions)),
            _ => None,
        }
    }

    /// Text of a static section.
    pub fn static_text(&self) -> Option<&str> {
        match &self.content {
            SectionContent::Static { static_content } => Some(static_content),
            _ => None,
        }
    }
}

/// Court system a variant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum CourtType {
    State,
    Federal,
    Immigration,
}

impl CourtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Federal => "federal",
            Self::Immigration => "immigration",
        }
    }
}

/// Practice area of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Criminal,
    Immigration,
    Civil,
}

/// How demanding a template is to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

/// Descriptive metadata shown when choosing a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct TemplateMetadata {
    /// Rough completion time, e.g. "30-45 minutes"
    pub estimated_time: String,
    /// Difficulty rating
    pub difficulty: Difficulty,
    /// Whether an attorney must verify the draft before filing
    pub requires_verification: bool,
}

/// Lookup key of a variant within a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    /// Upper-case jurisdiction code ("LA", "EOIR")
    pub jurisdiction_code: String,
    /// Lower-case federal district code ("laed"), federal variants only
    pub district_code: Option<String>,
}

impl VariantKey {
    /// Build a normalized key.
    pub fn new(jurisdiction_code: &str, district_code: Option<&str>) -> Self {
        Self {
            jurisdiction_code: jurisdiction_code.trim().to_ascii_uppercase(),
            district_code: district_code.map(|d| d.trim().to_ascii_lowercase()),
        }
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.district_code {
            Some(district) => write!(f, "{}/{}", self.jurisdiction_code, district),
            None => f.write_str(&self.jurisdiction_code),
        }
    }
}

/// The resolved, jurisdiction-specific section list of one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct JurisdictionVariant {
    /// Jurisdiction code (state code, or the district's state for federal)
    pub jurisdiction_code: String,
    /// Court system
    pub court_type: CourtType,
    /// Federal district code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_code: Option<String>,
    /// Sections ordered 1..=n
    pub sections: Vec<Section>,
    /// One-line summary of the governing rules
    pub court_specific_rules_summary: String,
}

impl JurisdictionVariant {
    pub fn key(&self) -> VariantKey {
        VariantKey::new(&self.jurisdiction_code, self.district_code.as_deref())
    }

    /// Look up a section by id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Sections strictly before the given one.
    pub fn sections_before(&self, id: &str) -> Option<&[Section]> {
        self.sections
            .iter()
            .position(|s| s.id == id)
            .map(|idx| &self.sections[..idx])
    }

    /// Find a field anywhere in the variant.
    pub fn field(&self, id: &str) -> Option<(&Section, &FieldSchema)> {
        self.sections
            .iter()
            .find_map(|s| s.field(id).map(|f| (s, f)))
    }

    /// All fields, in section order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.sections.iter().flat_map(|s| s.fields())
    }
}

/// The top-level template aggregate with all of its variants.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DocumentTemplate {
    /// Template identifier, e.g. "motion-for-mistrial"
    pub id: String,
    /// Display name
    pub name: String,
    /// Practice area
    pub category: TemplateCategory,
    /// Shared sections before jurisdiction folding
    pub base_sections: Vec<Section>,
    /// One variant per (jurisdiction, district)
    pub jurisdiction_variants: Vec<JurisdictionVariant>,
    /// Descriptive metadata
    pub metadata: TemplateMetadata,
    #[serde(skip)]
    #[cfg_attr(feature = "typescript", ts(skip))]
    pub(crate) index: HashMap<VariantKey, usize>,
}

impl DocumentTemplate {
    /// Find a variant by key.
    pub fn variant(&self, key: &VariantKey) -> Option<&JurisdictionVariant> {
        self.index
            .get(key)
            .and_then(|&idx| self.jurisdiction_variants.get(idx))
    }

    /// Distinct jurisdiction codes this template supports.
    pub fn jurisdiction_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .jurisdiction_variants
            .iter()
            .map(|v| v.jurisdiction_code.as_str())
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}
