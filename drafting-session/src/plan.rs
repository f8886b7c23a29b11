//! Finalized document plans.
//!
//! A plan is the hand-off to whatever renders the filing: every section of
//! the variant in order with its final body text. Rendering to a file
//! format is the host application's job.

use chrono::{DateTime, Utc};
use motion_engine::{
    is_section_complete, CourtType, FieldSchema, JurisdictionVariant, Section, SectionContent,
    SectionKind,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::session::DraftSession;

/// One section of a finalized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PlannedSection {
    pub id: String,
    pub name: String,
    pub order: u32,
    pub kind: SectionKind,
    /// Final text of the section
    pub body: String,
}

/// A complete, ordered document ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DocumentPlan {
    pub template_id: String,
    pub jurisdiction_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_code: Option<String>,
    pub court_type: CourtType,
    /// Fingerprint of the rule data the legal-standard text came from
    pub dataset_hash: String,
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub finalized_at: DateTime<Utc>,
    pub sections: Vec<PlannedSection>,
}

impl DocumentPlan {
    /// Assemble the plan for a session.
    ///
    /// Fails with the ids of every required section that is not complete.
    /// Optional sections that are not complete are left out.
    pub fn assemble(
        variant: &JurisdictionVariant,
        session: &DraftSession,
        dataset_hash: &str,
    ) -> Result<Self, Vec<String>> {
        let mut missing = Vec::new();
        let mut sections = Vec::with_capacity(variant.sections.len());

        for (idx, section) in variant.sections.iter().enumerate() {
            if !section_complete(variant, idx, session) {
                if section.required {
                    missing.push(section.id.clone());
                }
                continue;
            }
            sections.push(PlannedSection {
                id: section.id.clone(),
                name: section.name.clone(),
                order: section.order,
                kind: section.kind(),
                body: body(section, session),
            });
        }

        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Self {
            template_id: session.template_id.clone(),
            jurisdiction_code: variant.jurisdiction_code.clone(),
            district_code: variant.district_code.clone(),
            court_type: variant.court_type,
            dataset_hash: dataset_hash.to_string(),
            finalized_at: Utc::now(),
            sections,
        })
    }

    /// Serialize to JSON for the renderer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Completion of the section at `idx` for this session.
///
/// AI-generated sections count as complete once prose has been accepted
/// and their prerequisites are still complete.
pub(crate) fn section_complete(
    variant: &JurisdictionVariant,
    idx: usize,
    session: &DraftSession,
) -> bool {
    let section = &variant.sections[idx];
    let preceding = &variant.sections[..idx];
    let ready = is_section_complete(section, preceding, &session.values);
    match section.kind() {
        SectionKind::AiGenerated => ready && session.generated_content(&section.id).is_some(),
        _ => ready,
    }
}

fn body(section: &Section, session: &DraftSession) -> String {
    match &section.content {
        SectionContent::Static { static_content } => static_content.clone(),
        SectionContent::UserInput { fields } => fields
            .iter()
            .filter_map(|field| {
                session
                    .value(&field.id)
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{}: {}", field.label, display_value(field, v)))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        SectionContent::AiGenerated { .. } => session
            .generated_content(&section.id)
            .unwrap_or_default()
            .to_string(),
    }
}

/// Select values are shown by their option label.
fn display_value<'a>(field: &'a FieldSchema, value: &'a str) -> &'a str {
    field
        .options()
        .iter()
        .find(|o| o.value == value)
        .map(|o| o.label.as_str())
        .unwrap_or(value)
}
