//! Variant assembly.
//!
//! Folds a jurisdiction's legal-standard boilerplate into a template's
//! shared sections: a synthesized static "legal standard" section goes
//! first, the base sections follow renumbered from 2, and the caption
//! gains a sub-jurisdiction picker where the jurisdiction has one.

use crate::error::EngineError;
use crate::jurisdiction::{state_name, FederalDistrict, JurisdictionRuleEntry};
use crate::types::{
    CourtType, FieldKind, FieldSchema, JurisdictionVariant, Section, SectionContent,
};

/// Id of the synthesized section in state/territory variants.
pub const JURISDICTION_STANDARD_ID: &str = "jurisdictionStandard";
/// Id of the synthesized section in federal variants.
pub const FEDERAL_STANDARD_ID: &str = "federalStandard";
/// Id of the synthesized section in immigration-court variants.
pub const IMMIGRATION_STANDARD_ID: &str = "immigrationStandard";

const STATE_NOTE: &str = "Note: This summary identifies the governing rule and the leading \
authority for this jurisdiction. Local rules, standing orders and recent appellate decisions \
may add requirements. Verify every citation against current law before filing.";

const FEDERAL_NOTE: &str = "Note: Federal courts apply the Federal Rules of Criminal Procedure \
together with the district's local rules and the law of the circuit. Check the district's \
local criminal rules and the presiding judge's standing orders before filing.";

const IMMIGRATION_NOTE: &str = "Note: Immigration courts follow the regulations at 8 C.F.R. \
Part 1003 and the Immigration Court Practice Manual. Board of Immigration Appeals precedent \
binds the immigration judge; verify every citation before filing.";

/// Builds jurisdiction variants from one template's base sections.
pub struct VariantBuilder<'a> {
    template_id: &'a str,
    base_sections: &'a [Section],
    caption_section: &'a str,
}

impl<'a> VariantBuilder<'a> {
    /// `caption_section` is the id of the caption/identification section
    /// that receives a sub-jurisdiction picker.
    pub fn new(template_id: &'a str, base_sections: &'a [Section], caption_section: &'a str) -> Self {
        Self {
            template_id,
            base_sections,
            caption_section,
        }
    }

    /// Build one variant.
    ///
    /// Federal variants require `district`; state and immigration variants
    /// must not carry one. Pure: no side effects beyond a debug log line.
    pub fn build(
        &self,
        rule: &JurisdictionRuleEntry,
        court_type: CourtType,
        district: Option<&FederalDistrict>,
    ) -> Result<JurisdictionVariant, EngineError> {
        if self.base_sections.is_empty() {
            return Err(EngineError::config(self.template_id, "template has no base sections"));
        }

        let (jurisdiction_code, district_code) = match (court_type, district) {
            (CourtType::Federal, Some(d)) => (
                d.state_code.to_ascii_uppercase(),
                Some(d.code.to_ascii_lowercase()),
            ),
            (CourtType::Federal, None) => {
                return Err(EngineError::config(
                    self.template_id,
                    "federal variant requested without a district code",
                ));
            }
            (_, Some(d)) => {
                return Err(EngineError::config(
                    self.template_id,
                    format!(
                        "district '{}' given for a {} variant",
                        d.code,
                        court_type.as_str()
                    ),
                ));
            }
            (_, None) => (rule.jurisdiction_code.to_ascii_uppercase(), None),
        };

        let standard = standard_section(rule, court_type, district);

        let mut copies: Vec<Section> = self.base_sections.to_vec();
        // stable: ties keep insertion order
        copies.sort_by_key(|s| s.order);

        if let Some(subs) = &rule.sub_jurisdictions {
            let label = rule.sub_jurisdiction_label();
            match copies.first_mut() {
                Some(first) if first.id == self.caption_section => {
                    if let SectionContent::UserInput { fields } = &mut first.content {
                        let picker =
                            FieldSchema::new(field_id_for_label(label), label, FieldKind::Select)
                                .required()
                                .with_options(subs.clone());
                        if fields.iter().any(|f| f.id == picker.id) {
                            return Err(EngineError::config(
                                self.template_id,
                                format!(
                                    "caption already defines field '{}' for {}",
                                    picker.id, jurisdiction_code
                                ),
                            ));
                        }
                        fields.push(picker);
                    }
                }
                _ => {
                    tracing::debug!(
                        template = %self.template_id,
                        jurisdiction = %jurisdiction_code,
                        "first section is not the caption, sub-jurisdiction picker skipped"
                    );
                }
            }
        }

        let mut sections = Vec::with_capacity(copies.len() + 1);
        sections.push(standard);
        sections.extend(copies.into_iter().enumerate().map(|(i, mut s)| {
            s.order = i as u32 + 2;
            s
        }));

        let court_specific_rules_summary = match district {
            Some(d) => format!("{}: {}", d.circuit, rule.summary()),
            None => rule.summary(),
        };

        tracing::debug!(
            template = %self.template_id,
            jurisdiction = %jurisdiction_code,
            district = ?district_code,
            sections = sections.len(),
            "Built variant"
        );

        Ok(JurisdictionVariant {
            jurisdiction_code,
            court_type,
            district_code,
            sections,
            court_specific_rules_summary,
        })
    }
}

fn standard_section(
    rule: &JurisdictionRuleEntry,
    court_type: CourtType,
    district: Option<&FederalDistrict>,
) -> Section {
    let (id, name, header, note) = match (court_type, district) {
        (CourtType::Federal, Some(d)) => (
            FEDERAL_STANDARD_ID,
            "Federal Legal Standard",
            format!("United States District Court for the {} ({})", d.name, d.circuit),
            FEDERAL_NOTE,
        ),
        (CourtType::Immigration, _) => (
            IMMIGRATION_STANDARD_ID,
            "Immigration Court Standard",
            "United States Immigration Court (Executive Office for Immigration Review)".to_string(),
            IMMIGRATION_NOTE,
        ),
        _ => {
            let code = rule.jurisdiction_code.to_ascii_uppercase();
            let header = match state_name(&code) {
                Some(name) => format!("{name} ({code})"),
                None => code,
            };
            (JURISDICTION_STANDARD_ID, "Applicable Legal Standard", header, STATE_NOTE)
        }
    };

    let text = format!(
        "APPLICABLE LEGAL STANDARD\n{header}\n\n\
         Primary Rule: {}\n\
         Standard: {}\n\
         Time Limits: {}\n\
         Key Case Law: {}\n\n\
         {note}",
        rule.primary_rule.trim(),
        rule.standard_description.trim(),
        rule.time_limits.trim(),
        rule.key_case_law.trim(),
    );

    Section::fixed(id, name, text).at(1).required()
}

/// Field id for a sub-jurisdiction label: "Judicial District" becomes
/// "judicialDistrict".
pub fn field_id_for_label(label: &str) -> String {
    let mut id = String::new();
    for (i, word) in label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                id.push(first.to_ascii_lowercase());
                id.extend(chars.map(|c| c.to_ascii_lowercase()));
            } else {
                id.push(first.to_ascii_uppercase());
                id.extend(chars.map(|c| c.to_ascii_lowercase()));
            }
        }
    }
    if id.is_empty() || id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert_str(0, "subJurisdiction");
    }
    id
}
