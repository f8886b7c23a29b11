//! Jurisdiction rule tables and the federal district table.
//!
//! Both are static, versioned datasets loaded from YAML at startup. They
//! carry no behavior beyond lookup and integrity checks; the variant
//! builder turns one entry into a jurisdiction-specific section list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::SelectOption;

/// Label used for the sub-jurisdiction picker when an entry names none.
pub const DEFAULT_SUB_JURISDICTION_LABEL: &str = "County";

/// Jurisdiction code of the single immigration-court variant.
pub const IMMIGRATION_CODE: &str = "EOIR";

/// Every state and territory code with a state-court variant, and its name.
pub const STATE_CODES: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Display name of a state/territory code.
pub fn state_name(code: &str) -> Option<&'static str> {
    STATE_CODES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Legal-standard metadata for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionRuleEntry {
    /// State/territory code, "US" for the federal entry, "EOIR" for immigration
    pub jurisdiction_code: String,
    /// Governing rule or statute
    pub primary_rule: String,
    /// The applicable test
    pub standard_description: String,
    /// Filing deadlines
    pub time_limits: String,
    /// Controlling case law
    pub key_case_law: String,
    /// Counties, parishes or districts the caption must name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_jurisdictions: Option<Vec<SelectOption>>,
    /// Label for the sub-jurisdiction picker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_jurisdiction_label: Option<String>,
}

impl JurisdictionRuleEntry {
    /// Label for the sub-jurisdiction picker, defaulting to "County".
    pub fn sub_jurisdiction_label(&self) -> &str {
        self.sub_jurisdiction_label
            .as_deref()
            .unwrap_or(DEFAULT_SUB_JURISDICTION_LABEL)
    }

    /// The four rule fields joined on one line.
    pub fn summary(&self) -> String {
        [
            &self.primary_rule,
            &self.standard_description,
            &self.time_limits,
            &self.key_case_law,
        ]
        .iter()
        .map(|part| one_line(part))
        .collect::<Vec<_>>()
        .join(" | ")
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Category-specific rule data for one family of templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    /// Table identifier referenced by template definitions
    pub id: String,
    /// One entry per state/territory
    #[serde(default)]
    pub states: Vec<JurisdictionRuleEntry>,
    /// Entry shared by every federal district
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federal: Option<JurisdictionRuleEntry>,
    /// Entry for the immigration court
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immigration: Option<JurisdictionRuleEntry>,
}

impl RuleTable {
    /// Parse a table from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Entry for a state/territory code.
    pub fn state_entry(&self, code: &str) -> Option<&JurisdictionRuleEntry> {
        self.states
            .iter()
            .find(|e| e.jurisdiction_code.eq_ignore_ascii_case(code))
    }

    /// Reject unknown or repeated state codes.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for entry in &self.states {
            let code = entry.jurisdiction_code.to_ascii_uppercase();
            if state_name(&code).is_none() {
                return Err(EngineError::config(
                    &self.id,
                    format!("rule table names unknown jurisdiction '{code}'"),
                ));
            }
            if !seen.insert(code.clone()) {
                return Err(EngineError::config(
                    &self.id,
                    format!("rule table repeats jurisdiction '{code}'"),
                ));
            }
            if let Some(subs) = &entry.sub_jurisdictions {
                if subs.is_empty() {
                    return Err(EngineError::config(
                        &self.id,
                        format!("{code} lists an empty sub-jurisdiction set"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A federal judicial district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalDistrict {
    /// District code, e.g. "laed"
    pub code: String,
    /// Full name, e.g. "Eastern District of Louisiana"
    pub name: String,
    /// State or territory the district sits in
    pub state_code: String,
    /// Circuit name, e.g. "Fifth Circuit"
    pub circuit: String,
}

/// Every known federal district and its circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictTable {
    pub districts: Vec<FederalDistrict>,
}

impl DistrictTable {
    /// Parse the table from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        let table: Self = serde_yaml::from_str(yaml).map_err(|source| EngineError::Yaml {
            name: "districts".to_string(),
            source,
        })?;
        table.validate()?;
        Ok(table)
    }

    pub fn get(&self, code: &str) -> Option<&FederalDistrict> {
        self.districts
            .iter()
            .find(|d| d.code.eq_ignore_ascii_case(code))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FederalDistrict> {
        self.districts.iter()
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// Districts within one state or territory.
    pub fn in_state<'a>(&'a self, state_code: &'a str) -> impl Iterator<Item = &'a FederalDistrict> {
        self.districts
            .iter()
            .filter(move |d| d.state_code.eq_ignore_ascii_case(state_code))
    }

    fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for district in &self.districts {
            if !seen.insert(district.code.to_ascii_lowercase()) {
                return Err(EngineError::config(
                    "districts",
                    format!("district '{}' listed twice", district.code),
                ));
            }
            if district.circuit.trim().is_empty() {
                return Err(EngineError::config(
                    "districts",
                    format!("district '{}' has no circuit", district.code),
                ));
            }
        }
        Ok(())
    }
}
