//! Per-user drafting state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use motion_engine::{FieldValues, JurisdictionVariant};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// One in-progress document: a template/jurisdiction choice, the field
/// values collected so far and the generated prose the user accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DraftSession {
    /// Session identifier
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub id: Uuid,
    /// Template being drafted
    pub template_id: String,
    /// Jurisdiction code of the resolved variant
    pub jurisdiction_code: String,
    /// Federal district code, federal variants only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_code: Option<String>,
    /// Collected values keyed by field id
    pub values: FieldValues,
    /// Accepted prose keyed by section id
    pub generated: HashMap<String, String>,
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl DraftSession {
    /// Open a session on a resolved variant.
    ///
    /// With `seed_defaults`, every field that declares a default value
    /// starts out holding it.
    pub fn new(
        template_id: impl Into<String>,
        variant: &JurisdictionVariant,
        seed_defaults: bool,
    ) -> Self {
        let values = if seed_defaults {
            variant
                .fields()
                .filter_map(|f| f.default_value.as_ref().map(|v| (f.id.clone(), v.clone())))
                .collect()
        } else {
            FieldValues::new()
        };

        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            template_id: template_id.into(),
            jurisdiction_code: variant.jurisdiction_code.clone(),
            district_code: variant.district_code.clone(),
            values,
            generated: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Current value of a field.
    pub fn value(&self, field_id: &str) -> Option<&str> {
        self.values.get(field_id).map(String::as_str)
    }

    /// Accepted prose for a section.
    pub fn generated_content(&self, section_id: &str) -> Option<&str> {
        self.generated.get(section_id).map(String::as_str)
    }

    pub(crate) fn set_value(&mut self, field_id: &str, value: String) {
        self.values.insert(field_id.to_string(), value);
        self.touch();
    }

    pub(crate) fn clear_value(&mut self, field_id: &str) {
        self.values.remove(field_id);
        self.touch();
    }

    pub(crate) fn accept(&mut self, section_id: &str, prose: String) {
        self.generated.insert(section_id.to_string(), prose);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
