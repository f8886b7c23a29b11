//! Template registration and variant lookup.
//!
//! Registration is a one-time batch at startup: every template is folded
//! against every known jurisdiction and the results are cached. Lookup is
//! a pure map read afterwards, so a built [`TemplateRegistry`] can be
//! shared across threads without locking.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, NotFound};
use crate::jurisdiction::{DistrictTable, RuleTable, IMMIGRATION_CODE, STATE_CODES};
use crate::prompt::{is_identifier, placeholders, stray_braces};
use crate::types::{
    CourtType, DocumentTemplate, JurisdictionVariant, Section, TemplateCategory,
    TemplateMetadata, VariantKey,
};
use crate::variant::VariantBuilder;

fn default_caption_section() -> String {
    "caption".to_string()
}

/// Authoring-time definition of a template, as stored in data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// Template identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Practice area
    pub category: TemplateCategory,
    /// Id of the rule table supplying legal-standard data
    pub rule_table: String,
    /// Court systems to build variants for
    pub court_types: Vec<CourtType>,
    /// Section that receives the sub-jurisdiction picker
    #[serde(default = "default_caption_section")]
    pub caption_section: String,
    /// Descriptive metadata
    pub metadata: TemplateMetadata,
    /// Shared sections
    pub base_sections: Vec<Section>,
}

impl TemplateDefinition {
    /// Parse a definition from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// Collects rule tables and templates, then freezes them into a registry.
pub struct RegistryBuilder {
    districts: DistrictTable,
    rule_tables: BTreeMap<String, RuleTable>,
    templates: HashMap<String, DocumentTemplate>,
}

impl RegistryBuilder {
    pub fn new(districts: DistrictTable) -> Self {
        Self {
            districts,
            rule_tables: BTreeMap::new(),
            templates: HashMap::new(),
        }
    }

    /// Add a rule table. Tables must be added before the templates that use them.
    pub fn add_rule_table(&mut self, table: RuleTable) -> Result<(), EngineError> {
        table.validate()?;
        if self.rule_tables.contains_key(&table.id) {
            return Err(EngineError::config(&table.id, "rule table registered twice"));
        }
        self.rule_tables.insert(table.id.clone(), table);
        Ok(())
    }

    /// Register a template, building every variant it targets.
    ///
    /// Fails on the first broken variant; the template is then not stored
    /// and the caller is expected to abort loading.
    pub fn register(
        &mut self,
        definition: TemplateDefinition,
    ) -> Result<&DocumentTemplate, EngineError> {
        let id = definition.id.clone();
        if self.templates.contains_key(&id) {
            return Err(EngineError::config(&id, "template registered twice"));
        }
        if definition.court_types.is_empty() {
            return Err(EngineError::config(&id, "template targets no court type"));
        }
        check_base_sections(&definition)?;

        let rules = self.rule_tables.get(&definition.rule_table).ok_or_else(|| {
            EngineError::config(
                &id,
                format!("unknown rule table '{}'", definition.rule_table),
            )
        })?;

        let builder = VariantBuilder::new(
            &definition.id,
            &definition.base_sections,
            &definition.caption_section,
        );

        let mut variants = Vec::new();
        for court_type in unique(&definition.court_types) {
            match court_type {
                CourtType::State => {
                    for (code, _) in STATE_CODES {
                        let entry = rules.state_entry(code).ok_or_else(|| {
                            EngineError::config(
                                &id,
                                format!("rule table '{}' has no entry for {code}", rules.id),
                            )
                        })?;
                        variants.push(builder.build(entry, CourtType::State, None)?);
                    }
                }
                CourtType::Federal => {
                    let entry = rules.federal.as_ref().ok_or_else(|| {
                        EngineError::config(
                            &id,
                            format!("rule table '{}' has no federal entry", rules.id),
                        )
                    })?;
                    if self.districts.is_empty() {
                        return Err(EngineError::config(&id, "no federal districts loaded"));
                    }
                    for district in self.districts.iter() {
                        variants.push(builder.build(entry, CourtType::Federal, Some(district))?);
                    }
                }
                CourtType::Immigration => {
                    let mut entry = rules.immigration.clone().ok_or_else(|| {
                        EngineError::config(
                            &id,
                            format!("rule table '{}' has no immigration entry", rules.id),
                        )
                    })?;
                    entry.jurisdiction_code = IMMIGRATION_CODE.to_string();
                    variants.push(builder.build(&entry, CourtType::Immigration, None)?);
                }
            }
        }

        let mut index = HashMap::with_capacity(variants.len());
        for (i, variant) in variants.iter().enumerate() {
            check_variant(&id, variant)?;
            if index.insert(variant.key(), i).is_some() {
                return Err(EngineError::config(
                    &id,
                    format!("duplicate variant for {}", variant.key()),
                ));
            }
        }

        tracing::info!(
            template = %id,
            variants = variants.len(),
            rule_table = %definition.rule_table,
            "Registered template"
        );

        let template = DocumentTemplate {
            id: definition.id,
            name: definition.name,
            category: definition.category,
            base_sections: definition.base_sections,
            jurisdiction_variants: variants,
            metadata: definition.metadata,
            index,
        };

        Ok(self.templates.entry(id).or_insert(template))
    }

    /// Freeze the registry.
    pub fn build(self) -> TemplateRegistry {
        let dataset_hash = dataset_hash(&self.rule_tables, &self.districts);
        tracing::info!(
            templates = self.templates.len(),
            dataset_hash = %dataset_hash,
            "Template registry ready"
        );
        TemplateRegistry {
            templates: self.templates,
            districts: self.districts,
            dataset_hash,
        }
    }
}

/// Immutable registry of templates and their cached variants.
#[derive(Debug)]
pub struct TemplateRegistry {
    templates: HashMap<String, DocumentTemplate>,
    districts: DistrictTable,
    dataset_hash: String,
}

impl TemplateRegistry {
    /// Resolve the variant for a template and jurisdiction.
    ///
    /// Codes are case-insensitive. A miss is returned as [`NotFound`] and
    /// means "not yet supported here", not a fault.
    pub fn lookup(
        &self,
        template_id: &str,
        jurisdiction_code: &str,
        district_code: Option<&str>,
    ) -> Result<&JurisdictionVariant, NotFound> {
        let key = VariantKey::new(jurisdiction_code, district_code);
        self.templates
            .get(template_id)
            .and_then(|t| t.variant(&key))
            .ok_or_else(|| NotFound {
                template_id: template_id.to_string(),
                jurisdiction_code: key.jurisdiction_code,
                district_code: key.district_code,
            })
    }

    /// Ordered sections of a variant.
    pub fn list_sections(
        &self,
        template_id: &str,
        jurisdiction_code: &str,
        district_code: Option<&str>,
    ) -> Result<&[Section], NotFound> {
        self.lookup(template_id, jurisdiction_code, district_code)
            .map(|v| v.sections.as_slice())
    }

    pub fn template(&self, id: &str) -> Option<&DocumentTemplate> {
        self.templates.get(id)
    }

    /// All templates, sorted by id.
    pub fn templates(&self) -> Vec<&DocumentTemplate> {
        let mut all: Vec<_> = self.templates.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn districts(&self) -> &DistrictTable {
        &self.districts
    }

    /// SHA-256 over every rule table and the district table.
    pub fn dataset_hash(&self) -> &str {
        &self.dataset_hash
    }
}

fn unique(court_types: &[CourtType]) -> Vec<CourtType> {
    let mut seen = HashSet::new();
    court_types
        .iter()
        .copied()
        .filter(|c| seen.insert(*c))
        .collect()
}

/// Section and field self-checks that do not depend on the jurisdiction.
fn check_base_sections(definition: &TemplateDefinition) -> Result<(), EngineError> {
    if definition.base_sections.is_empty() {
        return Err(EngineError::config(&definition.id, "template has no base sections"));
    }
    for section in &definition.base_sections {
        if section.id.trim().is_empty() {
            return Err(EngineError::config(
                &definition.id,
                format!("section '{}' has an empty id", section.name),
            ));
        }
        for field in section.fields() {
            field.validate().map_err(|message| {
                EngineError::config(&definition.id, format!("section '{}': {message}", section.id))
            })?;
        }
    }
    Ok(())
}

/// Per-variant checks: unique ids, valid fields and resolvable placeholders.
///
/// Every `{{token}}` in a prompt template must name a field defined in a
/// section at strictly lower order, so rendering never meets an unknown id.
/// Fields are re-checked here because the builder adds the sub-jurisdiction
/// picker after the base sections were validated.
fn check_variant(template_id: &str, variant: &JurisdictionVariant) -> Result<(), EngineError> {
    let mut section_ids = HashSet::new();
    let mut known_fields: HashSet<&str> = HashSet::new();

    for (i, section) in variant.sections.iter().enumerate() {
        if section.order != i as u32 + 1 {
            return Err(EngineError::config(
                template_id,
                format!("{}: section '{}' out of order", variant.key(), section.id),
            ));
        }
        if !section_ids.insert(section.id.as_str()) {
            return Err(EngineError::config(
                template_id,
                format!("{}: duplicate section id '{}'", variant.key(), section.id),
            ));
        }

        if let Some((prompt_template, _)) = section.prompt() {
            if let Some(offset) = stray_braces(prompt_template) {
                return Err(EngineError::config(
                    template_id,
                    format!(
                        "{}: unbalanced placeholder braces at byte {offset} in section '{}'",
                        variant.key(),
                        section.id
                    ),
                ));
            }
            for token in placeholders(prompt_template) {
                if !is_identifier(token) {
                    return Err(EngineError::config(
                        template_id,
                        format!(
                            "{}: malformed placeholder '{{{{{token}}}}}' in section '{}'",
                            variant.key(),
                            section.id
                        ),
                    ));
                }
                if !known_fields.contains(token) {
                    return Err(EngineError::UnknownPlaceholder {
                        template: template_id.to_string(),
                        variant: variant.key().to_string(),
                        section: section.id.clone(),
                        placeholder: token.to_string(),
                    });
                }
            }
        }

        for field in section.fields() {
            field.validate().map_err(|message| {
                EngineError::config(
                    template_id,
                    format!("{}: section '{}': {message}", variant.key(), section.id),
                )
            })?;
            if !known_fields.insert(field.id.as_str()) {
                return Err(EngineError::config(
                    template_id,
                    format!("{}: field id '{}' defined twice", variant.key(), field.id),
                ));
            }
        }
    }
    Ok(())
}

fn dataset_hash(rule_tables: &BTreeMap<String, RuleTable>, districts: &DistrictTable) -> String {
    let mut hasher = Sha256::new();
    for (id, table) in rule_tables {
        hasher.update(id.as_bytes());
        // serializing plain data structs cannot fail
        if let Ok(bytes) = serde_json::to_vec(table) {
            hasher.update(&bytes);
        }
    }
    if let Ok(bytes) = serde_json::to_vec(districts) {
        hasher.update(&bytes);
    }
    hex::encode(hasher.finalize())
}
