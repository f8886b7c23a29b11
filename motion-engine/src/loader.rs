//! Loading templates and rule tables from YAML.
//!
//! A data directory has the layout:
//!
//! ```text
//! data/
//!   districts.yaml
//!   rules/*.yaml
//!   templates/*.yaml
//! ```
//!
//! The same layout ships inside this crate and is compiled in, so
//! [`load_builtin`] needs no filesystem access.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::jurisdiction::{DistrictTable, RuleTable};
use crate::registry::{RegistryBuilder, TemplateDefinition, TemplateRegistry};

const BUNDLED_DISTRICTS: &str = include_str!("../data/districts.yaml");

const BUNDLED_RULE_TABLES: &[(&str, &str)] = &[
    ("rules/immigration-bond.yaml", include_str!("../data/rules/immigration-bond.yaml")),
    ("rules/mistrial.yaml", include_str!("../data/rules/mistrial.yaml")),
];

const BUNDLED_TEMPLATES: &[(&str, &str)] = &[
    (
        "templates/bond-redetermination.yaml",
        include_str!("../data/templates/bond-redetermination.yaml"),
    ),
    (
        "templates/motion-for-mistrial.yaml",
        include_str!("../data/templates/motion-for-mistrial.yaml"),
    ),
];

impl TemplateRegistry {
    /// Registry built from the data set bundled with this crate.
    pub fn builtin() -> Result<Self, EngineError> {
        load_builtin()
    }

    /// Registry built from a data directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, EngineError> {
        load_dir(dir.as_ref())
    }
}

/// Build the registry from the bundled data set.
pub fn load_builtin() -> Result<TemplateRegistry, EngineError> {
    let districts = DistrictTable::from_yaml(BUNDLED_DISTRICTS)?;
    let rule_tables = BUNDLED_RULE_TABLES
        .iter()
        .map(|(name, yaml)| ((*name).to_string(), (*yaml).to_string()));
    let templates = BUNDLED_TEMPLATES
        .iter()
        .map(|(name, yaml)| ((*name).to_string(), (*yaml).to_string()));
    assemble(districts, rule_tables, templates)
}

/// Build the registry from a data directory.
pub fn load_dir(dir: &Path) -> Result<TemplateRegistry, EngineError> {
    tracing::info!(dir = %dir.display(), "Loading template data");
    let districts = DistrictTable::from_yaml(&read(&dir.join("districts.yaml"))?)?;
    let rule_tables = read_all(&dir.join("rules"))?;
    let templates = read_all(&dir.join("templates"))?;
    assemble(districts, rule_tables, templates)
}

fn assemble(
    districts: DistrictTable,
    rule_tables: impl IntoIterator<Item = (String, String)>,
    templates: impl IntoIterator<Item = (String, String)>,
) -> Result<TemplateRegistry, EngineError> {
    let mut builder = RegistryBuilder::new(districts);

    for (name, yaml) in rule_tables {
        let table =
            RuleTable::from_yaml(&yaml).map_err(|source| EngineError::Yaml { name, source })?;
        builder.add_rule_table(table)?;
    }

    for (name, yaml) in templates {
        let definition = TemplateDefinition::from_yaml(&yaml)
            .map_err(|source| EngineError::Yaml { name, source })?;
        builder.register(definition)?;
    }

    Ok(builder.build())
}

fn read(path: &Path) -> Result<String, EngineError> {
    fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `.yaml`/`.yml` file in a directory, sorted by file name.
fn read_all(dir: &Path) -> Result<Vec<(String, String)>, EngineError> {
    let entries = fs::read_dir(dir).map_err(|source| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| EngineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml");
        if is_yaml {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let yaml = read(&path)?;
            Ok((path.display().to_string(), yaml))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let registry = load_builtin().unwrap();
        assert!(registry.template("motion-for-mistrial").is_some());
        assert!(registry.template("bond-redetermination").is_some());
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let err = load_dir(Path::new("/nonexistent/motion-data")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn test_bad_yaml_names_file() {
        let districts = DistrictTable::default();
        let err = assemble(
            districts,
            vec![("rules/broken.yaml".to_string(), "id: [".to_string())],
            Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("rules/broken.yaml"));
    }
}
