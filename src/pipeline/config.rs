//! Export configuration.
//!
//! Values come from built-in defaults, an optional YAML file and finally
//! command-line flags, in that order.

use crate::dialect::SqlDialect;
use crate::schema::ConstraintMode;
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DELIMITER: &str = ";";
pub const DEFAULT_CREATE_FILE: &str = "create.sql";
pub const DEFAULT_DROP_FILE: &str = "drop.sql";
pub const DEFAULT_ENCODING: &str = "UTF-8";
pub const DEFAULT_OUTPUT_DIR: &str = "target/generated-resources/ddl";

/// Settings consumed by the export pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// End-of-statement delimiter
    pub delimiter: String,
    pub output_dir: PathBuf,
    pub create_file: String,
    pub drop_file: String,
    pub generate_create: bool,
    pub generate_drop: bool,
    /// Output encoding name
    pub encoding: String,
    pub dialect: SqlDialect,
    pub constraints: ConstraintMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            create_file: DEFAULT_CREATE_FILE.to_string(),
            drop_file: DEFAULT_DROP_FILE.to_string(),
            generate_create: true,
            generate_drop: true,
            encoding: DEFAULT_ENCODING.to_string(),
            dialect: SqlDialect::default(),
            constraints: ConstraintMode::default(),
        }
    }
}

/// YAML configuration file (`ddl-export.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DdlYamlConfig {
    pub delimiter: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub create_file: Option<String>,
    pub drop_file: Option<String>,
    pub generate_create: Option<bool>,
    pub generate_drop: Option<bool>,
    pub encoding: Option<String>,
    pub dialect: Option<String>,
    pub constraints: Option<String>,
    /// Persistence unit to process
    pub unit: Option<String>,
    /// Entity document format (`yaml` or `json`)
    pub format: Option<String>,
}

impl DdlYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: DdlYamlConfig = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Overlay the values set in this file onto `config`
    pub fn apply_to(&self, config: &mut ExportConfig) -> anyhow::Result<()> {
        if let Some(delimiter) = &self.delimiter {
            config.delimiter = delimiter.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(name) = &self.create_file {
            config.create_file = name.clone();
        }
        if let Some(name) = &self.drop_file {
            config.drop_file = name.clone();
        }
        if let Some(flag) = self.generate_create {
            config.generate_create = flag;
        }
        if let Some(flag) = self.generate_drop {
            config.generate_drop = flag;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        if let Some(dialect) = &self.dialect {
            config.dialect = dialect.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(mode) = &self.constraints {
            config.constraints = mode.parse().map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}
