//! Entity documents read from YAML or JSON files.

use super::{select_unit, EntityDefinition, EntityDocument, MetadataProvider};
use crate::error::MappingError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialization format of an entity document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    /// Detect the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }

    /// Detect from a path, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(SourceFormat::Yaml)
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
            .ok_or_else(|| format!("Unknown metadata format: {}. Valid options: yaml, json", s))
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Yaml => write!(f, "yaml"),
            SourceFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a single entity document from text
pub fn parse_document(
    content: &str,
    format: SourceFormat,
    path: &Path,
) -> Result<EntityDocument, MappingError> {
    let parsed = match format {
        SourceFormat::Yaml => serde_yaml_ng::from_str(content).map_err(|e| e.to_string()),
        SourceFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| MappingError::Document {
        path: path.to_path_buf(),
        message,
    })
}

/// Metadata provider backed by one or more entity documents on disk.
///
/// Files are read in the given order; their entities are concatenated.
#[derive(Debug, Clone)]
pub struct FileMetadataProvider {
    files: Vec<PathBuf>,
    format: Option<SourceFormat>,
    unit: Option<String>,
}

impl FileMetadataProvider {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            format: None,
            unit: None,
        }
    }

    /// Force a format instead of detecting it per file
    pub fn with_format(mut self, format: Option<SourceFormat>) -> Self {
        self.format = format;
        self
    }

    /// Select a persistence unit
    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Read every document, then pick the configured unit.
    pub fn load(&self) -> Result<(Option<String>, Vec<EntityDefinition>), MappingError> {
        let mut documents = Vec::with_capacity(self.files.len());
        for path in &self.files {
            let content = fs::read_to_string(path).map_err(|source| MappingError::Source {
                path: path.clone(),
                source,
            })?;
            let format = self.format.unwrap_or_else(|| SourceFormat::from_path(path));
            debug!("reading {} entity document {}", format, path.display());
            documents.push(parse_document(&content, format, path)?);
        }
        select_unit(documents, self.unit.as_deref())
    }
}

impl MetadataProvider for FileMetadataProvider {
    fn entities(&self) -> Result<Vec<EntityDefinition>, MappingError> {
        self.load().map(|(_, entities)| entities)
    }

    fn unit_name(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}
