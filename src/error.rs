//! Error types for DDL generation.
//!
//! Each pipeline stage has its own error kind so callers can tell a broken
//! entity model apart from a dialect gap or a file-system failure:
//! - [`MappingError`]: inconsistent entity metadata (aborts the run)
//! - [`UnsupportedTypeError`]: a logical type the dialect cannot render
//! - [`ExportError`]: directory creation, encoding or write failure

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or inconsistent entity metadata.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("duplicate table name '{table}' (entities '{first}' and '{second}')")]
    DuplicateTable {
        table: String,
        first: String,
        second: String,
    },

    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("duplicate entity name '{0}'")]
    DuplicateEntity(String),

    #[error("field '{entity}.{field}' has unmappable type '{type_name}'")]
    UnmappableType {
        entity: String,
        field: String,
        type_name: String,
    },

    #[error("field '{entity}.{field}' has no type")]
    MissingType { entity: String, field: String },

    #[error("field '{entity}.{field}' references unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        field: String,
        target: String,
    },

    #[error(
        "one-to-many field '{entity}.{field}' has no many-to-one owner on '{target}'{}",
        .mapped_by.as_ref().map(|m| format!(" (mapped_by '{m}')")).unwrap_or_default()
    )]
    MissingOwner {
        entity: String,
        field: String,
        target: String,
        mapped_by: Option<String>,
    },

    #[error("entity '{0}' declares no primary key")]
    MissingPrimaryKey(String),

    #[error("primary key of entity '{entity}' names unknown field '{field}'")]
    UnknownPrimaryKeyField { entity: String, field: String },

    #[error("primary key field '{entity}.{field}' must be a basic (non-relational) field")]
    RelationalPrimaryKey { entity: String, field: String },

    #[error("constraint on '{table}' names unknown column '{column}'")]
    UnknownConstraintColumn { table: String, column: String },

    #[error("field '{entity}.{field}': join_column needs a single-column primary key on '{target}'")]
    JoinColumnOnCompositeKey {
        entity: String,
        field: String,
        target: String,
    },

    #[error("persistence unit required; document declares: {}", .available.join(", "))]
    UnitRequired { available: Vec<String> },

    #[error("unknown persistence unit '{unit}'; document declares: {}", .available.join(", "))]
    UnknownUnit {
        unit: String,
        available: Vec<String>,
    },

    #[error("failed to read entity metadata from {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid entity document {path}: {message}")]
    Document { path: PathBuf, message: String },
}

/// A logical column type has no rendering in the selected dialect.
#[derive(Debug, Error)]
#[error(
    "dialect '{dialect}' has no type for {logical_type}{}",
    .column.as_ref().map(|c| format!(" (column '{c}')")).unwrap_or_default()
)]
pub struct UnsupportedTypeError {
    pub dialect: &'static str,
    pub logical_type: String,
    /// Qualified `table.column`, attached by the renderer
    pub column: Option<String>,
}

impl UnsupportedTypeError {
    pub fn new(dialect: &'static str, logical_type: impl ToString) -> Self {
        Self {
            dialect,
            logical_type: logical_type.to_string(),
            column: None,
        }
    }

    /// Attach the column the type was requested for.
    pub fn at(mut self, table: &str, column: &str) -> Self {
        self.column = Some(format!("{table}.{column}"));
        self
    }
}

/// Writing a script to disk failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported encoding '{0}'")]
    UnknownEncoding(String),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for the whole pipeline.
#[derive(Debug, Error)]
pub enum DdlError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedTypeError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, DdlError>;
