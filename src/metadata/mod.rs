//! Entity metadata consumed by the schema builder.
//!
//! This module provides:
//! - The entity / field / relationship model handed over by a metadata source
//! - The [`MetadataProvider`] seam any discovery mechanism plugs in behind
//! - A file-backed provider reading YAML or JSON entity documents

mod file;

pub use file::*;

use crate::error::MappingError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A persistent entity: one table's worth of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntityDefinition {
    /// Entity name, used for relationship targets
    pub name: String,
    /// Table name override (defaults to the entity name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Names of the fields forming the primary key
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Composite unique constraints, as column name lists
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique: Vec<Vec<String>>,
    /// Secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexDefinition>,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
            primary_key: Vec::new(),
            unique: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a field and make it (part of) the primary key
    pub fn with_id(mut self, field: FieldDefinition) -> Self {
        self.primary_key.push(field.name.clone());
        self.fields.push(field.not_null());
        self
    }

    pub fn with_unique<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.unique
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// Table name this entity maps to
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A single persistent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDefinition {
    pub name: String,
    /// Logical type name (`string`, `long`, `decimal`, ...); absent for relationships
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    /// Column default expression, rendered verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Column name override (defaults to the field name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
}

impl FieldDefinition {
    /// A basic field of the given logical type
    pub fn basic(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            unique: false,
            default: None,
            column: None,
            relation: None,
        }
    }

    /// A relationship field
    pub fn relation(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            unique: false,
            default: None,
            column: None,
            relation: Some(Relation::new(kind, target)),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn mapped_by(mut self, field: impl Into<String>) -> Self {
        if let Some(rel) = self.relation.as_mut() {
            rel.mapped_by = Some(field.into());
        }
        self
    }

    pub fn join_column(mut self, column: impl Into<String>) -> Self {
        if let Some(rel) = self.relation.as_mut() {
            rel.join_column = Some(column.into());
        }
        self
    }

    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        if let Some(rel) = self.relation.as_mut() {
            rel.join_table = Some(table.into());
        }
        self
    }

    /// Column name this field maps to
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    pub fn relation_kind(&self) -> Option<RelationKind> {
        self.relation.as_ref().map(|r| r.kind)
    }
}

/// Relationship cardinality as seen from the declaring entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    ManyToOne,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationKind::ManyToOne => write!(f, "many-to-one"),
            RelationKind::OneToOne => write!(f, "one-to-one"),
            RelationKind::OneToMany => write!(f, "one-to-many"),
            RelationKind::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

/// Relationship to another entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relation {
    pub kind: RelationKind,
    /// Target entity name
    pub target: String,
    /// Owning field on the target (inverse side only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_by: Option<String>,
    /// Foreign key column name (single-column target keys only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_column: Option<String>,
    /// Join table name override (many-to-many only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_table: Option<String>,
}

impl Relation {
    pub fn new(kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            mapped_by: None,
            join_column: None,
            join_table: None,
        }
    }

    /// Whether this side owns the foreign key / join table
    pub fn is_owning(&self) -> bool {
        match self.kind {
            RelationKind::ManyToOne => true,
            RelationKind::OneToMany => false,
            RelationKind::OneToOne | RelationKind::ManyToMany => self.mapped_by.is_none(),
        }
    }
}

/// Secondary index over one or more columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDefinition {
    pub fn on<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }
}

/// Named group of entities processed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PersistenceUnit {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

/// On-disk entity document: named units and/or a bare entity list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EntityDocument {
    pub units: Vec<PersistenceUnit>,
    pub entities: Vec<EntityDefinition>,
}

/// Source of entity definitions for one run
pub trait MetadataProvider {
    /// Fully resolved entity definitions, in declaration order
    fn entities(&self) -> Result<Vec<EntityDefinition>, MappingError>;

    /// Persistence unit the entities belong to, if any
    fn unit_name(&self) -> Option<&str> {
        None
    }
}

impl MetadataProvider for Vec<EntityDefinition> {
    fn entities(&self) -> Result<Vec<EntityDefinition>, MappingError> {
        Ok(self.clone())
    }
}

impl MetadataProvider for [EntityDefinition] {
    fn entities(&self) -> Result<Vec<EntityDefinition>, MappingError> {
        Ok(self.to_vec())
    }
}

fn unit_names(units: &[PersistenceUnit]) -> Vec<String> {
    units.iter().map(|u| u.name.clone()).collect()
}

/// Pick the entities of one persistence unit out of a set of documents.
///
/// Bare `entities` lists belong to every unit. A named unit must be
/// selected explicitly when more than one is declared.
pub fn select_unit(
    documents: Vec<EntityDocument>,
    unit: Option<&str>,
) -> Result<(Option<String>, Vec<EntityDefinition>), MappingError> {
    let mut shared = Vec::new();
    // Units keep first-seen order; same-named units across files are merged
    let mut units: Vec<PersistenceUnit> = Vec::new();

    for doc in documents {
        shared.extend(doc.entities);
        for u in doc.units {
            match units.iter_mut().find(|existing| existing.name == u.name) {
                Some(existing) => existing.entities.extend(u.entities),
                None => units.push(u),
            }
        }
    }

    let selected = match unit {
        Some(name) => match units.iter().position(|u| u.name == name) {
            Some(idx) => Some(units.swap_remove(idx)),
            None => {
                return Err(MappingError::UnknownUnit {
                    unit: name.to_string(),
                    available: unit_names(&units),
                })
            }
        },
        None if units.len() > 1 => {
            return Err(MappingError::UnitRequired {
                available: unit_names(&units),
            })
        }
        None => units.pop(),
    };

    match selected {
        Some(u) => {
            shared.extend(u.entities);
            Ok((Some(u.name), shared))
        }
        None => Ok((None, shared)),
    }
}
