//! Logical schema derived from entity metadata.
//!
//! This module provides:
//! - Data models for tables, columns, keys, unique constraints and indexes
//! - The schema builder turning entity definitions into tables
//! - Dependency graph construction with deterministic topological sorting
//! - Cycle detection for deferring circular FK constraints

mod builder;
mod graph;

pub use builder::*;
pub use graph::*;

use ahash::AHashMap;
use std::fmt;

/// Unique identifier for a table within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Unique identifier for a column within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId(pub u16);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

pub const DEFAULT_LENGTH: u32 = 255;
pub const DEFAULT_PRECISION: u32 = 19;
pub const DEFAULT_SCALE: u32 = 2;

/// Dialect-neutral column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal { precision: u32, scale: u32 },
    /// Variable-length character string
    String { length: u32 },
    /// Fixed-length character string
    Char { length: u32 },
    /// Unbounded character data
    Text,
    Date,
    Time,
    Timestamp,
    Uuid,
    Binary { length: u32 },
    Blob,
}

impl LogicalType {
    /// Map an entity field type name to a logical type.
    ///
    /// Returns `None` for names with no logical counterpart.
    pub fn from_type_name(
        name: &str,
        length: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let ty = match lower.as_str() {
            "boolean" | "bool" => LogicalType::Boolean,
            "short" | "smallint" => LogicalType::SmallInt,
            "int" | "integer" => LogicalType::Integer,
            "long" | "bigint" => LogicalType::BigInt,
            "float" | "real" => LogicalType::Float,
            "double" => LogicalType::Double,
            "decimal" | "numeric" | "bigdecimal" => LogicalType::Decimal {
                precision: precision.unwrap_or(DEFAULT_PRECISION),
                scale: scale.unwrap_or(DEFAULT_SCALE),
            },
            "string" | "varchar" => LogicalType::String {
                length: length.unwrap_or(DEFAULT_LENGTH),
            },
            "char" | "character" => LogicalType::Char {
                length: length.unwrap_or(1),
            },
            "text" | "clob" => LogicalType::Text,
            "date" => LogicalType::Date,
            "time" => LogicalType::Time,
            "timestamp" | "datetime" | "instant" => LogicalType::Timestamp,
            "uuid" => LogicalType::Uuid,
            "binary" | "bytes" | "varbinary" => LogicalType::Binary {
                length: length.unwrap_or(DEFAULT_LENGTH),
            },
            "blob" => LogicalType::Blob,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Boolean => write!(f, "BOOLEAN"),
            LogicalType::SmallInt => write!(f, "SMALLINT"),
            LogicalType::Integer => write!(f, "INTEGER"),
            LogicalType::BigInt => write!(f, "BIGINT"),
            LogicalType::Float => write!(f, "FLOAT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({}, {})", precision, scale)
            }
            LogicalType::String { length } => write!(f, "STRING({})", length),
            LogicalType::Char { length } => write!(f, "CHAR({})", length),
            LogicalType::Text => write!(f, "TEXT"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::Time => write!(f, "TIME"),
            LogicalType::Timestamp => write!(f, "TIMESTAMP"),
            LogicalType::Uuid => write!(f, "UUID"),
            LogicalType::Binary { length } => write!(f, "BINARY({})", length),
            LogicalType::Blob => write!(f, "BLOB"),
        }
    }
}

/// Column definition within a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Logical column type
    pub col_type: LogicalType,
    /// Position in table (0-indexed)
    pub ordinal: ColumnId,
    /// Whether this column allows NULL values
    pub is_nullable: bool,
    /// Default value expression, rendered verbatim
    pub default: Option<String>,
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    /// Index name
    pub name: String,
    /// Columns in the index
    pub columns: Vec<String>,
    /// Whether this is a unique index
    pub is_unique: bool,
}

/// Named unique constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
}

/// Foreign key constraint definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name
    pub name: String,
    /// Owning (referencing) table name
    pub table: String,
    /// Column names in the owning table
    pub columns: Vec<String>,
    /// Referenced table name
    pub referenced_table: String,
    /// Referenced column names
    pub referenced_columns: Vec<String>,
    /// Referenced table ID
    pub referenced_table_id: TableId,
}

/// Complete table definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Table ID within the schema
    pub id: TableId,
    /// Column definitions in rendering order
    pub columns: Vec<Column>,
    /// Primary key column IDs (ordered for composite PKs)
    pub primary_key: Vec<ColumnId>,
    /// Foreign key constraints
    pub foreign_keys: Vec<ForeignKey>,
    /// Unique constraints
    pub unique_constraints: Vec<UniqueConstraint>,
    /// Index definitions
    pub indexes: Vec<IndexDef>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: String, id: TableId) -> Self {
        Self {
            name,
            id,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get column ID by name
    pub fn get_column_id(&self, name: &str) -> Option<ColumnId> {
        self.get_column(name).map(|c| c.ordinal)
    }

    /// Get column by ID
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    /// Check if column is part of the primary key
    pub fn is_pk_column(&self, col_id: ColumnId) -> bool {
        self.primary_key.contains(&col_id)
    }

    /// Primary key columns in key order
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key.iter().filter_map(|id| self.column(*id))
    }

    /// Append a column, returning its ID
    pub fn push_column(
        &mut self,
        name: String,
        col_type: LogicalType,
        is_nullable: bool,
        default: Option<String>,
    ) -> ColumnId {
        let ordinal = ColumnId(self.columns.len() as u16);
        self.columns.push(Column {
            name,
            col_type,
            ordinal,
            is_nullable,
            default,
        });
        ordinal
    }
}

/// Complete database schema
#[derive(Debug, Default)]
pub struct Schema {
    /// Map from lower-cased table name to table ID
    tables: AHashMap<String, TableId>,
    /// Tables indexed by TableId
    table_schemas: Vec<Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Get table ID by name (case-insensitive)
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        self.tables.get(&name.to_lowercase()).copied()
    }

    /// Get table by ID
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.table_schemas.get(id.0 as usize)
    }

    /// Get table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// Add a table, returning its ID.
    ///
    /// Returns `None` when a table of the same name (ignoring case) exists.
    pub(crate) fn add_table(&mut self, mut table: Table) -> Option<TableId> {
        let key = table.name.to_lowercase();
        if self.tables.contains_key(&key) {
            return None;
        }
        let id = TableId(self.table_schemas.len() as u32);
        table.id = id;
        self.tables.insert(key, id);
        self.table_schemas.push(table);
        Some(id)
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.table_schemas.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.table_schemas.is_empty()
    }

    /// Iterate over all tables in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.table_schemas.iter()
    }
}
