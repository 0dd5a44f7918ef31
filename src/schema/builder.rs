//! Schema construction from entity definitions.
//!
//! Turns the entity model into tables:
//! - One table per entity, columns in field order
//! - Foreign-key columns for many-to-one and owning one-to-one fields
//! - Synthesized join tables for owning many-to-many fields
//! - Unique constraints and secondary indexes

use super::{ColumnId, ForeignKey, IndexDef, LogicalType, Schema, Table, TableId, UniqueConstraint};
use crate::error::MappingError;
use crate::metadata::{EntityDefinition, FieldDefinition, Relation, RelationKind};
use ahash::AHashMap;
use log::debug;
use sha2::{Digest, Sha256};

/// Longest identifier PostgreSQL stores without truncating it
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Per-entity facts resolved before any column is built
#[derive(Debug)]
struct EntityInfo {
    table_id: TableId,
    table_name: String,
    /// Primary key columns with their types, in key order
    pk: Vec<(String, LogicalType)>,
}

/// Many-to-many relationship waiting for its join table
#[derive(Debug)]
struct PendingJoin {
    owner: usize,
    field: String,
    target: usize,
    join_table: Option<String>,
}

/// Builder for constructing a schema from entity definitions
#[derive(Debug)]
pub struct SchemaBuilder<'a> {
    entities: &'a [EntityDefinition],
    /// Entity name -> index into `entities`
    by_name: AHashMap<&'a str, usize>,
    infos: Vec<EntityInfo>,
    tables: Vec<Table>,
    /// Lower-cased table name -> owner description, for duplicate detection
    table_owners: AHashMap<String, String>,
}

impl<'a> SchemaBuilder<'a> {
    /// Create a new schema builder over the given entities
    pub fn new(entities: &'a [EntityDefinition]) -> Self {
        Self {
            entities,
            by_name: AHashMap::with_capacity(entities.len()),
            infos: Vec::with_capacity(entities.len()),
            tables: Vec::with_capacity(entities.len()),
            table_owners: AHashMap::with_capacity(entities.len()),
        }
    }

    /// Build the schema, consuming the builder
    pub fn build(mut self) -> Result<Schema, MappingError> {
        self.resolve_entities()?;

        let mut pending = Vec::new();
        for idx in 0..self.entities.len() {
            self.build_entity_table(idx, &mut pending)?;
        }

        self.build_join_tables(pending)?;

        let mut schema = Schema::new();
        for table in self.tables {
            let name = table.name.clone();
            if schema.add_table(table).is_none() {
                return Err(MappingError::DuplicateTable {
                    first: name.clone(),
                    second: name.clone(),
                    table: name,
                });
            }
        }
        debug!("built {} tables", schema.len());
        Ok(schema)
    }

    /// First pass: table names, IDs and primary key shapes.
    fn resolve_entities(&mut self) -> Result<(), MappingError> {
        for (idx, entity) in self.entities.iter().enumerate() {
            if self.by_name.insert(entity.name.as_str(), idx).is_some() {
                return Err(MappingError::DuplicateEntity(entity.name.clone()));
            }

            let table_name = entity.table_name().to_string();
            self.claim_table_name(&table_name, &entity.name)?;

            if entity.primary_key.is_empty() {
                return Err(MappingError::MissingPrimaryKey(entity.name.clone()));
            }

            let mut pk = Vec::with_capacity(entity.primary_key.len());
            for field_name in &entity.primary_key {
                let field = entity.field(field_name).ok_or_else(|| {
                    MappingError::UnknownPrimaryKeyField {
                        entity: entity.name.clone(),
                        field: field_name.clone(),
                    }
                })?;
                if field.relation.is_some() {
                    return Err(MappingError::RelationalPrimaryKey {
                        entity: entity.name.clone(),
                        field: field_name.clone(),
                    });
                }
                pk.push((
                    field.column_name().to_string(),
                    map_field_type(entity, field)?,
                ));
            }

            self.infos.push(EntityInfo {
                table_id: TableId(idx as u32),
                table_name,
                pk,
            });
        }
        Ok(())
    }

    fn claim_table_name(&mut self, table: &str, owner: &str) -> Result<(), MappingError> {
        let key = table.to_lowercase();
        if let Some(first) = self.table_owners.get(&key) {
            return Err(MappingError::DuplicateTable {
                table: table.to_string(),
                first: first.clone(),
                second: owner.to_string(),
            });
        }
        self.table_owners.insert(key, owner.to_string());
        Ok(())
    }

    fn target_index(&self, entity: &EntityDefinition, field: &FieldDefinition, rel: &Relation) -> Result<usize, MappingError> {
        self.by_name
            .get(rel.target.as_str())
            .copied()
            .ok_or_else(|| MappingError::UnknownTarget {
                entity: entity.name.clone(),
                field: field.name.clone(),
                target: rel.target.clone(),
            })
    }

    /// Second pass: columns, keys and constraints of one entity table.
    fn build_entity_table(
        &mut self,
        idx: usize,
        pending: &mut Vec<PendingJoin>,
    ) -> Result<(), MappingError> {
        let entities = self.entities;
        let entity = &entities[idx];
        let info = &self.infos[idx];
        let mut table = Table::new(info.table_name.clone(), info.table_id);

        for field in &entity.fields {
            let Some(rel) = field.relation.as_ref() else {
                let is_pk = entity.primary_key.contains(&field.name);
                let col_type = map_field_type(entity, field)?;
                let column = field.column_name().to_string();
                add_column(
                    &mut table,
                    column.clone(),
                    col_type,
                    field.nullable && !is_pk,
                    field.default.clone(),
                )?;
                // A unique single-column key is already unique
                let sole_pk = is_pk && entity.primary_key.len() == 1;
                if field.unique && !sole_pk {
                    table.unique_constraints.push(UniqueConstraint {
                        name: constraint_name("uk", &table.name, &column),
                        columns: vec![column],
                    });
                }
                continue;
            };

            let target = self.target_index(entity, field, rel)?;
            match rel.kind {
                RelationKind::ManyToOne | RelationKind::OneToOne if rel.is_owning() => {
                    self.add_reference(&mut table, entity, field, rel, target)?;
                }
                RelationKind::ManyToMany if rel.is_owning() => {
                    pending.push(PendingJoin {
                        owner: idx,
                        field: field.name.clone(),
                        target,
                        join_table: rel.join_table.clone(),
                    });
                }
                _ => self.check_owner(entity, field, rel, target)?,
            }
        }

        for field_name in &entity.primary_key {
            let column = entity
                .field(field_name)
                .map(|f| f.column_name())
                .unwrap_or(field_name.as_str());
            if let Some(id) = table.get_column_id(column) {
                table.primary_key.push(id);
            }
        }

        for columns in &entity.unique {
            check_columns(&table, columns)?;
            table.unique_constraints.push(UniqueConstraint {
                name: constraint_name("uk", &table.name, &columns.join("_")),
                columns: columns.clone(),
            });
        }

        for index in &entity.indexes {
            check_columns(&table, &index.columns)?;
            table.indexes.push(IndexDef {
                name: index.name.clone().unwrap_or_else(|| {
                    constraint_name("idx", &table.name, &index.columns.join("_"))
                }),
                columns: index.columns.clone(),
                is_unique: index.unique,
            });
        }

        debug!(
            "table {} <- entity {} ({} columns, {} foreign keys)",
            table.name,
            entity.name,
            table.columns.len(),
            table.foreign_keys.len()
        );
        self.tables.push(table);
        Ok(())
    }

    /// Foreign-key columns for a many-to-one or owning one-to-one field.
    fn add_reference(
        &self,
        table: &mut Table,
        entity: &EntityDefinition,
        field: &FieldDefinition,
        rel: &Relation,
        target: usize,
    ) -> Result<(), MappingError> {
        let target_info = &self.infos[target];
        if rel.join_column.is_some() && target_info.pk.len() != 1 {
            return Err(MappingError::JoinColumnOnCompositeKey {
                entity: entity.name.clone(),
                field: field.name.clone(),
                target: rel.target.clone(),
            });
        }

        let mut columns = Vec::with_capacity(target_info.pk.len());
        for (pk_col, pk_type) in &target_info.pk {
            let name = match &rel.join_column {
                Some(explicit) => explicit.clone(),
                None => format!("{}_{}", field.name, pk_col),
            };
            add_column(table, name.clone(), *pk_type, field.nullable, None)?;
            columns.push(name);
        }

        if rel.kind == RelationKind::OneToOne || field.unique {
            table.unique_constraints.push(UniqueConstraint {
                name: constraint_name("uk", &table.name, &field.name),
                columns: columns.clone(),
            });
        }

        table.foreign_keys.push(ForeignKey {
            name: constraint_name("fk", &table.name, &field.name),
            table: table.name.clone(),
            columns,
            referenced_table: target_info.table_name.clone(),
            referenced_columns: target_info.pk.iter().map(|(c, _)| c.clone()).collect(),
            referenced_table_id: target_info.table_id,
        });
        Ok(())
    }

    /// Inverse sides must be backed by an owning field on the target.
    fn check_owner(
        &self,
        entity: &EntityDefinition,
        field: &FieldDefinition,
        rel: &Relation,
        target: usize,
    ) -> Result<(), MappingError> {
        let target_entity = &self.entities[target];
        let owner_kind = match rel.kind {
            RelationKind::OneToMany | RelationKind::ManyToOne => RelationKind::ManyToOne,
            RelationKind::OneToOne => RelationKind::OneToOne,
            RelationKind::ManyToMany => RelationKind::ManyToMany,
        };

        let is_owner = |candidate: &FieldDefinition| {
            candidate.relation.as_ref().is_some_and(|r| {
                r.kind == owner_kind && r.target == entity.name && r.is_owning()
            })
        };

        let found = match rel.mapped_by.as_deref() {
            Some(name) => target_entity.field(name).is_some_and(is_owner),
            None => target_entity.fields.iter().any(is_owner),
        };

        if found {
            Ok(())
        } else {
            Err(MappingError::MissingOwner {
                entity: entity.name.clone(),
                field: field.name.clone(),
                target: rel.target.clone(),
                mapped_by: rel.mapped_by.clone(),
            })
        }
    }

    /// Synthesize one join table per distinct many-to-many relationship.
    fn build_join_tables(&mut self, pending: Vec<PendingJoin>) -> Result<(), MappingError> {
        // join table name (lower-cased) -> (owner, target, owning field) it was built for
        let mut built: AHashMap<String, (usize, usize, String)> = AHashMap::new();

        for join in pending {
            // Sides ordered by table name so the result ignores declaration order
            let (a, b) =
                if self.infos[join.owner].table_name <= self.infos[join.target].table_name {
                    (join.owner, join.target)
                } else {
                    (join.target, join.owner)
                };

            let name = join.join_table.clone().unwrap_or_else(|| {
                format!("{}_{}", self.infos[a].table_name, self.infos[b].table_name)
            });
            let key = name.to_lowercase();

            let owner_desc = format!("{}.{}", self.entities[join.owner].name, join.field);
            if let Some((owner, target, first)) = built.get(&key) {
                // Same relationship declared from the other side
                let mirrored =
                    *owner == join.target && *target == join.owner && join.owner != join.target;
                if mirrored {
                    continue;
                }
                return Err(MappingError::DuplicateTable {
                    table: name,
                    first: first.clone(),
                    second: owner_desc,
                });
            }

            self.claim_table_name(&name, &owner_desc)?;
            built.insert(key, (join.owner, join.target, owner_desc));

            let (side_a, side_b) = (&self.infos[a], &self.infos[b]);
            let id = TableId(self.tables.len() as u32);
            let mut table = Table::new(name, id);

            let second_prefix = if a == b {
                join.field.as_str()
            } else {
                side_b.table_name.as_str()
            };
            let sides = [
                (side_a, side_a.table_name.as_str()),
                (side_b, second_prefix),
            ];

            for (side, prefix) in sides {
                let mut columns = Vec::with_capacity(side.pk.len());
                for (pk_col, pk_type) in &side.pk {
                    let column = format!("{}_{}", prefix, pk_col);
                    let col_id = add_column(&mut table, column.clone(), *pk_type, false, None)?;
                    table.primary_key.push(col_id);
                    columns.push(column);
                }
                table.foreign_keys.push(ForeignKey {
                    name: constraint_name("fk", &table.name, prefix),
                    table: table.name.clone(),
                    columns,
                    referenced_table: side.table_name.clone(),
                    referenced_columns: side.pk.iter().map(|(c, _)| c.clone()).collect(),
                    referenced_table_id: side.table_id,
                });
            }

            debug!(
                "join table {} for {} <-> {}",
                table.name, side_a.table_name, side_b.table_name
            );
            self.tables.push(table);
        }
        Ok(())
    }
}

/// Build a schema from entity definitions
pub fn build_schema(entities: &[EntityDefinition]) -> Result<Schema, MappingError> {
    SchemaBuilder::new(entities).build()
}

fn map_field_type(
    entity: &EntityDefinition,
    field: &FieldDefinition,
) -> Result<LogicalType, MappingError> {
    let type_name = field
        .type_name
        .as_deref()
        .ok_or_else(|| MappingError::MissingType {
            entity: entity.name.clone(),
            field: field.name.clone(),
        })?;
    LogicalType::from_type_name(type_name, field.length, field.precision, field.scale).ok_or_else(
        || MappingError::UnmappableType {
            entity: entity.name.clone(),
            field: field.name.clone(),
            type_name: type_name.to_string(),
        },
    )
}

/// `<prefix>_<table>_<suffix>`, cut to [`MAX_IDENTIFIER_LEN`] with a hash of the full name.
fn constraint_name(prefix: &str, table: &str, suffix: &str) -> String {
    let name = format!("{}_{}_{}", prefix, table, suffix);
    if name.len() <= MAX_IDENTIFIER_LEN {
        return name;
    }
    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let mut cut = MAX_IDENTIFIER_LEN - 9;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}_{}", &name[..cut], &digest[..8])
}

fn add_column(
    table: &mut Table,
    name: String,
    col_type: LogicalType,
    nullable: bool,
    default: Option<String>,
) -> Result<ColumnId, MappingError> {
    if table.get_column(&name).is_some() {
        return Err(MappingError::DuplicateColumn {
            table: table.name.clone(),
            column: name,
        });
    }
    Ok(table.push_column(name, col_type, nullable, default))
}

fn check_columns(table: &Table, columns: &[String]) -> Result<(), MappingError> {
    match columns.iter().find(|c| table.get_column(c).is_none()) {
        Some(missing) => Err(MappingError::UnknownConstraintColumn {
            table: table.name.clone(),
            column: missing.clone(),
        }),
        None => Ok(()),
    }
}
