//! End-to-end DDL generation.
//!
//! Entity definitions are built into a schema and ordered once; the create
//! and drop scripts are then rendered and exported independently, on two
//! threads when both are requested. A mapping error aborts before any file
//! is touched. A failure in one script never affects the other.

mod config;

pub use config::*;

use crate::dialect::Dialect;
use crate::error::{DdlError, MappingError, UnsupportedTypeError};
use crate::export::export;
use crate::metadata::{EntityDefinition, MetadataProvider};
use crate::schema::{build_schema, CreatePlan, Schema, SchemaGraph};
use crate::script::{assemble, render_create, render_drop};
use log::{debug, info, warn};
use std::fmt;
use std::path::PathBuf;
use std::thread;

/// Which of the two scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Create,
    Drop,
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKind::Create => write!(f, "create"),
            ScriptKind::Drop => write!(f, "drop"),
        }
    }
}

/// An assembled script held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub kind: ScriptKind,
    /// Number of statements (and delimiters)
    pub statements: usize,
    pub text: String,
}

/// Schema plus its statement order, shared read-only by both scripts
#[derive(Debug)]
pub struct PreparedSchema {
    pub schema: Schema,
    pub plan: CreatePlan,
}

impl PreparedSchema {
    /// Table names in creation order
    pub fn table_order(&self) -> Vec<String> {
        self.plan
            .order
            .iter()
            .filter_map(|id| self.schema.table(*id))
            .map(|t| t.name.clone())
            .collect()
    }

    /// Deferred constraint names in attachment order
    pub fn deferred_constraints(&self) -> Vec<String> {
        self.plan
            .deferred
            .iter()
            .filter_map(|r| {
                self.schema
                    .table(r.table)
                    .and_then(|t| t.foreign_keys.get(r.index))
            })
            .map(|fk| fk.name.clone())
            .collect()
    }

    pub fn create_script(
        &self,
        dialect: &dyn Dialect,
        delimiter: &str,
    ) -> Result<Script, UnsupportedTypeError> {
        let statements = render_create(&self.schema, &self.plan, dialect)?;
        Ok(Script {
            kind: ScriptKind::Create,
            statements: statements.len(),
            text: assemble(&statements, delimiter),
        })
    }

    pub fn drop_script(&self, dialect: &dyn Dialect, delimiter: &str) -> Script {
        let statements = render_drop(&self.schema, &self.plan, dialect);
        Script {
            kind: ScriptKind::Drop,
            statements: statements.len(),
            text: assemble(&statements, delimiter),
        }
    }

    /// Render one script
    pub fn script(
        &self,
        kind: ScriptKind,
        dialect: &dyn Dialect,
        delimiter: &str,
    ) -> Result<Script, UnsupportedTypeError> {
        match kind {
            ScriptKind::Create => self.create_script(dialect, delimiter),
            ScriptKind::Drop => Ok(self.drop_script(dialect, delimiter)),
        }
    }
}

/// Build and order the schema for a set of entities.
pub fn prepare(
    entities: &[EntityDefinition],
    config: &ExportConfig,
) -> Result<PreparedSchema, MappingError> {
    let schema = build_schema(entities)?;
    let graph = SchemaGraph::from_schema(&schema);
    let plan = graph.plan(config.constraints);

    info!(
        "{} entities -> {} tables ({} constraint mode)",
        entities.len(),
        schema.len(),
        config.constraints
    );
    if !plan.cyclic_tables.is_empty() {
        let names: Vec<&str> = plan
            .cyclic_tables
            .iter()
            .filter_map(|id| graph.table_name(*id))
            .collect();
        info!(
            "foreign key cycle through {}; {} constraint(s) deferred",
            names.join(", "),
            plan.deferred.len()
        );
    }

    Ok(PreparedSchema { schema, plan })
}

/// A script written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub kind: ScriptKind,
    pub path: PathBuf,
    pub statements: usize,
    pub bytes: usize,
    pub sha256: String,
}

/// Result of one generation run
#[derive(Debug)]
pub struct ExportReport {
    pub dialect: &'static str,
    pub unit: Option<String>,
    /// Table names in creation order
    pub tables: Vec<String>,
    /// Constraints attached after table creation
    pub deferred_constraints: Vec<String>,
    /// `None` when the script was not requested
    pub create: Option<Result<ScriptOutcome, DdlError>>,
    pub drop: Option<Result<ScriptOutcome, DdlError>>,
}

impl ExportReport {
    /// Whether any requested script failed
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Failed scripts with their errors
    pub fn failures(&self) -> impl Iterator<Item = (ScriptKind, &DdlError)> {
        [(ScriptKind::Create, &self.create), (ScriptKind::Drop, &self.drop)]
            .into_iter()
            .filter_map(|(kind, outcome)| match outcome {
                Some(Err(e)) => Some((kind, e)),
                _ => None,
            })
    }

    /// Successfully written scripts
    pub fn written(&self) -> impl Iterator<Item = &ScriptOutcome> {
        [&self.create, &self.drop]
            .into_iter()
            .filter_map(|outcome| outcome.as_ref().and_then(|r| r.as_ref().ok()))
    }
}

fn export_script(
    prepared: &PreparedSchema,
    kind: ScriptKind,
    config: &ExportConfig,
) -> Result<ScriptOutcome, DdlError> {
    let dialect = config.dialect.dialect();
    let script = prepared.script(kind, dialect, &config.delimiter)?;
    let file_name = match kind {
        ScriptKind::Create => &config.create_file,
        ScriptKind::Drop => &config.drop_file,
    };
    debug!("{} script: {} statements", kind, script.statements);

    let file = export(&config.output_dir, file_name, &script.text, &config.encoding)?;
    Ok(ScriptOutcome {
        kind,
        path: file.path,
        statements: script.statements,
        bytes: file.bytes,
        sha256: file.sha256,
    })
}

fn join_script(
    handle: thread::ScopedJoinHandle<'_, Result<ScriptOutcome, DdlError>>,
) -> Result<ScriptOutcome, DdlError> {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Generate and export the configured scripts for `entities`.
///
/// Returns `Err` only for mapping errors; per-script failures are carried
/// in the report.
pub fn generate(
    entities: &[EntityDefinition],
    config: &ExportConfig,
) -> Result<ExportReport, MappingError> {
    let prepared = prepare(entities, config)?;

    let (create, drop) = thread::scope(|scope| {
        let prepared = &prepared;
        let create = config
            .generate_create
            .then(|| scope.spawn(move || export_script(prepared, ScriptKind::Create, config)));
        let drop = config
            .generate_drop
            .then(|| scope.spawn(move || export_script(prepared, ScriptKind::Drop, config)));
        (create.map(join_script), drop.map(join_script))
    });

    for (kind, outcome) in [(ScriptKind::Create, &create), (ScriptKind::Drop, &drop)] {
        if let Some(Err(e)) = outcome {
            warn!("{} script failed: {}", kind, e);
        }
    }

    Ok(ExportReport {
        dialect: config.dialect.dialect().name(),
        unit: None,
        tables: prepared.table_order(),
        deferred_constraints: prepared.deferred_constraints(),
        create,
        drop,
    })
}

/// Pull entities from a provider and generate scripts.
pub fn run<P: MetadataProvider + ?Sized>(
    provider: &P,
    config: &ExportConfig,
) -> Result<ExportReport, MappingError> {
    let unit = provider.unit_name().map(str::to_string);
    if let Some(unit) = &unit {
        info!("process persistence unit: {}", unit);
    }
    let entities = provider.entities()?;
    let mut report = generate(&entities, config)?;
    report.unit = unit;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqlDialect;
    use crate::metadata::{FieldDefinition, RelationKind};
    use tempfile::TempDir;

    fn entities() -> Vec<EntityDefinition> {
        vec![
            EntityDefinition::new("Author").with_id(FieldDefinition::basic("id", "long")),
            EntityDefinition::new("Book")
                .with_id(FieldDefinition::basic("id", "long"))
                .with_field(FieldDefinition::basic("isbn", "uuid"))
                .with_field(FieldDefinition::relation(
                    "author",
                    RelationKind::ManyToOne,
                    "Author",
                )),
        ]
    }

    fn config(dir: &TempDir, dialect: SqlDialect) -> ExportConfig {
        ExportConfig {
            output_dir: dir.path().join("ddl"),
            dialect,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_writes_both_scripts() {
        let dir = TempDir::new().unwrap();
        let report = generate(&entities(), &config(&dir, SqlDialect::Postgres)).unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.tables, vec!["Author", "Book"]);
        assert_eq!(report.written().count(), 2);
        assert!(dir.path().join("ddl/create.sql").exists());
        assert!(dir.path().join("ddl/drop.sql").exists());
    }

    #[test]
    fn test_unsupported_type_fails_only_create() {
        let dir = TempDir::new().unwrap();
        let report = generate(&entities(), &config(&dir, SqlDialect::Ansi)).unwrap();
        assert!(report.has_failures());

        let failures: Vec<_> = report.failures().map(|(k, _)| k).collect();
        assert_eq!(failures, vec![ScriptKind::Create]);
        assert!(!dir.path().join("ddl/create.sql").exists());
        assert!(dir.path().join("ddl/drop.sql").exists());
    }

    #[test]
    fn test_skipped_script_is_absent() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, SqlDialect::MySql);
        cfg.generate_create = false;
        let report = generate(&entities(), &cfg).unwrap();
        assert!(report.create.is_none());
        assert!(matches!(report.drop, Some(Ok(_))));
    }

    #[test]
    fn test_run_with_provider() {
        let dir = TempDir::new().unwrap();
        let report = run(&entities(), &config(&dir, SqlDialect::MySql)).unwrap();
        assert!(report.unit.is_none());
        assert_eq!(report.dialect, "mysql");
    }
}
