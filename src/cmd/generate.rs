use super::glob_util::expand_all;
use super::GenerateArgs;
use ddl_export::export::Charset;
use ddl_export::metadata::{FileMetadataProvider, SourceFormat};
use ddl_export::pipeline::{
    self, DdlYamlConfig, ExportConfig, ExportReport, PreparedSchema, ScriptKind,
};
use log::{error, info};
use schemars::JsonSchema;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Instant;

/// JSON output for the generate command
#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateJsonOutput {
    dialect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    output_dir: String,
    dry_run: bool,
    /// Table names in creation order
    tables: Vec<String>,
    /// Foreign keys attached with ALTER TABLE after all tables exist
    deferred_constraints: Vec<String>,
    scripts: Vec<ScriptJson>,
    elapsed_secs: f64,
}

#[derive(Serialize, JsonSchema)]
pub(crate) struct ScriptJson {
    /// `create` or `drop`
    kind: String,
    file: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    statements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    /// SHA-256 of the encoded script bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ScriptJson {
    fn failed(kind: ScriptKind, file: String, error: String) -> Self {
        Self {
            kind: kind.to_string(),
            file,
            status: "failed".to_string(),
            statements: None,
            bytes: None,
            sha256: None,
            error: Some(error),
        }
    }
}

/// Layer defaults, the YAML file and command-line flags
fn resolve_config(args: &GenerateArgs) -> anyhow::Result<(ExportConfig, DdlYamlConfig)> {
    let yaml = match &args.config {
        Some(path) => DdlYamlConfig::load(path)?,
        None => DdlYamlConfig::default(),
    };

    let mut config = ExportConfig::default();
    yaml.apply_to(&mut config)?;

    if let Some(dir) = &args.output {
        config.output_dir = dir.clone();
    }
    if let Some(dialect) = &args.dialect {
        config.dialect = dialect.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(delimiter) = &args.delimiter {
        config.delimiter = delimiter.clone();
    }
    if let Some(name) = &args.create_file {
        config.create_file = name.clone();
    }
    if let Some(name) = &args.drop_file {
        config.drop_file = name.clone();
    }
    if args.no_create {
        config.generate_create = false;
    }
    if args.no_drop {
        config.generate_drop = false;
    }
    if let Some(encoding) = &args.encoding {
        config.encoding = encoding.clone();
    }
    if let Some(mode) = &args.constraints {
        config.constraints = mode.parse().map_err(anyhow::Error::msg)?;
    }

    Ok((config, yaml))
}

fn requested(config: &ExportConfig) -> Vec<(ScriptKind, &str)> {
    let mut kinds = Vec::with_capacity(2);
    if config.generate_create {
        kinds.push((ScriptKind::Create, config.create_file.as_str()));
    }
    if config.generate_drop {
        kinds.push((ScriptKind::Drop, config.drop_file.as_str()));
    }
    kinds
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let (config, yaml) = resolve_config(&args)?;

    let format = match args.format.as_deref().or(yaml.format.as_deref()) {
        Some(f) => Some(f.parse::<SourceFormat>().map_err(anyhow::Error::msg)?),
        None => None,
    };
    let unit = args.unit.clone().or(yaml.unit.clone());

    let files = expand_all(&args.files)?;
    info!("reading {} entity document(s)", files.len());

    let provider = FileMetadataProvider::new(files)
        .with_format(format)
        .with_unit(unit);
    let (unit, entities) = provider.load()?;
    if let Some(name) = &unit {
        info!("process persistence unit: {}", name);
    }

    if args.dry_run {
        let prepared = pipeline::prepare(&entities, &config)?;
        return dry_run(&prepared, &config, unit, args.json, start_time);
    }

    let mut report = pipeline::generate(&entities, &config)?;
    report.unit = unit;

    if args.json {
        let output = json_from_report(&report, &config, start_time);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&report, &config, start_time);
    }

    finish(&report)
}

fn finish(report: &ExportReport) -> anyhow::Result<()> {
    let failures: Vec<_> = report.failures().collect();
    for (kind, e) in &failures {
        error!("{} script not written: {}", kind, e);
    }
    if !failures.is_empty() {
        anyhow::bail!("{} script(s) failed", failures.len());
    }
    Ok(())
}

fn print_report(report: &ExportReport, config: &ExportConfig, start_time: Instant) {
    println!(
        "Generated DDL for {} tables [dialect: {}]",
        report.tables.len(),
        report.dialect
    );
    if !report.deferred_constraints.is_empty() {
        println!(
            "  {} foreign key(s) attached after table creation",
            report.deferred_constraints.len()
        );
    }
    for outcome in report.written() {
        println!(
            "  {}: {} ({} statements, {} bytes)",
            outcome.kind,
            outcome.path.display(),
            outcome.statements,
            outcome.bytes
        );
    }
    for (kind, _) in report.failures() {
        let file = match kind {
            ScriptKind::Create => &config.create_file,
            ScriptKind::Drop => &config.drop_file,
        };
        println!("  {}: {} (failed)", kind, file);
    }
    println!("✓ Completed in {:.3?}", start_time.elapsed());
}

fn json_from_report(
    report: &ExportReport,
    config: &ExportConfig,
    start_time: Instant,
) -> GenerateJsonOutput {
    let mut scripts = Vec::new();
    for (kind, file) in requested(config) {
        let outcome = match kind {
            ScriptKind::Create => &report.create,
            ScriptKind::Drop => &report.drop,
        };
        match outcome {
            Some(Ok(done)) => scripts.push(ScriptJson {
                kind: kind.to_string(),
                file: done.path.display().to_string(),
                status: "written".to_string(),
                statements: Some(done.statements),
                bytes: Some(done.bytes),
                sha256: Some(done.sha256.clone()),
                error: None,
            }),
            Some(Err(e)) => scripts.push(ScriptJson::failed(
                kind,
                config.output_dir.join(file).display().to_string(),
                e.to_string(),
            )),
            None => {}
        }
    }

    GenerateJsonOutput {
        dialect: report.dialect.to_string(),
        unit: report.unit.clone(),
        output_dir: config.output_dir.display().to_string(),
        dry_run: false,
        tables: report.tables.clone(),
        deferred_constraints: report.deferred_constraints.clone(),
        scripts,
        elapsed_secs: start_time.elapsed().as_secs_f64(),
    }
}

/// Render the scripts to stdout without touching the file system
fn dry_run(
    prepared: &PreparedSchema,
    config: &ExportConfig,
    unit: Option<String>,
    json: bool,
    start_time: Instant,
) -> anyhow::Result<()> {
    let dialect = config.dialect.dialect();
    let charset = Charset::resolve(&config.encoding)?;
    let mut scripts = Vec::new();
    let mut failed = 0;

    for (kind, file) in requested(config) {
        let path = config.output_dir.join(file).display().to_string();
        match prepared.script(kind, dialect, &config.delimiter) {
            Ok(script) => {
                if !json {
                    println!("-- {} ({} statements)", path, script.statements);
                    println!("{}", script.text);
                }
                let bytes = charset.encode(&script.text);
                scripts.push(ScriptJson {
                    kind: kind.to_string(),
                    file: path,
                    status: "dry-run".to_string(),
                    statements: Some(script.statements),
                    bytes: Some(bytes.len()),
                    sha256: Some(hex::encode(Sha256::digest(&bytes))),
                    error: None,
                });
            }
            Err(e) => {
                error!("{} script not rendered: {}", kind, e);
                failed += 1;
                scripts.push(ScriptJson::failed(kind, path, e.to_string()));
            }
        }
    }

    if json {
        let output = GenerateJsonOutput {
            dialect: dialect.name().to_string(),
            unit,
            output_dir: config.output_dir.display().to_string(),
            dry_run: true,
            tables: prepared.table_order(),
            deferred_constraints: prepared.deferred_constraints(),
            scripts,
            elapsed_secs: start_time.elapsed().as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if failed > 0 {
        anyhow::bail!("{} script(s) failed", failed);
    }
    Ok(())
}
