use crate::json_schema::{all_schemas, get_schema, schema_names};
use anyhow::Context;
use log::info;
use std::fs;
use std::path::PathBuf;

pub fn run(name: Option<String>, output_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let schemas = match name {
        Some(name) => {
            let schema = get_schema(&name).with_context(|| {
                format!(
                    "Unknown schema: {}. Valid options: {}",
                    name,
                    schema_names().join(", ")
                )
            })?;
            vec![(name, schema)]
        }
        None => all_schemas()
            .into_iter()
            .map(|(name, schema)| (name.to_string(), schema))
            .collect(),
    };

    match output_dir {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            for (name, schema) in &schemas {
                let path = dir.join(format!("{}.schema.json", name));
                let mut json = serde_json::to_string_pretty(schema)?;
                json.push('\n');
                fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("wrote: {}", path.display());
            }
        }
        None if schemas.len() == 1 => {
            println!("{}", serde_json::to_string_pretty(&schemas[0].1)?);
        }
        None => {
            let map: serde_json::Map<String, serde_json::Value> = schemas
                .into_iter()
                .map(|(name, schema)| Ok((name, serde_json::to_value(schema)?)))
                .collect::<serde_json::Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
    }

    Ok(())
}
