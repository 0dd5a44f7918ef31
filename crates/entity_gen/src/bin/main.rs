//! CLI for generating entity documents.
//!
//! Usage:
//!   gen-entities --scale medium --seed 42 > tests/fixtures/generated/medium.yaml
//!   gen-entities --scale large --cycles 0.05 -o large.yaml

use clap::Parser;
use entity_gen::{Generator, Scale};
use std::fs;

#[derive(Parser, Debug)]
#[command(name = "gen-entities")]
#[command(about = "Generate entity documents for ddl-export", long_about = None)]
struct Args {
    /// Scale preset: small, medium, large
    #[arg(short, long, default_value = "small")]
    scale: String,

    /// Random seed for reproducibility
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Probability of a foreign key pointing forward (creates cycles)
    #[arg(long, default_value = "0")]
    cycles: f64,

    /// Probability of a many-to-many field per entity
    #[arg(long, default_value = "0.1")]
    many_to_many: f64,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let scale: Scale = args.scale.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let doc = Generator::new(args.seed, scale)
        .with_cycles(args.cycles)
        .with_many_to_many(args.many_to_many)
        .generate();
    let yaml = doc.to_yaml()?;

    if let Some(ref path) = args.output {
        fs::write(path, yaml)?;
        eprintln!(
            "Generated {} entities ({} tables) to {}",
            doc.entities.len(),
            doc.table_count(),
            path
        );
    } else {
        print!("{}", yaml);
    }

    Ok(())
}
