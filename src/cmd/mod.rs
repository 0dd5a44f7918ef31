pub(crate) mod generate;
mod glob_util;
mod schema;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate as generate_completions, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ddl-export")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Generate CREATE and DROP DDL scripts from ORM entity metadata", long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate create and drop scripts from entity documents
    Generate(GenerateArgs),

    /// Print JSON schemas for entity documents, config files and --json output
    Schema {
        /// Schema to print (entities, config, generate); all when omitted
        name: Option<String>,

        /// Write <name>.schema.json files into this directory instead of stdout
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Entity documents (YAML or JSON) or glob patterns (e.g., model/*.yaml)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output directory for the scripts [default: target/generated-resources/ddl]
    #[arg(short, long, env = "DDL_EXPORT_OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// SQL dialect: ansi, mysql, postgres [default: ansi]
    #[arg(short, long, env = "DDL_EXPORT_DIALECT")]
    pub dialect: Option<String>,

    /// End-of-statement delimiter [default: ;]
    #[arg(long, env = "DDL_EXPORT_DELIMITER")]
    pub delimiter: Option<String>,

    /// Create script file name [default: create.sql]
    #[arg(long, env = "DDL_EXPORT_CREATE_FILE")]
    pub create_file: Option<String>,

    /// Drop script file name [default: drop.sql]
    #[arg(long, env = "DDL_EXPORT_DROP_FILE")]
    pub drop_file: Option<String>,

    /// Skip the create script
    #[arg(long, env = "DDL_EXPORT_NO_CREATE")]
    pub no_create: bool,

    /// Skip the drop script
    #[arg(long, env = "DDL_EXPORT_NO_DROP")]
    pub no_drop: bool,

    /// Output encoding: UTF-8, US-ASCII, ISO-8859-1, UTF-16BE, UTF-16LE, UTF-16 [default: UTF-8]
    #[arg(long, env = "DDL_EXPORT_ENCODING")]
    pub encoding: Option<String>,

    /// Persistence unit to process (required when a document declares several)
    #[arg(short, long, env = "DDL_EXPORT_UNIT")]
    pub unit: Option<String>,

    /// Entity document format: yaml, json (detected from the extension if not specified)
    #[arg(long)]
    pub format: Option<String>,

    /// Foreign key placement: inline (only cycles deferred) or deferred (all as ALTER TABLE)
    #[arg(long, env = "DDL_EXPORT_CONSTRAINTS")]
    pub constraints: Option<String>,

    /// YAML config file with default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the scripts instead of writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Output a JSON summary instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => generate::run(args),
        Commands::Schema { name, output_dir } => schema::run(name, output_dir),
        Commands::Completions { shell } => {
            generate_completions(shell, &mut Cli::command(), "ddl-export", &mut io::stdout());
            Ok(())
        }
    }
}
