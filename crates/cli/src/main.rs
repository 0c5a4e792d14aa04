use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecovision_core::{import_csv, seed_demo, template_for, ImportKind, Store, DEFAULT_COMBINATION};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "ecovision", version = VERSION, about = "EcoVision dataset administration")]
struct Cli {
    #[arg(long, global = true, default_value = "ecovision.sqlite")]
    db: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the schema if it does not exist yet
    Init,
    /// Replace the catalog and results with demo data
    Seed {
        #[arg(long = "rng-seed", default_value_t = 42)]
        rng_seed: u64,
    },
    /// Replace results or variables from a CSV file
    Import { kind: ImportKind, input: PathBuf },
    Template {
        kind: ImportKind,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Administrator")]
        name: String,
    },
    Counts,
    /// Print the stored rows for one combination key as JSON
    Results {
        #[arg(long, default_value = DEFAULT_COMBINATION)]
        combination: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let store = open_store(&cli.db)?;
    match cli.command {
        Commands::Init => {
            writeln!(out, "initialized {}", store.path().display())?;
        }
        Commands::Seed { rng_seed } => {
            let summary = seed_demo(&store, rng_seed)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        Commands::Import { kind, input } => {
            let bytes =
                fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
            let summary = import_csv(&store, kind, &bytes)?;
            writeln!(out, "{}", summary.message())?;
        }
        Commands::Template { kind, out: target } => {
            let template = template_for(kind);
            match target {
                Some(path) => {
                    fs::write(&path, template.content)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(kind = kind.as_str(), path = %path.display(), "template written");
                }
                None => write!(out, "{}", template.content)?,
            }
        }
        Commands::CreateAdmin {
            email,
            password,
            name,
        } => {
            let user = store.create_admin(&email, &password, &name)?;
            writeln!(
                out,
                "{}",
                json!({ "id": user.id, "email": user.email, "name": user.name })
            )?;
        }
        Commands::Counts => {
            let counts = store.data_counts()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&counts)?)?;
        }
        Commands::Results { combination } => {
            let rows = store.results_for(&combination)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        }
    }
    Ok(())
}

fn open_store(path: &Path) -> Result<Store> {
    Store::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
