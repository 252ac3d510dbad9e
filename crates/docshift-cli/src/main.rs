mod commands;
mod migrations;

use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use docshift_config::{AppConfig, ConfigLoader};
use docshift_db::DocumentStore;
use docshift_engine::MigrationEngine;
use docshift_mcp::McpServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docshift",
    version,
    about = "Versioned, reversible migrations for document databases"
)]
struct Cli {
    /// Path to config file (YAML or TOML)
    #[arg(short, long, global = true, env = "DOCSHIFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run pending migrations, optionally up to and including a version
    Up {
        #[arg(long)]
        target: Option<String>,
    },
    /// Roll back migrations applied after the target version
    Down {
        /// Version to roll back to; it stays applied
        #[arg(long)]
        target: String,
    },
    /// Show applied and pending migrations
    Status,
    /// Mark a migration as applied without running it
    Force {
        version: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List registered migrations
    List,
    /// Write a new migration template into the migrations directory
    Create { name: String },
    /// Serve the migration tools over MCP (JSON-RPC on stdio)
    Mcp,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        if let Some(version) = e
            .downcast_ref::<docshift_common::Error>()
            .and_then(|e| e.failed_version())
        {
            eprintln!("Failed at migration {version}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Version = cli.command {
        println!("docshift {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let loader = ConfigLoader::new();
    let config = loader
        .load(cli.config.as_deref())
        .context("failed to load configuration")?;
    init_tracing(&config);

    if let Commands::Create { name } = &cli.command {
        return commands::create(&config.migrations.path, name, &mut std::io::stdout());
    }

    let engine = open_engine(&config, &loader)?;
    let timeout = config.timeout();
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Up { target } => {
            let target = target.as_deref();
            with_timeout(timeout, commands::up(&engine, target, &mut stdout)).await
        }
        Commands::Down { target } => {
            with_timeout(timeout, commands::down(&engine, &target, &mut stdout)).await
        }
        Commands::Status => with_timeout(timeout, commands::status(&engine, &mut stdout)).await,
        Commands::Force { version, yes } => {
            if !yes && !confirm_force(&version)? {
                println!("Operation cancelled.");
                return Ok(());
            }
            with_timeout(timeout, commands::force(&engine, &version, &mut stdout)).await
        }
        Commands::List => commands::list(&engine, &mut stdout),
        Commands::Mcp => {
            let server = McpServer::new(Arc::new(engine), config.migrations.path.clone(), timeout);
            server.serve_stdio().await?;
            Ok(())
        }
        Commands::Create { .. } | Commands::Version => Ok(()),
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // try_init so a second call (tests, embedding) is harmless
    if config.log.json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.with_target(false).try_init();
    }
}

fn open_engine(config: &AppConfig, loader: &ConfigLoader) -> Result<MigrationEngine> {
    let db_path = config.resolved_database_path(loader.config_dir());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let db = DocumentStore::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    info!("using database {}", db_path.display());

    let mut engine = MigrationEngine::new(
        Arc::new(db),
        config.database.migrations_collection.clone(),
    );
    engine.register_many(migrations::builtin());
    Ok(engine)
}

fn confirm_force(version: &str) -> Result<bool> {
    println!("WARNING: this marks migration {version} as applied without running it.");
    if !std::io::stdin().is_terminal() {
        bail!("refusing to force {version} without confirmation; pass --yes");
    }
    Confirm::new()
        .with_prompt("Continue?")
        .default(false)
        .interact()
        .context("confirmation cancelled")
}

async fn with_timeout<F>(timeout: Duration, operation: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(docshift_common::Error::Timeout(format!(
            "operation did not finish within {}s",
            timeout.as_secs()
        ))
        .into()),
    }
}
