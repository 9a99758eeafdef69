//! `pmtrack-service` entry point.
//!
//! ## Modes
//!
//! - **`serve`** (default): load config, open and migrate the database,
//!   serve HTTP until Ctrl+C.
//! - **`migrate`**: bring the database schema up to date and exit.
//! - **`check-config`**: print the effective configuration as TOML.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pmtrack_core::config::ServiceConfig;
use pmtrack_core::db::{self, DbPool};
use pmtrack_service::AppState;
use tokio::net::TcpListener;

/// Program and work-item tracking API.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $PMTRACK_CONFIG, then ~/.config/pmtrack/service.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the listen address.
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Override the database path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,

    /// Apply schema migrations and print the resulting version.
    Migrate,

    /// Validate the configuration and print it.
    CheckConfig,
}

impl Cli {
    fn load_config(&self) -> Result<ServiceConfig> {
        let mut cfg = ServiceConfig::load(self.config.as_deref()).context("loading config")?;
        if let Some(bind) = &self.bind {
            cfg.bind.clone_from(bind);
        }
        if let Some(db_path) = &self.db {
            cfg.db_path.clone_from(db_path);
        }
        cfg.validate().context("validating config")?;
        Ok(cfg)
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

fn open_database(cfg: &ServiceConfig) -> Result<DbPool> {
    let pool = db::initialize_pool(&cfg.db_path, cfg.pool_size)
        .with_context(|| format!("opening database at {}", cfg.db_path.display()))?;
    let mut conn = pool.get().context("acquiring connection for migrations")?;
    db::migrate_to_latest(&mut conn).context("migrating database")?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    match cli.cmd.unwrap_or(Command::Serve) {
        Command::CheckConfig => {
            print!("{}", cfg.to_toml().context("rendering config")?);
            Ok(())
        }
        Command::Migrate => {
            init_tracing(&cfg.log_filter);
            let pool = open_database(&cfg)?;
            let conn = pool.get().context("acquiring connection")?;
            println!("schema version {}", db::schema_version(&conn)?);
            Ok(())
        }
        Command::Serve => {
            init_tracing(&cfg.log_filter);
            run_service(cfg).await
        }
    }
}

async fn run_service(cfg: ServiceConfig) -> Result<()> {
    tracing::info!("pmtrack-service v{} starting", env!("CARGO_PKG_VERSION"));

    let pool = open_database(&cfg)?;
    tracing::info!(path = %cfg.db_path.display(), "database ready");

    let addr = cfg.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    // Shutdown coordination via watch channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Signal received, shutting down");
        let _ = shutdown_tx.send(true);
    });

    pmtrack_service::serve(listener, AppState::new(pool, cfg), shutdown_rx).await?;

    tracing::info!("pmtrack-service exiting cleanly");
    Ok(())
}
