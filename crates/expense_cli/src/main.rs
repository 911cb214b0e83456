//! Expense ledger entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags, environment and `.env`.
//! - Compose repository → service → router once, then serve.
//! - Keep a `ping` command that validates core linkage without a database.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use expense_api::{run_server, ServerConfig};
use expense_core::db::open_db;
use expense_core::{
    core_version, default_log_level, init_logging, ping, ExpenseService, SqliteExpenseRepository,
};
use log::info;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "expense-ledger",
    version,
    about = "Expense ledger HTTP service",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Serve options used when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve(ServeArgs),
    /// Print core ping and version, then exit.
    Ping,
}

#[derive(Debug, Clone, Args)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "EXPENSE_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// SQLite database file; created and migrated on first start.
    #[arg(long, env = "EXPENSE_DATABASE", default_value = "expenses.sqlite3")]
    database: PathBuf,

    /// Browser origin allowed to call the API.
    #[arg(long, env = "EXPENSE_ALLOWED_ORIGIN", default_value = expense_api::server::DEFAULT_ALLOWED_ORIGIN)]
    allowed_origin: String,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long, env = "EXPENSE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files.
    #[arg(long, env = "EXPENSE_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Ping) => {
            println!("ping={}", ping());
            println!("version={}", core_version());
            Ok(())
        }
        Some(Command::Serve(args)) => serve(args).await,
        None => serve(cli.serve).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let log_dir = absolute(&args.log_dir)?;
    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &log_dir.to_string_lossy()).map_err(|err| anyhow!(err))?;

    let conn = open_db(&args.database)
        .with_context(|| format!("failed to open ledger at `{}`", args.database.display()))?;
    info!(
        "event=ledger_ready module=cli status=ok database={}",
        args.database.display()
    );

    let service = Arc::new(ExpenseService::new(SqliteExpenseRepository::new(conn)));
    let config = ServerConfig {
        bind_addr: args.bind,
        allowed_origin: args.allowed_origin,
    };

    run_server(service, config).await?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}
