use clap::{Parser, Subcommand};

const DEFAULT_DB_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/conflicts.duckdb");

#[derive(Parser, Debug)]
#[command(name = "conflict-dashboard")]
#[command(about = "Conflict analytics dashboard (DuckDB + axum)", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the dashboard page and chart API (requires a provisioned database).
    Serve(ServeArgs),
    /// Check that the analytical store is reachable, then exit.
    Check(CheckArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// DuckDB database holding the conflicts table.
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8787)]
    pub port: u16,

    /// Upper bound for a single analytical query, in seconds.
    #[arg(long, default_value_t = 30)]
    pub query_timeout_secs: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// DuckDB database holding the conflicts table.
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db_path: String,

    #[arg(long, default_value_t = 30)]
    pub query_timeout_secs: u64,
}
