//! CLI for running schema migrations out of band
//!
//! The server applies migrations at startup; this binary exists for ops
//! workflows that migrate before rolling instances. It outputs JSON for
//! parsing by deploy scripts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use server_core::Config;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Schema migration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply all pending migrations
    Run,

    /// List applied migrations
    Info,
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<Vec<MigrationInfo>>,
}

#[derive(Serialize)]
struct MigrationInfo {
    version: i64,
    description: String,
}

fn print_response(response: &Response) {
    println!(
        "{}",
        serde_json::to_string_pretty(response).expect("response serializes")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Run => {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            print_response(&Response {
                success: true,
                message: Some("migrations applied".to_string()),
                migrations: None,
            });
        }
        Commands::Info => {
            let rows: Vec<(i64, String)> = sqlx::query_as(
                "SELECT version, description FROM _sqlx_migrations ORDER BY version",
            )
            .fetch_all(&pool)
            .await
            .context("Failed to read migration history")?;

            let migrations = rows
                .into_iter()
                .map(|(version, description)| MigrationInfo {
                    version,
                    description,
                })
                .collect();

            print_response(&Response {
                success: true,
                message: None,
                migrations: Some(migrations),
            });
        }
    }

    Ok(())
}
