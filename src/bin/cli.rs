use std::collections::HashSet;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use listings::config::{AuthConfig, BootstrapConfig};
use listings::db::MIGRATOR;
use listings::models::rbac::{ModelName, RightSpec};
use listings::seed::{seed, SeedOutcome};
use listings::store::{catalog, users};
use listings::token::TokenService;

#[derive(Parser, Debug)]
#[command(author, version, about = "listings maintenance tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Create the default roles, rights and accounts if missing
    Seed,
    /// Issue a fresh token for an existing user
    IssueToken { name: String },
    /// Attach a right to a role, creating the right if needed
    GrantRight {
        role: String,
        #[arg(value_parser = parse_model)]
        model: ModelName,
        #[arg(long)]
        read: bool,
        #[arg(long)]
        write: bool,
        #[arg(long)]
        only_own: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();
    let pool = get_pool().await?;

    match cli.command {
        Commands::MigrateRun => {
            MIGRATOR.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            print_status(&pool).await?;
        }
        Commands::Seed => {
            let auth = AuthConfig::from_env()?;
            let mut conn = pool.acquire().await?;
            match seed(&mut conn, &auth, &BootstrapConfig::from_env()).await? {
                SeedOutcome::Seeded => println!("Defaults seeded"),
                SeedOutcome::AlreadySeeded => println!("Defaults already present"),
            }
        }
        Commands::IssueToken { name } => {
            let auth = AuthConfig::from_env()?;
            let mut conn = pool.acquire().await?;
            let user = users::find_by_name(&mut conn, &name)
                .await?
                .with_context(|| format!("no user named {}", name))?;
            let token = TokenService::from_config(&auth).issue(&mut conn, user.id).await?;
            println!("{}", token.token);
        }
        Commands::GrantRight { role, model, read, write, only_own } => {
            let mut conn = pool.acquire().await?;
            let role = catalog::find_role_by_name(&mut conn, &role)
                .await?
                .with_context(|| format!("no role named {}", role))?;
            let spec = RightSpec { read, write, only_own, model };
            let right = catalog::ensure_right(&mut conn, spec).await?;
            catalog::grant_right(&mut conn, role.id, right.id).await?;
            println!("Granted right {} to role {}", right.id, role.name);
        }
    }

    Ok(())
}

fn parse_model(raw: &str) -> Result<ModelName, String> {
    raw.parse::<ModelName>().map_err(|err| err.to_string())
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let options = SqliteConnectOptions::from_str(&database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool) -> anyhow::Result<()> {
    let has_table = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if has_table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in MIGRATOR.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}
