//! Command line entry points: the HTTP server plus database and seeding chores.

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    app,
    config::{database_url_from_env, AppConfig},
    db,
    state::AppState,
    users::{
        services::{seed_admin, SeedOutcome},
        PgUserStore,
    },
};

/// userdesk - user registration, sessions and admin user management
#[derive(Debug, Parser)]
#[command(name = "userdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Manage database migrations
    Db {
        #[command(subcommand)]
        action: DbCommand,
    },

    /// Check connectivity of an external dependency
    HealthCheck {
        #[command(subcommand)]
        target: HealthTarget,
    },

    /// Insert initial records
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Apply pending migrations
    Migrate,
    /// Revert the newest applied migrations
    Rollback {
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// List migrations and whether they are applied
    Status,
    /// Create an empty up/down migration pair
    CreateMigration {
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum HealthTarget {
    Db,
}

#[derive(Debug, Subcommand)]
pub enum SeedTarget {
    /// Create the admin account from ADMIN_EMAIL / ADMIN_PASSWORD
    Admin,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Db { action } => run_db(action).await,
        Command::HealthCheck {
            target: HealthTarget::Db,
        } => {
            db::ping(&pool_from_env().await?).await?;
            println!("Database connection is healthy.");
            Ok(())
        }
        Command::Seed {
            target: SeedTarget::Admin,
        } => run_seed_admin().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let pool = db::connect(&config.database_url).await?;

    if let Err(e) = db::migrate(&pool).await {
        warn!(error = %e, "migration failed; continuing");
    }

    let state = AppState::init(config, pool);
    app::serve(app::build_app(state)).await
}

async fn pool_from_env() -> anyhow::Result<PgPool> {
    db::connect(&database_url_from_env()?).await
}

async fn run_db(action: DbCommand) -> anyhow::Result<()> {
    match action {
        DbCommand::Migrate => db::migrate(&pool_from_env().await?).await,
        DbCommand::Rollback { steps } => db::rollback(&pool_from_env().await?, steps).await,
        DbCommand::Status => {
            for m in db::status(&pool_from_env().await?).await? {
                let mark = if m.applied { "applied" } else { "pending" };
                println!("{:>14}  {:<8}  {}", m.version, mark, m.description);
            }
            Ok(())
        }
        DbCommand::CreateMigration { name } => {
            db::create_migration(Path::new("migrations"), &name, OffsetDateTime::now_utc())?;
            Ok(())
        }
    }
}

async fn run_seed_admin() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let admin = config
        .admin
        .as_ref()
        .context("ADMIN_EMAIL and ADMIN_PASSWORD must be set to seed an admin")?;
    let pool = db::connect(&config.database_url).await?;
    let store = PgUserStore::new(pool);

    match seed_admin(&store, &admin.email, &admin.password).await? {
        SeedOutcome::Created(user) => {
            info!(user_id = %user.id, "admin seeded");
            println!("Admin user created: {}", user.email);
        }
        SeedOutcome::AlreadyExists => println!("Admin user already exists."),
    }
    Ok(())
}
