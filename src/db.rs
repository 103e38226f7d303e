use std::path::{Path, PathBuf};

use anyhow::Context;
use sqlx::{
    migrate::{Migrate, Migration, Migrator},
    postgres::PgPoolOptions,
    PgPool,
};
use time::{macros::format_description, OffsetDateTime};
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    MIGRATOR.run(db).await.context("apply migrations")?;
    info!("migrations applied");
    Ok(())
}

async fn applied_versions(db: &PgPool) -> anyhow::Result<Vec<i64>> {
    let mut conn = db.acquire().await.context("acquire connection")?;
    conn.ensure_migrations_table()
        .await
        .context("ensure migrations table")?;
    let mut versions: Vec<i64> = conn
        .list_applied_migrations()
        .await
        .context("list applied migrations")?
        .into_iter()
        .map(|m| m.version)
        .collect();
    versions.sort_unstable();
    Ok(versions)
}

/// Version to revert to so that the newest `steps` applied migrations are undone.
pub fn rollback_target(applied: &[i64], steps: usize) -> i64 {
    if steps >= applied.len() {
        0
    } else {
        applied[applied.len() - steps - 1]
    }
}

pub async fn rollback(db: &PgPool, steps: usize) -> anyhow::Result<()> {
    let applied = applied_versions(db).await?;
    if applied.is_empty() {
        info!("no applied migrations to roll back");
        return Ok(());
    }
    let target = rollback_target(&applied, steps);
    MIGRATOR
        .undo(db, target)
        .await
        .context("revert migrations")?;
    info!(steps, target, "migrations rolled back");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

pub fn migration_report<'a, I>(migrations: I, applied: &[i64]) -> Vec<MigrationStatus>
where
    I: IntoIterator<Item = &'a Migration>,
{
    migrations
        .into_iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect()
}

pub async fn status(db: &PgPool) -> anyhow::Result<Vec<MigrationStatus>> {
    let applied = applied_versions(db).await?;
    Ok(migration_report(MIGRATOR.iter(), &applied))
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Writes an empty reversible migration pair into `dir`.
pub fn create_migration(
    dir: &Path,
    name: &str,
    now: OffsetDateTime,
) -> anyhow::Result<(PathBuf, PathBuf)> {
    let slug = slug(name);
    anyhow::ensure!(!slug.is_empty(), "migration name must contain letters or digits");

    let stamp = now
        .format(format_description!(
            "[year][month][day][hour][minute][second]"
        ))
        .context("format migration timestamp")?;
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let up = dir.join(format!("{stamp}_{slug}.up.sql"));
    let down = dir.join(format!("{stamp}_{slug}.down.sql"));
    std::fs::write(&up, format!("-- {name}\n"))
        .with_context(|| format!("write {}", up.display()))?;
    std::fs::write(&down, format!("-- revert {name}\n"))
        .with_context(|| format!("write {}", down.display()))?;
    info!(up = %up.display(), down = %down.display(), "migration created");
    Ok((up, down))
}

pub async fn ping(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query("SELECT 1")
        .execute(db)
        .await
        .context("database ping")?;
    Ok(())
}
