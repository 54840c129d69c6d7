//! The durable storage medium: a single SQLite file holding one row per key.

use crate::store::Medium;
use crate::{utils, Result};
use anyhow::{bail, Context};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use std::path::Path;
use tracing::debug;

/// Schema upgrades in order. Entry `n` brings the schema from version `n` to version `n + 1`.
const UPGRADES: &[&str] = &[include_str!("sql/01_records.sql")];

/// The schema version this build of the program expects.
const CURRENT_VERSION: i32 = UPGRADES.len() as i32;

/// A `Medium` backed by a SQLite database through `sqlx`.
#[derive(Debug, Clone)]
pub struct SqliteMedium {
    pool: SqlitePool,
}

impl SqliteMedium {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the schema
    pub async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;
        bootstrap(&pool).await?;
        upgrade(&pool, 0).await?;
        debug!("Created database at {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Brings the schema up to date if it is behind
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let version = schema_version(&pool).await?;
        if version > CURRENT_VERSION {
            bail!(
                "The database schema is version {version} but this program only understands up \
                to version {CURRENT_VERSION}. Is a newer version of finplan available?"
            );
        }
        upgrade(&pool, version).await?;
        Ok(Self { pool })
    }

    /// Every key that has been written, in sorted order.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM records ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list stored keys")?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}

#[async_trait]
impl Medium for SqliteMedium {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM records WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read '{key}'"))?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO records (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(utils::iso_now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write '{key}'"))?;
        Ok(())
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at '{}'", path.display()))
}

/// Creates the `schema_version` table at version 0.
async fn bootstrap(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
        .execute(pool)
        .await
        .context("Failed to create schema_version table")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
        .execute(pool)
        .await
        .context("Failed to insert initial schema version")?;
    Ok(())
}

async fn schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to query schema version")?;
    Ok(row.0)
}

/// Applies the upgrades after `from`. Each one runs in a transaction together with the
/// `schema_version` bump, so an interrupted upgrade leaves the previous version in place.
async fn upgrade(pool: &SqlitePool, from: i32) -> Result<()> {
    let start = usize::try_from(from).unwrap_or_default();
    for (index, sql) in UPGRADES.iter().enumerate().skip(start) {
        let version = index as i32 + 1;
        debug!("Upgrading the database schema to version {version}");
        let mut tx = pool.begin().await.context("Failed to begin schema upgrade")?;
        tx.execute(*sql)
            .await
            .with_context(|| format!("Failed to upgrade the schema to version {version}"))?;
        sqlx::query("UPDATE schema_version SET version = ?")
            .bind(version)
            .execute(&mut *tx)
            .await
            .context("Failed to update schema_version")?;
        tx.commit().await.context("Failed to commit schema upgrade")?;
    }
    Ok(())
}
