//! Database connection setup

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Connect to an existing store in read-only mode
///
/// Each pooled connection is acquired per query and handed back when the
/// query completes, so no request holds a connection past its own lifetime.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "database {} does not exist",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    info!("Opened database read-only: {}", db_path.display());
    Ok(pool)
}

/// Open (creating if needed) a writable store and ensure the schema exists
///
/// Idempotent: safe to call against an already provisioned store.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_user_table(&pool).await?;
    create_sample_table(&pool).await?;
    create_micrograph_table(&pool).await?;

    Ok(pool)
}

async fn create_user_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            givenname TEXT,
            familyname TEXT,
            email TEXT,
            orcid TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_sample_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sample (
            id INTEGER PRIMARY KEY,
            label TEXT,
            anneal_time REAL,
            anneal_time_unit TEXT,
            anneal_temperature REAL,
            cool_method TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_micrograph_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS micrograph (
            id INTEGER PRIMARY KEY,
            path TEXT,
            mstructure_class TEXT,
            micron_bar REAL,
            micron_bar_units TEXT,
            micron_bar_px REAL,
            magnification REAL,
            detector TEXT,
            sample_id INTEGER REFERENCES sample(id),
            user_id INTEGER REFERENCES user(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_micrograph_class ON micrograph(mstructure_class)")
        .execute(pool)
        .await?;
    Ok(())
}
