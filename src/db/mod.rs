//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all dive log data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::models::{ATTRIBUTE_NAME_MAX, DEFAULT_ATTRIBUTE_TYPES};

/// Initialize the database connection pool, run migrations and seed the attribute catalog.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    seed_attribute_types(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS attribute_type (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE CHECK (length(name) <= {})
        );
        "#,
        ATTRIBUTE_NAME_MAX
    ))
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dive (
            dive_number INTEGER PRIMARY KEY CHECK (dive_number BETWEEN 1 AND 100000),
            dive_date TEXT,
            site_name TEXT,
            location TEXT,
            objective TEXT,
            time_down TEXT,
            max_depth REAL,
            avg_depth REAL,
            dive_time REAL,
            water_temp REAL,
            air_temp REAL,
            weather TEXT,
            sea_conditions TEXT,
            visibility REAL,
            buddy TEXT,
            boat_name TEXT,
            notes TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dive_attribute_link (
            dive_number INTEGER NOT NULL REFERENCES dive(dive_number) ON DELETE CASCADE,
            attribute_type_id INTEGER NOT NULL REFERENCES attribute_type(id),
            UNIQUE (dive_number, attribute_type_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_dive_date ON dive(dive_date);
        CREATE INDEX IF NOT EXISTS idx_dive_attribute_link_type ON dive_attribute_link(attribute_type_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert the default attribute types, only if the catalog is empty.
async fn seed_attribute_types(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attribute_type")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    for (id, name) in DEFAULT_ATTRIBUTE_TYPES.iter().enumerate() {
        sqlx::query("INSERT INTO attribute_type (id, name) VALUES (?, ?)")
            .bind(id as i64)
            .bind(*name)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!(
        "Seeded attribute catalog with {} types",
        DEFAULT_ATTRIBUTE_TYPES.len()
    );
    Ok(())
}
