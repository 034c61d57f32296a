//! SQLite store for the flattened Sportradar rows.
//!
//! Writes are insert-or-replace by primary key: a batch runs inside a
//! single transaction and either commits whole or rolls back whole.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::query::Query;
use sqlx::{Sqlite, SqlitePool};
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::normalize::FlatRow;

pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::from_str(&config.url())
            .context("Invalid database path")?
            .create_if_missing(true)
            .foreign_keys(false)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the underlying connection pool (the dashboard
    /// reads through this).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        // Execute each statement separately (sqlx doesn't support multiple statements in one call)
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Failed to execute migration: {trimmed}"))?;
            }
        }
        Ok(())
    }

    /// Insert-or-replace a batch of rows. The column set comes from the
    /// first row; all rows in a batch share one shape. Any failure rolls
    /// the whole batch back and is returned as a value, so earlier
    /// committed batches are untouched and the caller can carry on.
    pub async fn upsert(
        &self,
        table: &str,
        rows: &[FlatRow],
        primary_key: &str,
    ) -> Result<u64, StoreError> {
        if rows.is_empty() {
            info!(table, "No rows to upsert");
            return Ok(0);
        }

        match self.upsert_batch(table, rows).await {
            Ok(count) => {
                info!(table, rows = count, primary_key, "Upserted batch");
                Ok(count)
            }
            Err(source) => {
                error!(table, error = %source, "Upsert failed, batch rolled back");
                Err(StoreError::Upsert {
                    table: table.to_string(),
                    source,
                })
            }
        }
    }

    async fn upsert_batch(&self, table: &str, rows: &[FlatRow]) -> Result<u64, sqlx::Error> {
        let columns = rows[0]
            .iter()
            .map(|(column, _)| format!("\"{column}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; rows[0].len()].join(", ");
        let sql =
            format!("INSERT OR REPLACE INTO \"{table}\" ({columns}) VALUES ({placeholders})");

        let mut tx = self.pool.begin().await?;
        for row in rows {
            let mut query = sqlx::query(&sql);
            for (_, value) in row {
                query = bind_value(query, value);
            }
            if let Err(e) = query.execute(&mut *tx).await {
                tx.rollback().await.ok();
                return Err(e);
            }
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }
}

/// SQLite has no JSON column type here; scalars map to their natural
/// affinity and anything structured is stored as its JSON text.
fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}
