//! PostgreSQL sink: appends rows into a changelog table via `sqlx::PgPool`.
//!
//! Database errors raised by the statement itself (constraint or type
//! violations) are reported as row-level rejections; connection and pool
//! failures are transport errors.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RowInsertError, WarehouseSink};
use crate::domain::WarehouseRow;
use crate::error::SubmitError;

/// Table name that would need quoting or is not a table reference at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid table name: {0}")]
pub struct InvalidTableName(pub String);

/// PostgreSQL-backed changelog sink.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    pool: PgPool,
    table: String,
}

impl PostgresSink {
    /// Creates a sink writing into `table` (optionally schema-qualified).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTableName`] if `table` is not a plain SQL
    /// identifier.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, InvalidTableName> {
        let table = table.into();
        if !is_plain_table_name(&table) {
            return Err(InvalidTableName(table));
        }
        Ok(Self { pool, table })
    }

    /// Target table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the changelog table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Transport`] on database failure.
    pub async fn ensure_table(&self) -> Result<(), SubmitError> {
        sqlx::query(&create_table_sql(&self.table))
            .execute(&self.pool)
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        Ok(())
    }
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         \"timestamp\" TIMESTAMPTZ NOT NULL, \
         event_id TEXT NOT NULL, \
         document_name TEXT NOT NULL, \
         operation TEXT NOT NULL, \
         data TEXT, \
         old_data TEXT, \
         document_id TEXT NOT NULL)"
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} \
         (\"timestamp\", event_id, document_name, operation, data, old_data, document_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)"
    )
}

/// Accepts `name` or `schema.name` where each part is an unquoted SQL
/// identifier of at most 63 bytes.
fn is_plain_table_name(table: &str) -> bool {
    let parts: Vec<&str> = table.split('.').collect();
    (1..=2).contains(&parts.len()) && parts.iter().all(|part| is_plain_identifier(part))
}

fn is_plain_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    ident.len() <= 63
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl WarehouseSink for PostgresSink {
    async fn insert_row(&self, row: &WarehouseRow) -> Result<Vec<RowInsertError>, SubmitError> {
        let result = sqlx::query(&insert_sql(&self.table))
            .bind(row.timestamp)
            .bind(&row.event_id)
            .bind(&row.document_name)
            .bind(row.operation.as_str())
            .bind(&row.data)
            .bind(&row.old_data)
            .bind(&row.document_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(Vec::new()),
            Err(sqlx::Error::Database(db_err)) => {
                Ok(vec![RowInsertError::new(db_err.message().to_string())])
            }
            Err(e) => Err(SubmitError::Transport(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        format!("postgres:{}", self.table)
    }
}
