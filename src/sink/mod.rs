//! Warehouse sinks: where changelog rows are appended.
//!
//! [`WarehouseSink`] is the seam between the translator and the warehouse
//! client. A sink is built once at startup and shared by every invocation
//! as `Arc<dyn WarehouseSink>`.

pub mod bigquery;
pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::WarehouseRow;
use crate::error::SubmitError;

pub use bigquery::{BigQuerySink, BigQuerySinkConfig};
pub use memory::MemorySink;
pub use postgres::{InvalidTableName, PostgresSink};

/// A row-level error reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowInsertError {
    /// Error text as reported by the warehouse.
    pub message: String,
}

impl RowInsertError {
    /// Creates a row error from its message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RowInsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Append-only destination for [`WarehouseRow`]s.
#[async_trait]
pub trait WarehouseSink: Send + Sync + fmt::Debug {
    /// Appends one row.
    ///
    /// Returns the row-level errors the warehouse reported; an empty list
    /// means the row was accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Transport`] when the call itself fails and
    /// [`SubmitError::Serialization`] when the row cannot be encoded.
    async fn insert_row(&self, row: &WarehouseRow) -> Result<Vec<RowInsertError>, SubmitError>;

    /// Human-readable destination, e.g. `bigquery:project.dataset.table`.
    fn describe(&self) -> String;
}
