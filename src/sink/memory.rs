//! In-memory sink.
//!
//! Keeps every accepted row in a vector for the test suites, and can be
//! primed to reject rows or to fail the call outright. The `memory` backend
//! uses [`MemorySink::dry_run`], which logs each row and keeps nothing.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RowInsertError, WarehouseSink};
use crate::domain::WarehouseRow;
use crate::error::SubmitError;

#[derive(Debug, Clone)]
enum Mode {
    Accept,
    Discard,
    Reject(Vec<String>),
    Unreachable(String),
}

/// Sink that records rows in memory.
#[derive(Debug)]
pub struct MemorySink {
    rows: Mutex<Vec<WarehouseRow>>,
    mode: Mode,
}

impl MemorySink {
    /// Creates a sink that accepts every row.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(Mode::Accept)
    }

    /// Creates a sink that accepts every row, logs it and drops it.
    #[must_use]
    pub fn dry_run() -> Self {
        Self::with_mode(Mode::Discard)
    }

    /// Creates a sink that reports the given row-level errors for every row.
    #[must_use]
    pub fn rejecting<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(Mode::Reject(messages.into_iter().map(Into::into).collect()))
    }

    /// Creates a sink whose every call fails with a transport error.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::with_mode(Mode::Unreachable(reason.into()))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            mode,
        }
    }

    /// Returns a copy of every accepted row, in arrival order.
    pub async fn rows(&self) -> Vec<WarehouseRow> {
        self.rows.lock().await.clone()
    }

    /// Returns the number of accepted rows.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Returns `true` if no row has been accepted.
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WarehouseSink for MemorySink {
    async fn insert_row(&self, row: &WarehouseRow) -> Result<Vec<RowInsertError>, SubmitError> {
        match &self.mode {
            Mode::Accept => {
                self.rows.lock().await.push(row.clone());
                Ok(Vec::new())
            }
            Mode::Discard => {
                tracing::info!(
                    document_id = %row.document_id,
                    event_id = %row.event_id,
                    row = %row.to_json(),
                    "dry run: row discarded"
                );
                Ok(Vec::new())
            }
            Mode::Reject(messages) => Ok(messages.iter().map(RowInsertError::new).collect()),
            Mode::Unreachable(reason) => Err(SubmitError::Transport(reason.clone())),
        }
    }

    fn describe(&self) -> String {
        match self.mode {
            Mode::Discard => "memory:dry-run".to_string(),
            _ => "memory".to_string(),
        }
    }
}
