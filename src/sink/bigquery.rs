//! BigQuery sink: streaming insert through the `insertAll` API.
//!
//! Each row is sent as its own `insertAll` request with the event id as
//! BigQuery's best-effort `insertId`. Authentication uses a service-account
//! key file when one is configured, otherwise Application Default
//! Credentials.

use std::fmt;

use async_trait::async_trait;
use gcp_bigquery_client::Client;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;

use super::{RowInsertError, WarehouseSink};
use crate::domain::WarehouseRow;
use crate::error::SubmitError;

/// Destination and request options for [`BigQuerySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigQuerySinkConfig {
    /// GCP project that owns the dataset.
    pub project_id: String,
    /// Dataset holding the changelog table.
    pub dataset_id: String,
    /// Changelog table.
    pub table_id: String,
    /// Service-account key file; `None` uses Application Default Credentials.
    pub credentials_file: Option<String>,
    /// Insert the valid rows of a request even if others are invalid.
    pub skip_invalid_rows: bool,
    /// Accept rows carrying fields the table schema does not have.
    pub ignore_unknown_values: bool,
}

impl BigQuerySinkConfig {
    /// Returns `project.dataset.table`.
    #[must_use]
    pub fn table_ref(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// Sink appending rows to a BigQuery table.
pub struct BigQuerySink {
    client: Client,
    config: BigQuerySinkConfig,
}

impl fmt::Debug for BigQuerySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQuerySink")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BigQuerySink {
    /// Authenticates and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Transport`] if credentials cannot be loaded or
    /// the client cannot be constructed.
    pub async fn connect(config: BigQuerySinkConfig) -> Result<Self, SubmitError> {
        let client = match &config.credentials_file {
            Some(path) => Client::from_service_account_key_file(path)
                .await
                .map_err(|e| {
                    SubmitError::Transport(format!(
                        "failed to create BigQuery client from '{path}': {e}"
                    ))
                })?,
            None => Client::from_application_default_credentials()
                .await
                .map_err(|e| {
                    SubmitError::Transport(format!(
                        "failed to create BigQuery client with ADC: {e}"
                    ))
                })?,
        };

        tracing::info!(table = %config.table_ref(), "bigquery sink ready");
        Ok(Self { client, config })
    }

    /// Returns the sink configuration.
    #[must_use]
    pub fn config(&self) -> &BigQuerySinkConfig {
        &self.config
    }
}

/// Builds a single-row `insertAll` request.
fn build_request(
    config: &BigQuerySinkConfig,
    row: &WarehouseRow,
) -> Result<TableDataInsertAllRequest, SubmitError> {
    let mut request = TableDataInsertAllRequest::new();
    request
        .add_row(Some(row.event_id.clone()), row.to_json())
        .map_err(|e| SubmitError::Serialization(e.to_string()))?;

    if config.skip_invalid_rows {
        request.skip_invalid_rows();
    }
    if config.ignore_unknown_values {
        request.ignore_unknown_values();
    }

    Ok(request)
}

#[async_trait]
impl WarehouseSink for BigQuerySink {
    async fn insert_row(&self, row: &WarehouseRow) -> Result<Vec<RowInsertError>, SubmitError> {
        let request = build_request(&self.config, row)?;

        tracing::debug!(
            table = %self.config.table_ref(),
            event_id = %row.event_id,
            "inserting row"
        );

        let response = self
            .client
            .tabledata()
            .insert_all(
                &self.config.project_id,
                &self.config.dataset_id,
                &self.config.table_id,
                request,
            )
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        Ok(response
            .insert_errors
            .unwrap_or_default()
            .iter()
            .map(|insert_error| RowInsertError::new(format!("{insert_error:?}")))
            .collect())
    }

    fn describe(&self) -> String {
        format!("bigquery:{}", self.config.table_ref())
    }
}
