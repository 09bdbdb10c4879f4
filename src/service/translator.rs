//! Change event translator: notification in, one warehouse row out.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    ChangeNotification, Document, DocumentPathTemplate, NULL_PAYLOAD, Operation, WarehouseRow,
    sanitize_document,
};
use crate::error::SubmitError;
use crate::sink::WarehouseSink;

/// Result of handling one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    /// Event id written to the row.
    pub event_id: String,
    /// Document the change applied to.
    pub document_id: String,
    /// Classified operation.
    pub operation: Operation,
    /// Whether the warehouse accepted the row.
    pub delivered: bool,
}

/// Turns change notifications into warehouse rows and submits them.
///
/// Stateless apart from the path template and the shared sink handle;
/// every call to [`handle`](Self::handle) is independent.
#[derive(Debug, Clone)]
pub struct ChangeEventTranslator {
    sink: Arc<dyn WarehouseSink>,
    template: DocumentPathTemplate,
}

impl ChangeEventTranslator {
    /// Creates a translator writing through `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn WarehouseSink>, template: DocumentPathTemplate) -> Self {
        Self { sink, template }
    }

    /// Returns the shared sink handle.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn WarehouseSink> {
        &self.sink
    }

    /// Returns the document path template.
    #[must_use]
    pub fn template(&self) -> &DocumentPathTemplate {
        &self.template
    }

    /// Assembles the row for `notification`, stamped with the current time.
    ///
    /// A missing or empty event id is replaced with a fresh UUID v4.
    #[must_use]
    pub fn build_row(&self, notification: &ChangeNotification) -> WarehouseRow {
        let event_id = notification
            .event_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToString::to_string);

        WarehouseRow {
            timestamp: Utc::now(),
            event_id,
            document_name: self.template.document_name(&notification.document_id),
            operation: notification.operation(),
            data: payload_text(notification.after.as_ref()),
            old_data: payload_text(notification.before.as_ref()),
            document_id: notification.document_id.clone(),
        }
    }

    /// Appends `row` to the warehouse. No retry.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::SinkRejection`] when the sink reports row
    /// errors, or the sink's own error when the call fails.
    pub async fn submit(&self, row: &WarehouseRow) -> Result<(), SubmitError> {
        let errors = self.sink.insert_row(row).await?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SubmitError::SinkRejection { errors })
        }
    }

    /// Builds and submits the row for one notification.
    ///
    /// Submission failures are logged with the document id and the row,
    /// then swallowed: the notification counts as handled either way.
    /// The returned [`ChangeOutcome`] records whether the row landed.
    pub async fn handle(&self, notification: ChangeNotification) -> ChangeOutcome {
        let row = self.build_row(&notification);
        tracing::info!(
            document_id = %row.document_id,
            event_id = %row.event_id,
            row = %row.to_json(),
            "prepared warehouse row"
        );

        let delivered = match self.submit(&row).await {
            Ok(()) => {
                tracing::info!(
                    document_id = %row.document_id,
                    event_id = %row.event_id,
                    operation = %row.operation,
                    sink = %self.sink.describe(),
                    "row inserted"
                );
                true
            }
            Err(error) => {
                tracing::error!(
                    document_id = %row.document_id,
                    event_id = %row.event_id,
                    operation = %row.operation,
                    sink = %self.sink.describe(),
                    row = %row.to_json(),
                    %error,
                    "failed to insert row"
                );
                false
            }
        };

        ChangeOutcome {
            event_id: row.event_id,
            document_id: row.document_id,
            operation: row.operation,
            delivered,
        }
    }
}

/// JSON text of a sanitized snapshot, or the literal `null`.
fn payload_text(document: Option<&Document>) -> String {
    document.map_or_else(
        || NULL_PAYLOAD.to_string(),
        |doc| sanitize_document(doc).to_string(),
    )
}
