//! Change notifications and operation classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::field_value::Document;

/// Kind of write a change notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Document did not exist before the write.
    Create,
    /// Document existed before and after the write.
    Update,
    /// Document no longer exists after the write.
    Delete,
}

impl Operation {
    /// Returns the warehouse string for this operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a write from the presence of its before and after states.
///
/// A missing after-state wins: both absent is a `DELETE`.
#[must_use]
pub fn classify_operation(before: Option<&Document>, after: Option<&Document>) -> Operation {
    match (before, after) {
        (_, None) => Operation::Delete,
        (None, Some(_)) => Operation::Create,
        (Some(_), Some(_)) => Operation::Update,
    }
}

/// A single document write delivered by the trigger layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    /// Identifier of the document inside the watched collection.
    pub document_id: String,
    /// Snapshot before the write; absent on create.
    pub before: Option<Document>,
    /// Snapshot after the write; absent on delete.
    pub after: Option<Document>,
    /// Delivery-unique event identifier, when the trigger layer supplies one.
    pub event_id: Option<String>,
}

impl ChangeNotification {
    /// Creates a notification with no event identifier.
    #[must_use]
    pub fn new(
        document_id: impl Into<String>,
        before: Option<Document>,
        after: Option<Document>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            before,
            after,
            event_id: None,
        }
    }

    /// Sets the event identifier.
    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Classifies this notification. See [`classify_operation`].
    #[must_use]
    pub fn operation(&self) -> Operation {
        classify_operation(self.before.as_ref(), self.after.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn doc(key: &str, value: i64) -> Document {
        let mut d = Document::new();
        d.insert(key.to_string(), FieldValue::Integer(value));
        d
    }

    #[test]
    fn missing_after_is_delete() {
        assert_eq!(
            classify_operation(Some(&doc("x", 1)), None),
            Operation::Delete
        );
    }

    #[test]
    fn missing_both_is_delete() {
        assert_eq!(classify_operation(None, None), Operation::Delete);
    }

    #[test]
    fn missing_before_is_create() {
        assert_eq!(
            classify_operation(None, Some(&doc("x", 1))),
            Operation::Create
        );
    }

    #[test]
    fn both_present_is_update() {
        assert_eq!(
            classify_operation(Some(&doc("x", 1)), Some(&doc("x", 2))),
            Operation::Update
        );
    }

    #[test]
    fn empty_documents_still_count_as_present() {
        let empty = Document::new();
        assert_eq!(
            classify_operation(Some(&empty), Some(&empty)),
            Operation::Update
        );
    }

    #[test]
    fn operation_serializes_upper_case() {
        let json = serde_json::to_string(&Operation::Create).unwrap_or_default();
        assert_eq!(json, "\"CREATE\"");
        assert_eq!(Operation::Delete.to_string(), "DELETE");
    }

    #[test]
    fn notification_operation_uses_snapshots() {
        let n = ChangeNotification::new("abc", None, Some(doc("x", 1))).with_event_id("evt-1");
        assert_eq!(n.operation(), Operation::Create);
        assert_eq!(n.event_id.as_deref(), Some("evt-1"));
    }
}
