//! The append-only warehouse row.
//!
//! [`WarehouseRow`] serializes to exactly the seven columns of the
//! changelog table. `data` and `old_data` hold JSON *text*; an absent
//! snapshot is the literal string `null`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use super::change::Operation;

/// Literal stored in `data`/`old_data` when the snapshot is absent.
pub const NULL_PAYLOAD: &str = "null";

/// One changelog record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseRow {
    /// Processing time at which the row was built.
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Trigger-supplied or generated event identifier; never empty.
    pub event_id: String,
    /// Fully-qualified document path.
    pub document_name: String,
    /// Kind of write.
    pub operation: Operation,
    /// JSON text of the sanitized after-state.
    pub data: String,
    /// JSON text of the sanitized before-state.
    pub old_data: String,
    /// Document identifier within the collection.
    pub document_id: String,
}

impl WarehouseRow {
    /// Returns the `timestamp` column as written to the warehouse.
    #[must_use]
    pub fn timestamp_iso(&self) -> String {
        format_timestamp(&self.timestamp)
    }

    /// Returns the row as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "timestamp": self.timestamp_iso(),
            "event_id": self.event_id,
            "document_name": self.document_name,
            "operation": self.operation.as_str(),
            "data": self.data,
            "old_data": self.old_data,
            "document_id": self.document_id,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn serialize_timestamp<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> WarehouseRow {
        let Some(ts) = Utc.timestamp_opt(1_714_566_600, 250_000_000).single() else {
            panic!("valid timestamp");
        };
        WarehouseRow {
            timestamp: ts,
            event_id: "evt-1".to_string(),
            document_name: "projects/p/databases/(default)/documents/fleet_records/abc"
                .to_string(),
            operation: Operation::Create,
            data: r#"{"status":"active"}"#.to_string(),
            old_data: NULL_PAYLOAD.to_string(),
            document_id: "abc".to_string(),
        }
    }

    #[test]
    fn serializes_exactly_the_changelog_columns() {
        let Ok(value) = serde_json::to_value(sample()) else {
            panic!("row serializes");
        };
        let Some(obj) = value.as_object() else {
            panic!("expected object");
        };
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "data",
                "document_id",
                "document_name",
                "event_id",
                "old_data",
                "operation",
                "timestamp"
            ]
        );
        assert_eq!(obj.get("timestamp"), Some(&serde_json::json!("2024-05-01T12:30:00.250000Z")));
        assert_eq!(obj.get("operation"), Some(&serde_json::json!("CREATE")));
        assert_eq!(obj.get("old_data"), Some(&serde_json::json!("null")));
    }

    #[test]
    fn to_json_matches_serde_output() {
        let row = sample();
        let Ok(value) = serde_json::to_value(&row) else {
            panic!("row serializes");
        };
        assert_eq!(row.to_json(), value);
    }
}
