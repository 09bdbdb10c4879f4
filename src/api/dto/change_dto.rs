//! Change delivery request/response DTOs.
//!
//! Snapshots arrive in the Firestore REST `Document` shape: a `fields`
//! object whose values are typed wrappers such as
//! `{"stringValue": "active"}` or `{"mapValue": {"fields": {...}}}`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::domain::{ChangeNotification, Document, FieldValue, GeoPoint, Operation};
use crate::error::ShimError;
use crate::service::ChangeOutcome;

/// Request body for `POST /api/v1/documents/{document_id}/changes`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChangeRequest {
    /// Delivery-unique event id; generated when absent.
    #[serde(default)]
    pub event_id: Option<String>,
    /// Snapshot before the write; absent or `null` on create.
    #[serde(default)]
    pub before: Option<DocumentSnapshotDto>,
    /// Snapshot after the write; absent or `null` on delete.
    #[serde(default)]
    pub after: Option<DocumentSnapshotDto>,
}

/// A document snapshot in Firestore REST form.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshotDto {
    /// Fully-qualified document name (informational).
    #[serde(default)]
    pub name: Option<String>,
    /// Field name to typed value.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
    /// Creation time (informational).
    #[serde(default)]
    pub create_time: Option<String>,
    /// Last update time (informational).
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Acknowledgement returned once a change has been handled.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChangeAckResponse {
    /// Event id written to the warehouse row.
    pub event_id: String,
    /// Document the change applied to.
    pub document_id: String,
    /// Classified operation.
    pub operation: Operation,
    /// Whether the warehouse accepted the row.
    pub delivered: bool,
}

impl From<ChangeOutcome> for ChangeAckResponse {
    fn from(outcome: ChangeOutcome) -> Self {
        Self {
            event_id: outcome.event_id,
            document_id: outcome.document_id,
            operation: outcome.operation,
            delivered: outcome.delivered,
        }
    }
}

impl ChangeRequest {
    /// Decodes the request into a [`ChangeNotification`] for `document_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ShimError::InvalidRequest`] if the document id is empty or
    /// any field value is not a recognised Firestore value.
    pub fn into_notification(self, document_id: String) -> Result<ChangeNotification, ShimError> {
        if document_id.trim().is_empty() {
            return Err(ShimError::InvalidRequest(
                "document id must not be empty".to_string(),
            ));
        }

        let before = self
            .before
            .map(|snapshot| decode_fields("before", &snapshot.fields))
            .transpose()?;
        let after = self
            .after
            .map(|snapshot| decode_fields("after", &snapshot.fields))
            .transpose()?;

        Ok(ChangeNotification {
            document_id,
            before,
            after,
            event_id: self.event_id,
        })
    }
}

/// Decodes a Firestore `fields` object.
///
/// # Errors
///
/// Returns [`ShimError::InvalidRequest`] naming the first offending field.
pub fn decode_fields(path: &str, fields: &Map<String, Value>) -> Result<Document, ShimError> {
    fields
        .iter()
        .map(|(name, value)| {
            let field_path = format!("{path}.{name}");
            decode_value(&field_path, value).map(|v| (name.clone(), v))
        })
        .collect()
}

/// Decodes one Firestore typed value.
///
/// # Errors
///
/// Returns [`ShimError::InvalidRequest`] for unknown kinds, wrappers with
/// more than one kind, and payloads of the wrong JSON type.
pub fn decode_value(path: &str, value: &Value) -> Result<FieldValue, ShimError> {
    let wrapper = value
        .as_object()
        .ok_or_else(|| invalid(path, "value must be an object"))?;
    let mut kinds = wrapper.iter();
    let (Some((kind, inner)), None) = (kinds.next(), kinds.next()) else {
        return Err(invalid(path, "value must carry exactly one kind"));
    };

    match kind.as_str() {
        "nullValue" => Ok(FieldValue::Null),
        "booleanValue" => inner
            .as_bool()
            .map(FieldValue::Boolean)
            .ok_or_else(|| invalid(path, "booleanValue must be a boolean")),
        "integerValue" => parse_integer(path, inner).map(FieldValue::Integer),
        "doubleValue" => parse_double(path, inner).map(FieldValue::Double),
        "stringValue" => expect_str(path, kind, inner).map(FieldValue::String),
        "referenceValue" => expect_str(path, kind, inner).map(FieldValue::Reference),
        "bytesValue" => expect_str(path, kind, inner).map(FieldValue::Bytes),
        "timestampValue" => parse_timestamp(path, inner).map(FieldValue::Timestamp),
        "geoPointValue" => parse_geo_point(path, inner).map(FieldValue::GeoPoint),
        "arrayValue" => {
            let values = match inner.get("values") {
                None | Some(Value::Null) => return Ok(FieldValue::Array(Vec::new())),
                Some(Value::Array(values)) => values,
                Some(_) => return Err(invalid(path, "arrayValue.values must be an array")),
            };
            values
                .iter()
                .enumerate()
                .map(|(i, v)| decode_value(&format!("{path}[{i}]"), v))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Array)
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                None | Some(Value::Null) => return Ok(FieldValue::Map(BTreeMap::new())),
                Some(Value::Object(fields)) => fields,
                Some(_) => return Err(invalid(path, "mapValue.fields must be an object")),
            };
            decode_fields(path, fields).map(FieldValue::Map)
        }
        other => Err(invalid(path, &format!("unknown value kind `{other}`"))),
    }
}

fn invalid(path: &str, reason: &str) -> ShimError {
    ShimError::InvalidRequest(format!("{path}: {reason}"))
}

fn expect_str(path: &str, kind: &str, inner: &Value) -> Result<String, ShimError> {
    inner
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| invalid(path, &format!("{kind} must be a string")))
}

/// Integers travel as decimal strings; plain JSON integers are accepted too.
fn parse_integer(path: &str, inner: &Value) -> Result<i64, ShimError> {
    match inner {
        Value::String(s) => s
            .parse()
            .map_err(|_| invalid(path, &format!("invalid integerValue: {s}"))),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| invalid(path, &format!("invalid integerValue: {n}"))),
        _ => Err(invalid(path, "integerValue must be a string or integer")),
    }
}

fn parse_double(path: &str, inner: &Value) -> Result<f64, ShimError> {
    match inner {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(path, &format!("invalid doubleValue: {n}"))),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => s
                .parse()
                .map_err(|_| invalid(path, &format!("invalid doubleValue: {s}"))),
        },
        _ => Err(invalid(path, "doubleValue must be a number")),
    }
}

fn parse_timestamp(path: &str, inner: &Value) -> Result<DateTime<Utc>, ShimError> {
    let text = expect_str(path, "timestampValue", inner)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| invalid(path, &format!("invalid timestampValue {text}: {e}")))
}

/// Zero coordinates may be omitted on the wire.
fn parse_geo_point(path: &str, inner: &Value) -> Result<GeoPoint, ShimError> {
    let coordinate = |name: &str| -> Result<f64, ShimError> {
        match inner.get(name) {
            None | Some(Value::Null) => Ok(0.0),
            Some(v) => v
                .as_f64()
                .ok_or_else(|| invalid(path, &format!("geoPointValue.{name} must be a number"))),
        }
    };
    if !inner.is_object() {
        return Err(invalid(path, "geoPointValue must be an object"));
    }
    Ok(GeoPoint::new(coordinate("latitude")?, coordinate("longitude")?))
}
