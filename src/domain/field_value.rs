//! Document field values and their reduction to JSON.
//!
//! [`FieldValue`] is a closed sum type covering every value a document
//! snapshot can hold. [`sanitize`] walks a value tree and produces a
//! [`serde_json::Value`] that can be written to the warehouse as text.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

/// A document snapshot: field name to value.
pub type Document = BTreeMap<String, FieldValue>;

/// A geographic point stored in a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A value found in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Point in time, normalised to UTC.
    Timestamp(DateTime<Utc>),
    /// Latitude/longitude pair.
    GeoPoint(GeoPoint),
    /// Path of another document, e.g. `projects/p/databases/(default)/documents/c/id`.
    Reference(String),
    /// Raw bytes, kept as the base64 text they were delivered in.
    Bytes(String),
    /// Ordered sequence.
    Array(Vec<FieldValue>),
    /// Nested mapping.
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Reduces this value to JSON. See [`sanitize`].
    #[must_use]
    pub fn sanitize(&self) -> Value {
        sanitize(self)
    }
}

/// Recursively converts a [`FieldValue`] into a JSON-representable value.
///
/// Timestamps become RFC 3339 strings, geo points become
/// `{"latitude", "longitude"}` objects, references and bytes become their
/// string form. Arrays keep element order and maps keep their key set.
/// A non-finite double has no JSON number form and becomes `null`.
#[must_use]
pub fn sanitize(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Integer(i) => Value::Number(Number::from(*i)),
        FieldValue::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        FieldValue::String(s) | FieldValue::Reference(s) | FieldValue::Bytes(s) => {
            Value::String(s.clone())
        }
        FieldValue::Timestamp(ts) => Value::String(iso_timestamp(ts)),
        FieldValue::GeoPoint(point) => {
            let mut obj = Map::with_capacity(2);
            obj.insert("latitude".to_string(), finite_or_null(point.latitude));
            obj.insert("longitude".to_string(), finite_or_null(point.longitude));
            Value::Object(obj)
        }
        FieldValue::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        FieldValue::Map(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), sanitize(v)))
                .collect(),
        ),
    }
}

/// Sanitizes a whole document snapshot into a JSON object.
#[must_use]
pub fn sanitize_document(document: &Document) -> Value {
    Value::Object(
        document
            .iter()
            .map(|(k, v)| (k.clone(), sanitize(v)))
            .collect(),
    )
}

fn finite_or_null(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// ISO-8601 with a `+00:00` offset. Sub-second precision is truncated to
/// microseconds and written as six digits, or omitted when zero.
fn iso_timestamp(ts: &DateTime<Utc>) -> String {
    let precision = if ts.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    ts.to_rfc3339_opts(precision, false)
}

impl From<Value> for FieldValue {
    /// Lifts plain JSON back into the value model. Numbers that fit an
    /// `i64` become [`FieldValue::Integer`], all others [`FieldValue::Double`].
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<GeoPoint> for FieldValue {
    fn from(point: GeoPoint) -> Self {
        Self::GeoPoint(point)
    }
}
