//! Domain layer: document values, change notifications and warehouse rows.
//!
//! Everything here is pure data transformation. Nothing in this module
//! performs I/O.

pub mod change;
pub mod document_path;
pub mod field_value;
pub mod row;

pub use change::{ChangeNotification, Operation, classify_operation};
pub use document_path::DocumentPathTemplate;
pub use field_value::{Document, FieldValue, GeoPoint, sanitize, sanitize_document};
pub use row::{NULL_PAYLOAD, WarehouseRow};
