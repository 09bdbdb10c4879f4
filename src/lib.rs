//! # firestore-changelog
//!
//! Change-data-capture shim: mirrors every document write in a Firestore
//! collection as an append-only row in a warehouse changelog table.
//!
//! Each delivery is classified (CREATE, UPDATE or DELETE), its before and
//! after snapshots are reduced to plain JSON, and one row is appended to
//! the warehouse. Warehouse failures are logged and swallowed; nothing is
//! retried.
//!
//! ## Architecture
//!
//! ```text
//! Trigger layer (HTTP push)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ChangeEventTranslator (service/)
//!     ├── FieldValue / ChangeNotification / WarehouseRow (domain/)
//!     │
//!     └── WarehouseSink (sink/): BigQuery | PostgreSQL | memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod sink;
