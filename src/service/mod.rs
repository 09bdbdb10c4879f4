//! Service layer: change translation and submission.
//!
//! [`ChangeEventTranslator`] classifies each notification, sanitizes its
//! snapshots, and appends the resulting row through the injected
//! [`crate::sink::WarehouseSink`].

pub mod translator;

pub use translator::{ChangeEventTranslator, ChangeOutcome};
