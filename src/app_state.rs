//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ChangeEventTranslator;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Translator that turns change notifications into warehouse rows.
    pub translator: Arc<ChangeEventTranslator>,
}

impl AppState {
    /// Wraps a translator for sharing across handlers.
    #[must_use]
    pub fn new(translator: ChangeEventTranslator) -> Self {
        Self {
            translator: Arc::new(translator),
        }
    }
}
