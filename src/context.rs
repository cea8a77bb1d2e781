//! Per-request resolver context.

use std::sync::Arc;

use weave_core::EntityStore;

/// Shared by every resolver of one request.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn EntityStore>,
    request_id: String,
}

impl AppContext {
    /// Context over `store` for the request `request_id`.
    pub fn new(store: Arc<dyn EntityStore>, request_id: impl Into<String>) -> Self {
        let request_id = request_id.into();
        assert!(!request_id.is_empty(), "request id cannot be empty");

        Self { store, request_id }
    }

    /// The entity store.
    #[must_use]
    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Identifier used to correlate log lines.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}
