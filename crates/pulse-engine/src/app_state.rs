//! Shared application state for the exposition server.

use std::sync::Arc;

use crate::registry::MetricRegistry;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<MetricRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }
}
