//! Application state for the web layer.

use std::sync::Arc;

use crate::departures::DeparturesApi;

/// Shared application state.
pub struct AppState<A, D, T> {
    /// Departures query service
    pub api: Arc<DeparturesApi<A, D, T>>,
}

impl<A, D, T> AppState<A, D, T> {
    pub fn new(api: DeparturesApi<A, D, T>) -> Self {
        Self { api: Arc::new(api) }
    }
}

impl<A, D, T> Clone for AppState<A, D, T> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}
