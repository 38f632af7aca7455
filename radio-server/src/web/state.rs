//! Application state for the web layer.

use std::sync::Arc;

use crate::client::RadioClient;
use crate::transport::HttpTransport;

/// Shared application state.
pub struct AppState<T = HttpTransport> {
    /// The one radio directory client of the process
    pub client: Arc<RadioClient<T>>,
}

impl<T> AppState<T> {
    /// Create a new app state.
    pub fn new(client: Arc<RadioClient<T>>) -> Self {
        Self { client }
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}
