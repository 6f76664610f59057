use std::sync::Arc;

use crate::api::{ApiTransport, HttpClient};
use crate::app::Result;
use crate::config::Config;
use crate::services::Services;

/// Wires the transport and services together for the CLI and TUI.
pub struct AppContext {
    pub config: Config,
    pub services: Arc<Services>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn ApiTransport> =
            Arc::new(HttpClient::new(&config.api.base_url, config.api.timeout_secs)?);
        Ok(Self::with_transport(transport, config))
    }

    /// Build against any transport. Used by tests to point at a mock server
    /// or a canned transport.
    pub fn with_transport(transport: Arc<dyn ApiTransport>, config: Config) -> Self {
        let services = Arc::new(Services::new(transport));
        Self { config, services }
    }
}
