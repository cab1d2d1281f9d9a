//! Service client: entry point that binds an endpoint and configuration to shares.

use crate::config::ClientConfig;
use crate::endpoint::ServiceEndpoint;
use crate::error::{Result, ShareError};
use crate::share::{Share, ShareContext};
use std::sync::Arc;
use tracing::debug;

pub struct ShareServiceClient {
    base_uri: String,
    endpoint: Arc<dyn ServiceEndpoint>,
    config: Arc<ClientConfig>,
}

impl ShareServiceClient {
    pub fn new(base_uri: impl Into<String>, endpoint: Arc<dyn ServiceEndpoint>) -> Self {
        Self {
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            endpoint,
            config: Arc::new(ClientConfig::default()),
        }
    }

    pub fn with_config(
        base_uri: impl Into<String>,
        endpoint: Arc<dyn ServiceEndpoint>,
        config: ClientConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut client = Self::new(base_uri, endpoint);
        client.config = Arc::new(config);
        Ok(client)
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handle onto a share. No round trip; the share may not exist yet.
    pub fn share(&self, name: &str) -> Result<Share> {
        if name.is_empty() || name.contains('/') {
            return Err(ShareError::InvalidArgument(format!(
                "invalid share name '{}'",
                name
            )));
        }
        let uri = format!("{}/{}", self.base_uri, name);
        debug!(share = %uri, "Resolved share");
        Ok(Share::new(ShareContext::new(
            name,
            uri,
            None,
            Arc::clone(&self.endpoint),
            Arc::clone(&self.config),
        )))
    }
}
