//! Integrations API.

use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::IntegrationPackage;
use crate::error::Result;
use crate::transport::Transport;

/// Integrations API client.
///
/// Integration actions form an open-ended two-level namespace: every
/// call is `POST integrations/<package>/<action>` with a JSON payload.
pub struct IntegrationsApi {
    transport: Arc<Transport>,
}

impl IntegrationsApi {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Get a handle to one integration package.
    pub fn package(&self, name: &str) -> IntegrationPackage {
        IntegrationPackage::new(self.transport.clone(), name)
    }

    /// Run one action directly.
    pub async fn run(&self, package: &str, action: &str, data: Option<Value>) -> Result<Value> {
        self.package(package).invoke(action, data).await
    }
}
