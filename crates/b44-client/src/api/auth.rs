//! Auth API.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::token::NavigationSink;
use crate::transport::{RequestDescriptor, Transport};

/// Auth API client.
pub struct AuthApi {
    transport: Arc<Transport>,
    navigator: Option<Arc<dyn NavigationSink>>,
}

impl AuthApi {
    pub(crate) fn new(
        transport: Arc<Transport>,
        navigator: Option<Arc<dyn NavigationSink>>,
    ) -> Self {
        Self {
            transport,
            navigator,
        }
    }

    /// Fetch the current user.
    pub async fn me(&self) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::get("auth/me"))
            .await
    }

    /// Update the current user with a partial payload.
    pub async fn update_me(&self, changes: Value) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::patch("auth/me", changes))
            .await
    }

    /// Navigate to the hosted login page.
    ///
    /// `next` is carried as the post-login destination. Without a
    /// navigation sink (server context) this is a no-op.
    pub fn login(&self, next: Option<&str>) -> Result<()> {
        let Some(navigator) = &self.navigator else {
            return Ok(());
        };
        let mut url = self.transport.url("auth/login")?;
        if let Some(next) = next {
            let _ = url.query_pairs_mut().append_pair("next", next);
        }
        navigator.navigate(&url);
        Ok(())
    }

    /// Log out: tell the server, clear the persisted token, and return
    /// to the application root when a navigation sink is present.
    ///
    /// The server call is best effort; a failure never blocks the local
    /// token clear.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self
            .transport
            .request(RequestDescriptor::post(
                "auth/logout",
                Value::Object(Default::default()),
            ))
            .await
        {
            tracing::warn!(error = %e, "Server logout failed, clearing token anyway");
        }
        self.transport.set_token(None, true);
        if let Some(navigator) = &self.navigator {
            navigator.navigate(self.transport.base_url());
        }
        Ok(())
    }

    /// Whether the current token authenticates against `auth/me`.
    ///
    /// Any error is downgraded to `false`; repeated calls with an
    /// unchanged token are idempotent and have no side effects.
    pub async fn is_authenticated(&self) -> bool {
        self.me().await.is_ok()
    }
}
