//! Main client implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use url::Url;

use crate::api::{AuthApi, EntitiesApi, IntegrationsApi};
use crate::dispatch::DynamicModule;
use crate::error::{Error, Result};
use crate::token::{NavigationSink, TokenStore};
use crate::transport::{RequestDescriptor, Transport};

/// Default durable-store key for the bearer token.
pub const DEFAULT_TOKEN_KEY: &str = "__b44_token__";

/// B44 platform client.
///
/// Exposes the fixed modules (entities, integrations, auth) plus an
/// open-ended dynamic surface for custom endpoints.
///
/// # Example
///
/// ```no_run
/// use b44_client::B44Client;
///
/// # async fn example() -> b44_client::Result<()> {
/// let client = B44Client::builder()
///     .server_url("https://app.example.com/api")
///     .auth_token("secret")
///     .build()?;
///
/// let tasks = client.entities().entity("Task");
/// let open = tasks.filter(&serde_json::json!({"status": "open"}), Default::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct B44Client {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    transport: Arc<Transport>,
    navigator: Option<Arc<dyn NavigationSink>>,
    /// Memoized dynamic modules, one per accessed name.
    modules: Mutex<HashMap<String, DynamicModule>>,
}

impl B44Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The normalized server base URL.
    pub fn base_url(&self) -> &Url {
        self.inner.transport.base_url()
    }

    /// Snapshot of the client configuration.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.inner.transport.base_url().clone(),
            token_key: self.inner.transport.token_key().to_string(),
            has_token: self.inner.transport.token().is_some(),
        }
    }

    /// Update the bearer token.
    ///
    /// With `persist` set and a token store configured, the change is
    /// written through to (or removed from) the durable store.
    pub fn set_token(&self, token: Option<String>, persist: bool) {
        self.inner.transport.set_token(token, persist);
    }

    /// Issue a raw request through the transport.
    ///
    /// Escape hatch for endpoints the typed modules don't cover, e.g.
    /// custom verbs or header overrides.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Value> {
        self.inner.transport.request(descriptor).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fixed modules
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the entities API.
    pub fn entities(&self) -> EntitiesApi {
        EntitiesApi::new(self.inner.transport.clone())
    }

    /// Access the integrations API.
    pub fn integrations(&self) -> IntegrationsApi {
        IntegrationsApi::new(self.inner.transport.clone())
    }

    /// Access the auth API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.inner.transport.clone(), self.inner.navigator.clone())
    }

    /// Elevated sub-client for server-context calls.
    ///
    /// Shares this client's transport configuration but owns an
    /// independent token slot, so overriding its token never touches
    /// this client's token and is never persisted.
    pub fn service_role(&self) -> ServiceRoleClient {
        ServiceRoleClient::new(&self.inner.transport)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dynamic surface
    // ─────────────────────────────────────────────────────────────────────────

    /// Get (or reuse) the dynamic module rooted at `name`.
    ///
    /// Handles are memoized per name; repeated access returns the same
    /// module.
    pub fn module(&self, name: &str) -> DynamicModule {
        memoized_module(&self.inner.modules, &self.inner.transport, name)
    }

    /// Call a top-level custom endpoint.
    ///
    /// Shorthand for the root dynamic module: `call("customThing",
    /// Some(json!({"a": 1})))` issues `POST <base>/customThing`, while
    /// `call("customThing", None)` issues `GET <base>/customThing`. See
    /// [`DynamicModule::invoke`] for the verb heuristic.
    pub async fn call(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        DynamicModule::new(self.inner.transport.clone(), "")
            .invoke(name, arg)
            .await
    }
}

fn memoized_module(
    cache: &Mutex<HashMap<String, DynamicModule>>,
    transport: &Arc<Transport>,
    name: &str,
) -> DynamicModule {
    let mut modules = cache.lock().unwrap();
    modules
        .entry(name.to_string())
        .or_insert_with(|| DynamicModule::new(transport.clone(), name))
        .clone()
}

/// Configuration snapshot returned by [`B44Client::config`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Normalized server base URL.
    pub server_url: Url,
    /// Durable-store key for the token.
    pub token_key: String,
    /// Whether a bearer token is currently set.
    pub has_token: bool,
}

/// Privileged sub-client for server-context elevated calls.
///
/// Carries its own token slot; [`ServiceRoleClient::with_token`] affects
/// only this sub-client and never persists.
pub struct ServiceRoleClient {
    transport: Arc<Transport>,
    modules: Mutex<HashMap<String, DynamicModule>>,
}

impl ServiceRoleClient {
    fn new(parent: &Arc<Transport>) -> Self {
        Self {
            transport: Arc::new(parent.clone_detached()),
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// Override the token for this sub-client only (never persisted).
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.transport.set_token(Some(token.into()), false);
        self
    }

    /// Update this sub-client's token without persisting.
    pub fn set_token(&self, token: Option<String>) {
        self.transport.set_token(token, false);
    }

    /// Access the entities API with this sub-client's token.
    pub fn entities(&self) -> EntitiesApi {
        EntitiesApi::new(self.transport.clone())
    }

    /// Access the integrations API with this sub-client's token.
    pub fn integrations(&self) -> IntegrationsApi {
        IntegrationsApi::new(self.transport.clone())
    }

    /// Custom server functions namespace.
    pub fn functions(&self) -> DynamicModule {
        self.module("functions")
    }

    /// Agents namespace.
    pub fn agents(&self) -> DynamicModule {
        self.module("agents")
    }

    /// Logs namespace.
    pub fn logs(&self) -> DynamicModule {
        self.module("logs")
    }

    /// Single-sign-on namespace.
    pub fn sso(&self) -> DynamicModule {
        self.module("sso")
    }

    /// Get (or reuse) the dynamic module rooted at `name`.
    pub fn module(&self, name: &str) -> DynamicModule {
        memoized_module(&self.modules, &self.transport, name)
    }

    /// Call a top-level custom endpoint with this sub-client's token.
    pub async fn call(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        DynamicModule::new(self.transport.clone(), "")
            .invoke(name, arg)
            .await
    }
}

/// Builder for creating a [`B44Client`].
pub struct ClientBuilder {
    server_url: Option<String>,
    auth_token: Option<String>,
    token_key: String,
    app_id: Option<String>,
    token_store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn NavigationSink>>,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            server_url: None,
            auth_token: None,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            app_id: None,
            token_store: None,
            navigator: None,
            http_client: None,
        }
    }

    /// Set the server base URL (required).
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the initial bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the durable-store key for the token (default `__b44_token__`).
    pub fn token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Set the app identifier, sent as `X-App-Id` on every request.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Attach a durable token store. Without one, persistence is skipped.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Attach a navigation sink for login/logout redirects.
    pub fn navigator(mut self, navigator: Arc<dyn NavigationSink>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Override the HTTP client (default `reqwest::Client::new()`).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the client.
    ///
    /// Fails synchronously with [`Error::Config`] when no server URL was
    /// supplied. The initial token is the explicit one, else whatever the
    /// store holds under the token key, else absent.
    pub fn build(self) -> Result<B44Client> {
        let server_url = self
            .server_url
            .ok_or_else(|| Error::Config("server_url is required".to_string()))?;

        // Parse and normalize so relative joins land under the base path.
        let mut base_url = Url::parse(&server_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let token = self.auth_token.or_else(|| {
            self.token_store
                .as_ref()
                .and_then(|store| store.get(&self.token_key))
        });

        let transport = Transport::new(
            self.http_client.unwrap_or_default(),
            base_url,
            token,
            self.token_key,
            self.token_store,
            self.app_id,
        );

        Ok(B44Client {
            inner: Arc::new(ClientInner {
                transport: Arc::new(transport),
                navigator: self.navigator,
                modules: Mutex::new(HashMap::new()),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
