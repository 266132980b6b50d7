//! HTTP client SDK for the B44 application platform.
//!
//! This crate provides a typed client for the platform's REST API:
//! entity CRUD, integration actions, auth, and an open-ended dynamic
//! surface for custom functions and agents. Requests carry bearer-token
//! authentication; responses (including RFC 7807 problem-details errors)
//! are normalized into plain values or typed errors.
//!
//! # Example
//!
//! ```no_run
//! use b44_client::{B44Client, ListQuery, Result};
//! use serde_json::json;
//!
//! # async fn example() -> Result<()> {
//! let client = B44Client::builder()
//!     .server_url("https://app.example.com/api")
//!     .auth_token("secret")
//!     .build()?;
//!
//! // Entity CRUD
//! let tasks = client.entities().entity("Task");
//! let created = tasks.create(json!({"title": "Ship it"})).await?;
//! let recent = tasks
//!     .list(ListQuery {
//!         sort: Some("-created_date".into()),
//!         limit: Some(10),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! // Integration actions
//! let sent = client
//!     .integrations()
//!     .run("Core", "SendEmail", Some(json!({"to": "a@b.c"})))
//!     .await?;
//!
//! // Custom endpoints: an object payload POSTs, anything else GETs
//! let result = client.call("customThing", Some(json!({"a": 1}))).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Entities**: list, filter, get, create, update, delete, deleteMany,
//!   bulk create, multipart import
//! - **Integrations**: package/action invocation
//! - **Auth**: me, updateMe, login/logout, isAuthenticated
//! - **Dynamic**: any named endpoint via [`B44Client::call`] /
//!   [`B44Client::module`]
//! - **Service role**: elevated sub-client with an independent token
//!
//! Retries, caching, offline queueing, and entity-schema validation are
//! deliberately out of scope and left to callers.

pub mod api;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod token;
pub mod transport;

pub use api::{AuthApi, EntitiesApi, EntityHandle, IntegrationsApi, ListQuery};
pub use client::{B44Client, ClientBuilder, ClientConfig, ServiceRoleClient, DEFAULT_TOKEN_KEY};
pub use dispatch::{DynamicModule, IntegrationPackage};
pub use error::{Error, Result};
pub use token::{
    FileTokenStore, MemoryTokenStore, NavigationSink, RecordingNavigationSink, TokenStore,
};
pub use transport::{Body, RequestDescriptor, Transport};
