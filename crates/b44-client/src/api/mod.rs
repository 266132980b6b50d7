//! API endpoint implementations.

mod auth;
mod entities;
mod integrations;

pub use auth::AuthApi;
pub use entities::{EntitiesApi, EntityHandle, ListQuery};
pub use integrations::IntegrationsApi;
