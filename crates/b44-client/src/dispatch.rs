//! Dynamic request dispatch.
//!
//! The platform exposes an open-ended set of named RPC-style endpoints
//! (custom functions, agents, integration actions) that cannot be
//! enumerated at compile time. Instead of reflective member interception,
//! dispatch is an explicit lookup: [`resolve_call`] maps an endpoint name
//! plus a call argument to a [`RequestDescriptor`], and [`DynamicModule`] /
//! [`IntegrationPackage`] wrap it per namespace.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::transport::{RequestDescriptor, Transport};

/// Join pre-encoded path segments, percent-encoding each one.
pub(crate) fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Render a scalar query value as its string encoding.
///
/// `Null` is omitted entirely; compound values fall back to their JSON
/// text, matching how the platform expects pre-serialized filters.
pub(crate) fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Map an endpoint name and call argument to a request descriptor.
///
/// The verb heuristic: a non-array JSON object with at least one key is
/// a POST body; anything else (absent, null, scalar, empty object) is a
/// GET, with an object's entries as query parameters. An object whose
/// keys all map to `Null` still POSTs — only the key count decides.
pub(crate) fn resolve_call(path: String, arg: Option<Value>) -> RequestDescriptor {
    match arg {
        Some(Value::Object(map)) if !map.is_empty() => {
            RequestDescriptor::post(path, Value::Object(map))
        }
        // Empty object, null, scalar, array, or nothing: GET, no payload.
        _ => RequestDescriptor::get(path),
    }
}

/// Single-level dynamic namespace rooted at `base_path`.
///
/// An empty `base_path` is the client's own top level: `invoke("thing")`
/// hits `GET <base>/thing`. A named module (`functions`, `agents`, ...)
/// prefixes its name: `invoke("thing")` hits `<base>/functions/thing`.
#[derive(Debug, Clone)]
pub struct DynamicModule {
    transport: Arc<Transport>,
    base_path: String,
}

impl DynamicModule {
    pub(crate) fn new(transport: Arc<Transport>, base_path: &str) -> Self {
        let base_path = if base_path.is_empty() {
            String::new()
        } else {
            join_path(&[base_path])
        };
        Self {
            transport,
            base_path,
        }
    }

    fn path(&self, endpoint: &str) -> String {
        let endpoint = join_path(&[endpoint]);
        if self.base_path.is_empty() {
            endpoint
        } else {
            format!("{}/{}", self.base_path, endpoint)
        }
    }

    /// The namespace this module is rooted at ("" for the top level).
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Call `endpoint`, choosing the verb from the argument shape.
    ///
    /// A non-array object with at least one key POSTs that object as the
    /// JSON body; anything else GETs, with an object's entries as query
    /// parameters. Note the hazard: an empty object (or one holding only
    /// nulls after serialization) is indistinguishable from "no payload"
    /// and issues a GET. Use [`DynamicModule::get`] or
    /// [`DynamicModule::post`] when the verb must not depend on data.
    pub async fn invoke(&self, endpoint: &str, arg: Option<Value>) -> Result<Value> {
        self.transport
            .request(resolve_call(self.path(endpoint), arg))
            .await
    }

    /// Explicit `GET <base_path>/<endpoint>` with optional query parameters.
    pub async fn get(&self, endpoint: &str, query: Option<&Map<String, Value>>) -> Result<Value> {
        let mut desc = RequestDescriptor::get(self.path(endpoint));
        if let Some(query) = query {
            for (key, value) in query {
                desc = desc.query(key.clone(), query_value(value));
            }
        }
        self.transport.request(desc).await
    }

    /// Explicit `POST <base_path>/<endpoint>` with a JSON body.
    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::post(self.path(endpoint), body))
            .await
    }
}

/// Two-level dynamic namespace for integration packages.
///
/// Every action is a POST to `integrations/<package>/<action>` with a
/// JSON body, defaulting to an empty object.
#[derive(Debug, Clone)]
pub struct IntegrationPackage {
    transport: Arc<Transport>,
    package: String,
}

impl IntegrationPackage {
    pub(crate) fn new(transport: Arc<Transport>, package: &str) -> Self {
        Self {
            transport,
            package: package.to_string(),
        }
    }

    /// The package name this handle is bound to.
    pub fn name(&self) -> &str {
        &self.package
    }

    /// Run `action` with the given payload (or `{}` when absent).
    pub async fn invoke(&self, action: &str, data: Option<Value>) -> Result<Value> {
        let path = format!(
            "integrations/{}",
            join_path(&[self.package.as_str(), action])
        );
        let body = data.unwrap_or_else(|| Value::Object(Map::new()));
        self.transport
            .request(RequestDescriptor::post(path, body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_join_path_encodes_segments() {
        assert_eq!(join_path(&["entities", "task"]), "entities/task");
        assert_eq!(join_path(&["my type", "a/b"]), "my%20type/a%2Fb");
    }

    #[test]
    fn test_resolve_call_object_posts() {
        let desc = resolve_call("customThing".to_string(), Some(json!({"a": 1})));
        assert_eq!(desc.method, Method::POST);
        assert!(matches!(
            &desc.body,
            crate::transport::Body::Json(v) if v == &json!({"a": 1})
        ));
    }

    #[test]
    fn test_resolve_call_absent_gets() {
        let desc = resolve_call("customThing".to_string(), None);
        assert_eq!(desc.method, Method::GET);
        assert!(desc.query.is_empty());
    }

    #[test]
    fn test_resolve_call_empty_object_gets() {
        // The documented heuristic hazard: {} carries no keys, so GET.
        let desc = resolve_call("customThing".to_string(), Some(json!({})));
        assert_eq!(desc.method, Method::GET);
    }

    #[test]
    fn test_resolve_call_all_null_object_posts() {
        // Keys count even when every value is null.
        let desc = resolve_call("customThing".to_string(), Some(json!({"a": null})));
        assert_eq!(desc.method, Method::POST);
    }

    #[test]
    fn test_query_value_rendering() {
        assert_eq!(query_value(&json!(null)), None);
        assert_eq!(query_value(&json!("x")), Some("x".to_string()));
        assert_eq!(query_value(&json!(5)), Some("5".to_string()));
        assert_eq!(query_value(&json!(true)), Some("true".to_string()));
        assert_eq!(query_value(&json!([1, 2])), Some("[1,2]".to_string()));
    }
}
