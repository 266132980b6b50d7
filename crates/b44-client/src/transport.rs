//! HTTP transport: URL assembly, headers, and response classification.
//!
//! Every operation in the crate bottoms out in [`Transport::request`],
//! which turns a [`RequestDescriptor`] into one HTTP call and normalizes
//! the heterogeneous response shapes the platform produces (enveloped
//! JSON, problem+json errors, bare text) into a single contract.

use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{Error, ProblemDetails, Result};
use crate::token::TokenStore;

/// Request body variants.
#[derive(Debug)]
pub enum Body {
    /// No body.
    None,
    /// JSON-encoded body.
    Json(Value),
    /// Multipart form upload with a single `file` field.
    Multipart { file_name: String, bytes: Vec<u8> },
}

/// One HTTP request, fully described.
///
/// Built per call and handed to [`Transport::request`]; never retained.
#[derive(Debug)]
pub struct RequestDescriptor {
    /// Path relative to the base URL. Variable segments must already be
    /// percent-encoded (see [`crate::dispatch::join_path`]).
    pub path: String,
    pub method: Method,
    /// Query parameters in insertion order. `None` values are omitted.
    pub query: Vec<(String, Option<String>)>,
    pub body: Body,
    /// Caller-supplied header overrides. The bearer token, when set,
    /// always wins over these.
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            query: Vec::new(),
            body: Body::None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        let mut desc = Self::new(Method::POST, path);
        desc.body = Body::Json(body);
        desc
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        let mut desc = Self::new(Method::PUT, path);
        desc.body = Body::Json(body);
        desc
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        let mut desc = Self::new(Method::PATCH, path);
        desc.body = Body::Json(body);
        desc
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. `None` values are dropped at encode time.
    pub fn query(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.query.push((key.into(), value));
        self
    }

    /// Replace the query parameter list wholesale.
    pub fn with_query(mut self, query: Vec<(String, Option<String>)>) -> Self {
        self.query = query;
        self
    }
}

/// Shared transport state: HTTP client, base URL, token slot, store.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
    token_key: String,
    store: Option<Arc<dyn TokenStore>>,
    app_id: Option<String>,
}

impl Transport {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: Url,
        token: Option<String>,
        token_key: String,
        store: Option<Arc<dyn TokenStore>>,
        app_id: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(token),
            token_key,
            store,
            app_id,
        }
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The key under which the token is persisted.
    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    /// Current in-memory token, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    /// Update the in-memory token.
    ///
    /// With `persist` set and a store configured, the value is written
    /// under the configured key, or the key removed when clearing. Store
    /// failures are logged and swallowed; the in-memory update stands.
    pub fn set_token(&self, token: Option<String>, persist: bool) {
        *self.token.write().unwrap() = token.clone();
        if !persist {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };
        let outcome = match &token {
            Some(value) => store.set(&self.token_key, value),
            None => store.remove(&self.token_key),
        };
        if let Err(e) = outcome {
            tracing::warn!(key = %self.token_key, error = %e, "Token store write failed");
        }
    }

    /// Clone this transport's configuration with an independent token
    /// slot, initialized from the current token.
    ///
    /// The detached transport carries no store, so its token changes are
    /// never persisted and never reach the original.
    pub(crate) fn clone_detached(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: RwLock::new(self.token()),
            token_key: self.token_key.clone(),
            store: None,
            app_id: self.app_id.clone(),
        }
    }

    /// Resolve a relative path against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.base_url.join(path).map_err(Error::from)
    }

    /// Issue one HTTP request and classify the response.
    pub async fn request(&self, desc: RequestDescriptor) -> Result<Value> {
        let mut url = self.url(&desc.path)?;
        if desc.query.iter().any(|(_, v)| v.is_some()) {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &desc.query {
                if let Some(value) = value {
                    let _ = pairs.append_pair(key, value);
                }
            }
        }

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &desc.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::Config(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Config(format!("invalid value for header {name}")))?;
            let _ = headers.insert(name, value);
        }
        if let Some(app_id) = &self.app_id {
            let value = HeaderValue::from_str(app_id)
                .map_err(|_| Error::Config("invalid app id".to_string()))?;
            let _ = headers.insert(HeaderName::from_static("x-app-id"), value);
        }
        // Inserted last so it wins over any caller-supplied Authorization.
        if let Some(token) = self.token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::Config("invalid bearer token".to_string()))?;
            let _ = headers.insert(AUTHORIZATION, value);
        }

        tracing::debug!(method = %desc.method, url = %url, "Issuing request");

        let mut builder = self.http.request(desc.method, url).headers(headers);
        builder = match desc.body {
            Body::None => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart { file_name, bytes } => {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        let response = builder.send().await?;
        Self::classify(response).await
    }

    /// Normalize a response into a value or a typed error.
    async fn classify(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        let is_problem = content_type.starts_with("application/problem+json");
        let is_json = is_problem || content_type.starts_with("application/json");

        let text = response.text().await?;
        // Malformed JSON is never fatal; the raw text stands in.
        let parsed: Option<Value> = if is_json {
            serde_json::from_str(&text).ok()
        } else {
            None
        };

        if !status.is_success() {
            if is_problem {
                if let Some(document @ Value::Object(_)) = &parsed {
                    return Err(Self::problem_error(status, document));
                }
            }
            let reason = status.canonical_reason().unwrap_or("");
            let message = format!("HTTP {} {}", status.as_u16(), reason)
                .trim_end()
                .to_string();
            let data = match parsed {
                Some(value) => Some(value),
                None if text.is_empty() => None,
                None => Some(Value::String(text)),
            };
            return Err(Error::Api {
                message,
                status: status.as_u16(),
                code: None,
                data,
            });
        }

        if is_json {
            let payload = parsed.unwrap_or(Value::String(text));
            // Unwrap one envelope level.
            if let Value::Object(map) = &payload {
                if let Some(data) = map.get("data") {
                    return Ok(data.clone());
                }
            }
            Ok(payload)
        } else {
            Ok(Value::String(text))
        }
    }

    fn problem_error(status: StatusCode, document: &Value) -> Error {
        let details: ProblemDetails =
            serde_json::from_value(document.clone()).unwrap_or(ProblemDetails {
                title: None,
                status: None,
                kind: None,
            });
        Error::Api {
            message: details
                .title
                .unwrap_or_else(|| "Request failed".to_string()),
            status: details.status.unwrap_or(status.as_u16()),
            code: details.kind,
            data: Some(document.clone()),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("token_key", &self.token_key)
            .field("has_token", &self.token.read().unwrap().is_some())
            .field("has_store", &self.store.is_some())
            .field("app_id", &self.app_id)
            .finish()
    }
}
