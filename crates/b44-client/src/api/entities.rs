//! Entities API.
//!
//! Records are opaque JSON mappings with at least an identifier field;
//! payloads pass through unmodified apart from the envelope unwrap done
//! by the transport.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::dispatch::join_path;
use crate::error::Result;
use crate::transport::{Body, RequestDescriptor, Transport};

/// Query parameters for listing or filtering entities.
///
/// `None` fields are omitted from the query string; `fields` is
/// comma-joined before encoding.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Sort expression, e.g. `-created_date`.
    pub sort: Option<String>,
    /// Maximum number of records to return.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub skip: Option<u64>,
    /// Restrict returned records to these fields.
    pub fields: Option<Vec<String>>,
}

impl ListQuery {
    pub(crate) fn into_pairs(self) -> Vec<(String, Option<String>)> {
        vec![
            ("sort".to_string(), self.sort),
            ("limit".to_string(), self.limit.map(|v| v.to_string())),
            ("skip".to_string(), self.skip.map(|v| v.to_string())),
            ("fields".to_string(), self.fields.map(|f| f.join(","))),
        ]
    }
}

/// Entities API client.
pub struct EntitiesApi {
    transport: Arc<Transport>,
}

impl EntitiesApi {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Get a handle to one entity type.
    pub fn entity(&self, entity_type: &str) -> EntityHandle {
        EntityHandle::new(self.transport.clone(), entity_type)
    }
}

/// Operations on a single entity type.
#[derive(Debug, Clone)]
pub struct EntityHandle {
    transport: Arc<Transport>,
    base: String,
}

impl EntityHandle {
    pub(crate) fn new(transport: Arc<Transport>, entity_type: &str) -> Self {
        Self {
            transport,
            base: format!("entities/{}", join_path(&[entity_type])),
        }
    }

    fn path(&self, rest: &[&str]) -> String {
        if rest.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{}", self.base, join_path(rest))
        }
    }

    /// List records.
    pub async fn list(&self, query: ListQuery) -> Result<Value> {
        let desc = RequestDescriptor::get(self.path(&[])).with_query(query.into_pairs());
        self.transport.request(desc).await
    }

    /// List records matching a filter.
    ///
    /// The filter object is JSON-stringified into the `q` parameter.
    pub async fn filter(&self, filter: &Value, query: ListQuery) -> Result<Value> {
        let mut pairs = vec![("q".to_string(), Some(serde_json::to_string(filter)?))];
        pairs.extend(query.into_pairs());
        let desc = RequestDescriptor::get(self.path(&[])).with_query(pairs);
        self.transport.request(desc).await
    }

    /// Get a record by ID.
    pub async fn get(&self, id: &str) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::get(self.path(&[id])))
            .await
    }

    /// Create a record.
    pub async fn create(&self, record: Value) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::post(self.path(&[]), record))
            .await
    }

    /// Update a record with a partial payload.
    pub async fn update(&self, id: &str, changes: Value) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::put(self.path(&[id]), changes))
            .await
    }

    /// Delete a record by ID.
    pub async fn delete(&self, id: &str) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::delete(self.path(&[id])))
            .await
    }

    /// Delete every record matching a filter.
    pub async fn delete_many(&self, query: Value) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::post(
                self.path(&["deleteMany"]),
                json!({ "query": query }),
            ))
            .await
    }

    /// Create many records in one call.
    pub async fn bulk_create(&self, records: Vec<Value>) -> Result<Value> {
        self.transport
            .request(RequestDescriptor::post(
                self.path(&["bulk"]),
                json!({ "data": records }),
            ))
            .await
    }

    /// Import records from a file, uploaded as a multipart `file` field.
    pub async fn import(&self, file_name: &str, bytes: Vec<u8>) -> Result<Value> {
        let mut desc = RequestDescriptor::new(reqwest::Method::POST, self.path(&["import"]));
        desc.body = Body::Multipart {
            file_name: file_name.to_string(),
            bytes,
        };
        self.transport.request(desc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_pairs_omit_none() {
        let pairs = ListQuery {
            sort: Some("-created".to_string()),
            limit: None,
            skip: Some(10),
            fields: None,
        }
        .into_pairs();

        let kept: Vec<_> = pairs
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect();
        assert_eq!(
            kept,
            vec![
                ("sort".to_string(), "-created".to_string()),
                ("skip".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_fields_comma_join() {
        let pairs = ListQuery {
            fields: Some(vec!["id".to_string(), "title".to_string()]),
            ..Default::default()
        }
        .into_pairs();

        let fields = pairs
            .into_iter()
            .find(|(k, _)| k == "fields")
            .and_then(|(_, v)| v);
        assert_eq!(fields, Some("id,title".to_string()));
    }
}
