//! API façade: one method per backend endpoint, grouped by resource.
//!
//! The collection resources (projects, tasks, notes, data assets, RAG
//! documents, bills) share the CRUD calls on [`Api`] keyed by [`Resource`].
//! Everything else lives in a submodule per area:
//!
//! - [`assistant`]: providers, threads, messages, chat stream, models, pings
//! - [`finance`]: ledgers, budget summary/import, KPI datasets/upload
//! - [`knowledge`]: RAG query
//! - [`sensors`]: sensors and readings
//! - [`vault`]: PIN-scoped secret items
//! - [`system`]: env, dashboard, uptime, config, dev tooling, storage
//!
//! Records the backend owns are returned as opaque `serde_json::Value`s;
//! the few shapes the client interprets are typed in [`types`].

pub mod assistant;
pub mod finance;
pub mod knowledge;
pub mod sensors;
pub mod system;
pub mod types;
pub mod vault;

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use crate::config::HubConfig;
use crate::http::{HttpClient, RequestOptions, Transport, UreqTransport};

pub use types::*;

/// Collections with uniform list/create/update/delete endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Projects,
    Tasks,
    Notes,
    DataAssets,
    RagDocs,
    Bills,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Self::Projects => "/projects",
            Self::Tasks => "/tasks",
            Self::Notes => "/notes",
            Self::DataAssets => "/data/assets",
            Self::RagDocs => "/rag/docs",
            Self::Bills => "/bills",
        }
    }

    /// Singular noun for toasts.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Projects => "project",
            Self::Tasks => "task",
            Self::Notes => "note",
            Self::DataAssets => "data asset",
            Self::RagDocs => "document",
            Self::Bills => "bill",
        }
    }
}

/// Typed-by-convention entry point to the backend.
#[derive(Debug)]
pub struct Api {
    http: HttpClient,
    ping_timeout: Duration,
}

impl Api {
    /// Production façade over `ureq`, configured from `[server]`.
    pub fn from_config(cfg: &HubConfig) -> Self {
        let transport = UreqTransport::new(Duration::from_millis(cfg.server.timeout_ms));
        Self {
            http: HttpClient::new(&cfg.server.base_url, Box::new(transport)),
            ping_timeout: Duration::from_millis(cfg.server.ping_timeout_ms),
        }
    }

    /// Façade over an arbitrary transport.
    pub fn with_transport(base_url: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            http: HttpClient::new(base_url, transport),
            ping_timeout: Duration::from_secs(8),
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    // -- Collections --

    /// `GET {resource}`: the full list.
    pub fn list(&self, resource: Resource) -> Result<Vec<Value>> {
        let value = self.http.value(resource.path(), RequestOptions::get())?;
        Ok(into_items(value))
    }

    /// `POST {resource}`.
    pub fn create(&self, resource: Resource, record: Value) -> Result<Value> {
        self.http.value(resource.path(), RequestOptions::post(record))
    }

    /// `PUT {resource}/{id}`.
    pub fn update(&self, resource: Resource, id: &str, record: Value) -> Result<Value> {
        let path = format!("{}/{}", resource.path(), segment(id));
        self.http.value(&path, RequestOptions::put(record))
    }

    /// `DELETE {resource}/{id}`.
    pub fn delete(&self, resource: Resource, id: &str) -> Result<Value> {
        let path = format!("{}/{}", resource.path(), segment(id));
        self.http.value(&path, RequestOptions::delete())
    }
}

/// Normalize a list response: a bare array, or an object wrapping one under
/// `items`, `results`, `data`, or any single array-valued key.
pub fn into_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ["items", "results", "data"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            });
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => items,
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// Record id as a string, whether the backend sent a number or a string.
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::{ScriptedReply, ScriptedTransport};
    use crate::http::Method;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn into_items_accepts_common_wrappers() {
        assert_eq!(into_items(json!([1, 2])).len(), 2);
        assert_eq!(into_items(json!({"items": [1]})).len(), 1);
        assert_eq!(into_items(json!({"projects": [1, 2, 3]})).len(), 3);
        assert!(into_items(json!({"a": [1], "b": [2]})).is_empty());
        assert!(into_items(json!(null)).is_empty());
    }

    #[test]
    fn record_id_handles_numbers_and_strings() {
        assert_eq!(record_id(&json!({"id": 7})), Some("7".to_string()));
        assert_eq!(record_id(&json!({"id": "b-1"})), Some("b-1".to_string()));
        assert_eq!(record_id(&json!({"name": "x"})), None);
    }

    #[test]
    fn segment_escapes_reserved_bytes() {
        assert_eq!(segment("abc-1_2.~"), "abc-1_2.~");
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn crud_calls_hit_resource_paths() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push(ScriptedReply::ok(r#"{"tasks": [{"id": 1}]}"#))
            .push(ScriptedReply::ok(r#"{"id": 2}"#))
            .push(ScriptedReply::ok("{}"))
            .push(ScriptedReply::ok(""));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));

        assert_eq!(api.list(Resource::Tasks).unwrap().len(), 1);
        api.create(Resource::Tasks, json!({"title": "x"})).unwrap();
        api.update(Resource::Tasks, "2", json!({"done": true})).unwrap();
        api.delete(Resource::Tasks, "2").unwrap();

        let seen = transport.requests();
        let calls: Vec<(Method, &str)> = seen.iter().map(|r| (r.method, r.url.as_str())).collect();
        assert_eq!(
            calls,
            vec![
                (Method::Get, "http://hub/tasks"),
                (Method::Post, "http://hub/tasks"),
                (Method::Put, "http://hub/tasks/2"),
                (Method::Delete, "http://hub/tasks/2"),
            ]
        );
    }
}
