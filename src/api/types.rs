//! Response shapes the client interprets. Everything else stays opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::Payload;

/// `GET /models/{provider}`.
///
/// On provider trouble the backend still answers 200 with an empty list and
/// a `warning` or `error`/`detail`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelList {
    /// Either `{id, name}` objects or bare id strings.
    pub models: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// A selectable model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
}

/// Used when a provider reports no models.
pub const DEFAULT_MODEL: &str = "gpt-4o";

impl ModelList {
    /// Normalized entries; falls back to [`DEFAULT_MODEL`] when empty.
    pub fn entries(&self) -> Vec<ModelEntry> {
        let entries: Vec<ModelEntry> = self
            .models
            .iter()
            .filter_map(|m| match m {
                Value::String(id) => Some(ModelEntry {
                    id: id.clone(),
                    name: id.clone(),
                }),
                Value::Object(obj) => {
                    let id = obj.get("id").and_then(value_to_string)?;
                    let name = obj
                        .get("name")
                        .and_then(value_to_string)
                        .unwrap_or_else(|| id.clone());
                    Some(ModelEntry { id, name })
                }
                _ => None,
            })
            .collect();

        if entries.is_empty() {
            vec![ModelEntry {
                id: DEFAULT_MODEL.to_string(),
                name: DEFAULT_MODEL.to_string(),
            }]
        } else {
            entries
        }
    }

    /// Warning or error text worth surfacing to the user.
    pub fn notice(&self) -> Option<String> {
        self.warning.clone().or_else(|| match (&self.error, &self.detail) {
            (Some(err), Some(detail)) => Some(format!("{err}: {detail}")),
            (Some(err), None) => Some(err.clone()),
            (None, _) => None,
        })
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Body of `GET /ping/{provider}` when the backend sends one. Only the
/// HTTP status decides whether a ping succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingReport {
    pub provider: String,
    pub ok: bool,
    pub status: u16,
    pub detail: String,
    pub latency_ms: i64,
}

impl PingReport {
    /// Best-effort read of a ping body; `None` unless it is a JSON object.
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        match payload {
            Payload::Json(value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

/// `GET /uptime`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Uptime {
    pub seconds: u64,
}

/// Cloud sync target inside [`BackendConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSync {
    pub provider: String,
    pub base_url: String,
    pub auth: Value,
}

/// `GET/POST /config`: the backend's storage and network settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub local_storage_path: String,
    pub tailscale_router: String,
    pub cloud_sync: CloudSync,
}

/// `POST /storage/test`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageTestResult {
    pub wrote: String,
}
