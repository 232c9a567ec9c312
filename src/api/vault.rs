//! PIN-scoped vault endpoints.
//!
//! The PIN travels in every request body; the backend re-validates it each
//! time. Nothing is hashed or encrypted client-side.

use anyhow::Result;
use serde_json::{Value, json};

use super::{Api, into_items, segment};
use crate::http::{Body, RequestOptions};

impl Api {
    /// `POST /vault/auth`: `true` when the backend accepts the PIN.
    ///
    /// A 2xx reply counts as accepted unless its body carries an explicit
    /// `ok`, `valid` or `success` flag set to `false`.
    pub fn vault_auth(&self, pin: &str) -> Result<bool> {
        let value = self
            .http
            .value("/vault/auth", RequestOptions::post(json!({ "pin": pin })))?;
        Ok(auth_accepted(&value))
    }

    /// `POST /vault/items/list`.
    pub fn vault_items(&self, pin: &str) -> Result<Vec<Value>> {
        let value = self.http.value(
            "/vault/items/list",
            RequestOptions::post(json!({ "pin": pin })),
        )?;
        Ok(into_items(value))
    }

    /// `POST /vault/items`: `item` fields plus the PIN.
    pub fn create_vault_item(&self, pin: &str, item: Value) -> Result<Value> {
        let mut body = match item {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        body.insert("pin".to_string(), Value::String(pin.to_string()));
        self.http
            .value("/vault/items", RequestOptions::post(Value::Object(body)))
    }

    /// `DELETE /vault/items/{id}` with the PIN in the body.
    pub fn delete_vault_item(&self, pin: &str, id: &str) -> Result<Value> {
        let options = RequestOptions {
            body: Body::Json(json!({ "pin": pin })),
            ..RequestOptions::delete()
        };
        self.http
            .value(&format!("/vault/items/{}", segment(id)), options)
    }
}

fn auth_accepted(value: &Value) -> bool {
    ["ok", "valid", "success"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_bool))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::{ScriptedReply, ScriptedTransport};
    use std::sync::Arc;

    #[test]
    fn auth_flag_defaults_to_accepted() {
        assert!(auth_accepted(&json!({})));
        assert!(auth_accepted(&json!({"ok": true})));
        assert!(!auth_accepted(&json!({"valid": false})));
        assert!(auth_accepted(&Value::Null));
    }

    #[test]
    fn every_vault_call_carries_the_pin() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push(ScriptedReply::ok("[]"))
            .push(ScriptedReply::ok("{}"))
            .push(ScriptedReply::ok("{}"));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));

        api.vault_items("4321").unwrap();
        api.create_vault_item("4321", json!({"label": "wifi"})).unwrap();
        api.delete_vault_item("4321", "9").unwrap();

        for req in transport.requests() {
            let body: Value = serde_json::from_str(req.body_text().unwrap()).unwrap();
            assert_eq!(body["pin"], "4321", "{} lacks the pin", req.url);
        }
        assert_eq!(transport.requests()[2].url, "http://hub/vault/items/9");
    }
}
