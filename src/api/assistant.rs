//! Assistant endpoints: providers, threads, messages, chat, models and
//! provider health.

use anyhow::Result;
use serde_json::{Value, json};

use super::{Api, ModelList, into_items, segment};
use crate::http::{RequestOptions, Response};

impl Api {
    /// `GET /assistant/providers`: provider ids the backend has configured.
    pub fn providers(&self) -> Result<Vec<String>> {
        let value = self.http.value("/assistant/providers", RequestOptions::get())?;
        Ok(provider_names(value))
    }

    /// `GET /assistant/threads`.
    pub fn threads(&self) -> Result<Vec<Value>> {
        let value = self.http.value("/assistant/threads", RequestOptions::get())?;
        Ok(into_items(value))
    }

    /// `POST /assistant/threads`.
    pub fn create_thread(&self, title: &str) -> Result<Value> {
        self.http.value(
            "/assistant/threads",
            RequestOptions::post(json!({ "title": title })),
        )
    }

    /// `PUT /assistant/threads/{id}`.
    pub fn rename_thread(&self, id: &str, title: &str) -> Result<Value> {
        self.http.value(
            &format!("/assistant/threads/{}", segment(id)),
            RequestOptions::put(json!({ "title": title })),
        )
    }

    /// `DELETE /assistant/threads/{id}`.
    pub fn delete_thread(&self, id: &str) -> Result<Value> {
        self.http.value(
            &format!("/assistant/threads/{}", segment(id)),
            RequestOptions::delete(),
        )
    }

    /// `GET /assistant/threads/{id}/messages`.
    pub fn messages(&self, thread_id: &str) -> Result<Vec<Value>> {
        let value = self.http.value(
            &format!("/assistant/threads/{}/messages", segment(thread_id)),
            RequestOptions::get(),
        )?;
        Ok(into_items(value))
    }

    /// `POST /assistant/send`: store a user message and get the reply.
    pub fn send_message(
        &self,
        thread_id: &str,
        provider: &str,
        model: &str,
        message: &str,
    ) -> Result<Value> {
        self.http.value(
            "/assistant/send",
            RequestOptions::post(json!({
                "thread_id": thread_id,
                "provider": provider,
                "model": model,
                "message": message,
            })),
        )
    }

    /// `POST /assistant/ping`: backend-side provider check.
    pub fn assistant_ping(&self, provider: &str) -> Result<Value> {
        self.http.value(
            "/assistant/ping",
            RequestOptions::post(json!({ "provider": provider })).timeout(self.ping_timeout),
        )
    }

    /// `GET /assistant/ping-all`.
    pub fn assistant_ping_all(&self) -> Result<Vec<Value>> {
        let value = self.http.value(
            "/assistant/ping-all",
            RequestOptions::get().timeout(self.ping_timeout * 5),
        )?;
        Ok(into_items(value))
    }

    /// `POST /assistant/test`: one-shot completion against a provider/model.
    pub fn assistant_test(&self, provider: &str, model: &str) -> Result<Value> {
        self.http.value(
            "/assistant/test",
            RequestOptions::post(json!({ "provider": provider, "model": model })),
        )
    }

    /// `GET /models/{provider}`.
    pub fn models(&self, provider: &str) -> Result<ModelList> {
        self.http.json(
            &format!("/models/{}", segment(provider)),
            RequestOptions::get(),
        )
    }

    /// `GET /ping/{provider}`: the request the latency sampler times.
    ///
    /// Any 2xx counts as reachable whatever the body holds.
    pub fn ping_provider(&self, provider: &str) -> Result<Response> {
        self.http.send(
            &format!("/ping/{}", segment(provider)),
            RequestOptions::get().timeout(self.ping_timeout),
        )
    }

    /// `POST /chat`: streams the reply text into `on_chunk`.
    pub fn chat(
        &self,
        provider: &str,
        model: &str,
        message: &str,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String> {
        self.http.stream(
            "/chat",
            RequestOptions::post(json!({
                "provider": provider,
                "model": model,
                "message": message,
            })),
            on_chunk,
        )
    }
}

/// Provider ids from either a bare list or `{providers: [...]}`, where each
/// item is an id string or an object with `id`/`name`.
pub fn provider_names(value: Value) -> Vec<String> {
    let items = match value {
        Value::Object(mut map) => match map.remove("providers") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(named)) => named.keys().map(|k| Value::String(k.clone())).collect(),
            _ => into_items(Value::Object(map)),
        },
        other => into_items(other),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Object(obj) => ["id", "name"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::{ScriptedReply, ScriptedTransport};
    use std::sync::Arc;

    #[test]
    fn provider_names_accepts_several_shapes() {
        assert_eq!(provider_names(json!(["ollama", "openai"])), vec!["ollama", "openai"]);
        assert_eq!(
            provider_names(json!({"providers": [{"id": "qwen"}, {"name": "local"}, ""]})),
            vec!["qwen", "local"]
        );
        assert_eq!(
            provider_names(json!({"providers": {"genesis": {}, "ollama": {}}})),
            vec!["genesis", "ollama"]
        );
        assert!(provider_names(json!(null)).is_empty());
    }

    #[test]
    fn chat_streams_chunks_and_posts_json() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(ScriptedReply::ok("Hello there"));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));

        let mut chunks = Vec::new();
        let full = api
            .chat("ollama", "llama3", "hi", &mut |c| chunks.push(c.to_string()))
            .unwrap();
        assert_eq!(full, "Hello there");
        assert_eq!(chunks.concat(), "Hello there");

        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://hub/chat");
        let body: Value = serde_json::from_str(sent.body_text().unwrap()).unwrap();
        assert_eq!(body["provider"], "ollama");
        assert_eq!(body["message"], "hi");
    }

    #[test]
    fn chat_error_uses_error_field() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(ScriptedReply::status(
            400,
            "Bad Request",
            r#"{"error":"empty message"}"#,
        ));
        let api = Api::with_transport("http://hub", Box::new(transport));

        let err = api.chat("openai", "", "", &mut |_| {}).unwrap_err();
        assert_eq!(err.to_string(), "empty message");
    }
}
