//! Data assets, RAG documents and RAG search.

use anyhow::Result;
use serde_json::Value;

use super::{TabContext, TabController, finish_mutation};
use crate::api::Resource;
use crate::store::{DataSlice, Shared};
use crate::view::{Element, Node, display_value, el, empty_state, record_title};

/// Results requested per RAG query.
pub const RAG_TOP_K: usize = 5;

impl TabController for DataSlice {
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        let assets = cx.api.list(Resource::DataAssets)?;
        let docs = cx.api.list(Resource::RagDocs)?;
        self.assets = assets;
        self.docs = docs;
        Ok(())
    }

    fn render(&self, _shared: &Shared) -> Node {
        let results = if self.query.is_empty() {
            el("div").class("results").hidden(true)
        } else if self.results.is_empty() {
            empty_state(&format!("No matches for \"{}\".", self.query))
        } else {
            el("ol").class("results").children(self.results.iter().map(result_item))
        };

        el("section")
            .class("data")
            .child(el("h2").text("Data"))
            .child(el("h3").text("Assets"))
            .child(records(&self.assets, "No data assets."))
            .child(el("h3").text("Documents"))
            .child(records(&self.docs, "No documents indexed."))
            .child(el("h3").text("Search"))
            .child(results)
            .into()
    }
}

impl DataSlice {
    pub fn create(&mut self, cx: &mut TabContext<'_>, resource: Resource, record: Value) {
        let result = cx.api.create(resource, record);
        finish_mutation(self, cx, resource.noun(), "create", result);
    }

    pub fn update(&mut self, cx: &mut TabContext<'_>, resource: Resource, id: &str, record: Value) {
        let result = cx.api.update(resource, id, record);
        finish_mutation(self, cx, resource.noun(), "update", result);
    }

    pub fn delete(&mut self, cx: &mut TabContext<'_>, resource: Resource, id: &str) {
        let result = cx.api.delete(resource, id);
        finish_mutation(self, cx, resource.noun(), "delete", result);
    }

    /// Run a RAG query; results replace the previous ones.
    pub fn search(&mut self, cx: &mut TabContext<'_>, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.query.clear();
            self.results.clear();
            return;
        }
        let results = cx.api.rag_query(query, RAG_TOP_K);
        if let Some(results) = cx.guard("Search failed", results) {
            self.query = query.to_string();
            self.results = results;
        }
    }
}

fn records(items: &[Value], empty: &str) -> Element {
    if items.is_empty() {
        return empty_state(empty);
    }
    el("ul").children(items.iter().map(|item| {
        let mut li = el("li").text(record_title(item));
        if let Some(kind) = item.get("kind").or_else(|| item.get("type")) {
            li = li.child(el("span").class("meta").text(format!(" [{}]", display_value(kind))));
        }
        li
    }))
}

fn result_item(hit: &Value) -> Element {
    let text = ["text", "content", "chunk"]
        .iter()
        .find_map(|k| hit.get(*k).and_then(Value::as_str))
        .unwrap_or_default();
    let mut li = el("li");
    if let Some(source) = hit.get("source").or_else(|| hit.get("doc")) {
        li = li.child(el("strong").text(display_value(source))).text(": ");
    }
    li = li.text(text.to_string());
    if let Some(score) = hit.get("score").and_then(Value::as_f64) {
        li = li.child(el("span").class("meta").text(format!(" ({score:.2})")));
    }
    li
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Api;
    use crate::config::HubConfig;
    use crate::http::transport::{ScriptedReply, ScriptedTransport};
    use crate::logging::Logger;
    use std::sync::Arc;

    #[test]
    fn search_posts_query_and_renders_hits() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(ScriptedReply::ok(
            r#"{"results":[{"source":"manual.pdf","text":"Reset the boiler","score":0.913}]}"#,
        ));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));
        let (config, logger, mut shared) = (HubConfig::default(), Logger::disabled(), Shared::default());
        let mut tab = DataSlice::default();
        let mut cx = TabContext {
            api: &api,
            config: &config,
            logger: &logger,
            shared: &mut shared,
        };

        tab.search(&mut cx, " boiler ");

        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://hub/rag/query");
        let body: Value = serde_json::from_str(sent.body_text().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"query": "boiler", "k": 5}));
        let text = tab.render(&shared).render_text();
        assert!(text.contains("manual.pdf: Reset the boiler (0.91)"), "{text}");
    }

    #[test]
    fn deleting_a_document_refetches_both_lists() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push(ScriptedReply::ok(""))
            .push(ScriptedReply::ok(r#"[{"id":1,"name":"inventory.csv","kind":"csv"}]"#))
            .push(ScriptedReply::ok("[]"));
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));
        let (config, logger, mut shared) = (HubConfig::default(), Logger::disabled(), Shared::default());
        let mut tab = DataSlice {
            docs: vec![serde_json::json!({"id": 4})],
            ..DataSlice::default()
        };
        let mut cx = TabContext {
            api: &api,
            config: &config,
            logger: &logger,
            shared: &mut shared,
        };

        tab.delete(&mut cx, Resource::RagDocs, "4");

        let urls: Vec<String> = transport.requests().iter().map(|r| r.url.clone()).collect();
        assert_eq!(
            urls,
            vec!["http://hub/rag/docs/4", "http://hub/data/assets", "http://hub/rag/docs"]
        );
        assert!(tab.docs.is_empty());
        assert_eq!(shared.toasts.last().unwrap().message, "Document deleted");
        assert!(tab.render(&shared).render_text().contains("inventory.csv [csv]"));
    }
}
