//! Assistant: provider and model pickers, threads, stored messages and the
//! streamed chat transcript.

use anyhow::{Result, bail};
use serde_json::Value;

use super::{TabContext, TabController};
use crate::api::{DEFAULT_MODEL, ModelEntry, record_id};
use crate::http::ApiError;
use crate::store::{AssistantSlice, ChatLine, Shared};
use crate::view::{Element, Node, display_value, el, empty_state, record_title};

/// Chat lines kept in the transcript.
const TRANSCRIPT_LINES: usize = 200;

impl TabController for AssistantSlice {
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        let mut providers = cx.api.providers()?;
        if providers.is_empty() {
            providers = cx.config.providers.fallback.clone();
        }
        let threads = cx.api.threads()?;
        let messages = match &self.thread {
            Some(thread) => Some(cx.api.messages(thread)?),
            None => None,
        };

        let preferred = &cx.config.providers.default_provider;
        if !providers.contains(&self.provider) {
            self.provider = if providers.contains(preferred) {
                preferred.clone()
            } else {
                providers.first().cloned().unwrap_or_default()
            };
        }
        self.providers = providers;
        self.threads = threads;
        if let Some(messages) = messages {
            self.messages = messages;
        }
        self.refresh_models(cx);
        Ok(())
    }

    fn render(&self, _shared: &Shared) -> Node {
        let provider_select = el("select").attr("name", "provider").children(
            self.providers.iter().map(|p| option(p, p, *p == self.provider)),
        );
        let model_select = el("select").attr("name", "model").children(
            self.models
                .iter()
                .map(|m| option(&m.id, &m.name, m.id == self.model)),
        );

        let threads = if self.threads.is_empty() {
            empty_state("No threads yet.")
        } else {
            el("ul").class("threads").children(self.threads.iter().map(|t| {
                let item = el("li").text(record_title(t));
                if record_id(t).as_deref() == self.thread.as_deref() {
                    item.class("active")
                } else {
                    item
                }
            }))
        };

        let messages = el("div")
            .class("messages")
            .children(self.messages.iter().map(stored_message))
            .children(self.transcript.iter().map(transcript_line));

        el("section")
            .class("assistant")
            .child(el("h2").text("Assistant"))
            .child(
                el("div")
                    .class("row")
                    .child(el("label").text("Provider ").child(provider_select))
                    .child(el("label").text("Model ").child(model_select)),
            )
            .child(el("p").class("meta").text(format!(
                "Provider: {} • Model: {}",
                display_or_dash(&self.provider),
                display_or_dash(&self.model)
            )))
            .child(el("h3").text("Threads"))
            .child(threads)
            .child(el("h3").text("Messages"))
            .child(messages)
            .into()
    }
}

impl AssistantSlice {
    /// Reload the model list for the current provider.
    ///
    /// Failures and empty lists fall back to the default model; a backend
    /// warning becomes a warning toast.
    pub fn refresh_models(&mut self, cx: &mut TabContext<'_>) {
        let models = match cx.api.models(&self.provider) {
            Ok(list) => {
                if let Some(notice) = list.notice() {
                    cx.shared.toasts.warning(notice);
                }
                list.entries()
            }
            Err(err) => {
                cx.fail("Failed to load models", &err);
                vec![ModelEntry {
                    id: DEFAULT_MODEL.to_string(),
                    name: DEFAULT_MODEL.to_string(),
                }]
            }
        };
        if !models.iter().any(|m| m.id == self.model) {
            self.model = models.first().map(|m| m.id.clone()).unwrap_or_default();
        }
        self.models = models;
    }

    pub fn select_provider(&mut self, cx: &mut TabContext<'_>, provider: &str) {
        self.provider = provider.to_string();
        self.refresh_models(cx);
    }

    pub fn select_model(&mut self, model: &str) {
        self.model = model.to_string();
    }

    pub fn open_thread(&mut self, cx: &mut TabContext<'_>, id: &str) {
        let messages = cx.api.messages(id);
        if let Some(messages) = cx.guard("Failed to load messages", messages) {
            self.thread = Some(id.to_string());
            self.messages = messages;
        }
    }

    pub fn create_thread(&mut self, cx: &mut TabContext<'_>, title: &str) {
        let created = cx.api.create_thread(title);
        if let Some(record) = cx.guard("Failed to create thread", created) {
            self.thread = record_id(&record);
            self.reload_threads(cx);
        }
    }

    pub fn rename_thread(&mut self, cx: &mut TabContext<'_>, id: &str, title: &str) {
        let renamed = cx.api.rename_thread(id, title);
        if cx.guard("Failed to rename thread", renamed).is_some() {
            self.reload_threads(cx);
        }
    }

    pub fn delete_thread(&mut self, cx: &mut TabContext<'_>, id: &str) {
        let deleted = cx.api.delete_thread(id);
        if cx.guard("Failed to delete thread", deleted).is_some() {
            if self.thread.as_deref() == Some(id) {
                self.thread = None;
                self.messages.clear();
            }
            self.reload_threads(cx);
        }
    }

    fn reload_threads(&mut self, cx: &mut TabContext<'_>) {
        let threads = cx.api.threads();
        if let Some(threads) = cx.guard("Failed to load threads", threads) {
            self.threads = threads;
        }
        if let Some(thread) = self.thread.clone() {
            let messages = cx.api.messages(&thread);
            if let Some(messages) = cx.guard("Failed to load messages", messages) {
                self.messages = messages;
            }
        }
    }

    /// Store a message in the open thread, then re-fetch its messages.
    pub fn send(&mut self, cx: &mut TabContext<'_>, message: &str) {
        let result = match &self.thread {
            Some(thread) => cx
                .api
                .send_message(thread, &self.provider, &self.model, message),
            None => Err(anyhow::anyhow!("no thread selected")),
        };
        if cx.guard("Failed to send message", result).is_some() {
            self.reload_threads(cx);
        }
    }

    /// Stream a chat reply into the transcript. `on_chunk` sees the text as
    /// it arrives.
    pub fn chat(
        &mut self,
        cx: &mut TabContext<'_>,
        message: &str,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let message = message.trim();
        if message.is_empty() {
            bail!("message is empty");
        }
        self.transcript.push(line("You", message, ""));
        self.transcript.push(line("Bot", "", ""));
        let bot = self.transcript.len() - 1;

        let transcript = &mut self.transcript;
        let result = cx.api.chat(&self.provider, &self.model, message, &mut |chunk| {
            transcript[bot].text.push_str(chunk);
            on_chunk(chunk);
        });

        let result = match result {
            Ok(full) => {
                self.transcript[bot].meta =
                    format!("Provider: {} • Model: {}", self.provider, self.model);
                Ok(full)
            }
            Err(err) => {
                self.transcript.remove(bot);
                let (title, meta) = match err.downcast_ref::<ApiError>() {
                    Some(api) if api.status.is_some() => {
                        let meta = if api.message == api.status_text {
                            String::new()
                        } else {
                            api.message.clone()
                        };
                        (format!("❌ {}", api.status_line()), meta)
                    }
                    _ => ("❌ unreachable".to_string(), format!("{err}")),
                };
                self.transcript.push(line("System", &title, &meta));
                cx.logger.event("chat", &format!("{title} {meta}"));
                Err(err)
            }
        };
        if self.transcript.len() > TRANSCRIPT_LINES {
            let excess = self.transcript.len() - TRANSCRIPT_LINES;
            self.transcript.drain(..excess);
        }
        result
    }

    /// Backend-side ping of the current provider, reported as a toast.
    pub fn ping_provider(&mut self, cx: &mut TabContext<'_>) {
        let result = cx.api.assistant_ping(&self.provider);
        if let Some(report) = cx.guard("Ping failed", result) {
            cx.shared
                .toasts
                .info(format!("{}: {}", self.provider, summarize(&report)));
        }
    }

    /// One-shot completion test against the current provider and model.
    pub fn test_provider(&mut self, cx: &mut TabContext<'_>) {
        let result = cx.api.assistant_test(&self.provider, &self.model);
        if let Some(report) = cx.guard("Provider test failed", result) {
            cx.success(format!("{} / {}: {}", self.provider, self.model, summarize(&report)));
        }
    }
}

fn line(author: &str, text: &str, meta: &str) -> ChatLine {
    ChatLine {
        author: author.to_string(),
        text: text.to_string(),
        meta: meta.to_string(),
    }
}

fn summarize(report: &Value) -> String {
    ["detail", "reply", "message", "status"]
        .iter()
        .find_map(|k| report.get(*k).filter(|v| !v.is_null()).map(display_value))
        .unwrap_or_else(|| "ok".to_string())
}

fn display_or_dash(s: &str) -> &str {
    if s.is_empty() { "—" } else { s }
}

fn option(value: &str, label: &str, selected: bool) -> Element {
    let opt = el("option").attr("value", value).text(label);
    if selected { opt.attr("selected", "") } else { opt }
}

fn stored_message(message: &Value) -> Element {
    let author = ["role", "author", "sender"]
        .iter()
        .find_map(|k| message.get(*k).and_then(Value::as_str))
        .unwrap_or("message");
    let text = ["content", "text", "message"]
        .iter()
        .find_map(|k| message.get(*k).and_then(Value::as_str))
        .unwrap_or_default();
    el("div")
        .class("message")
        .child(el("strong").text(format!("{author}:")))
        .text(format!(" {text}"))
}

fn transcript_line(chat: &ChatLine) -> Element {
    let mut node = el("div")
        .class("message")
        .child(el("strong").text(format!("{}:", chat.author)))
        .text(format!(" {}", chat.text));
    if !chat.meta.is_empty() {
        node = node.child(el("div").class("meta").text(chat.meta.clone()));
    }
    node
}
