//! Developer and admin tooling: status, backups, toggles, settings,
//! backend storage config and the storage probe.

use anyhow::Result;
use serde_json::Value;

use super::home::{post_button, summary_table};
use super::{TabContext, TabController, finish_mutation};
use crate::api::BackendConfig;
use crate::store::{DevSlice, Shared};
use crate::view::{Element, Node, display_value, el, empty_state, table};

impl TabController for DevSlice {
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        let status = cx.api.dev_status()?;
        let toggles = cx.api.dev_toggles()?;
        let settings = cx.api.settings()?;
        let backend = cx.api.backend_config()?;
        let export = cx.api.export_config()?;
        self.status = status;
        self.toggles = toggles;
        self.settings = settings;
        self.backend = Some(backend);
        self.export = export;
        Ok(())
    }

    fn render(&self, _shared: &Shared) -> Node {
        let last = match &self.last_result {
            Some(line) => el("p").id("dev-result").text(line.clone()),
            None => el("p").id("dev-result").hidden(true),
        };

        el("section")
            .class("dev")
            .child(el("h2").text("Dev"))
            .child(last)
            .child(el("h3").text("Status"))
            .child(summary_table(&self.status))
            .child(
                el("div")
                    .class("row")
                    .child(post_button("/dev/backup", "Backup"))
                    .child(post_button("/dev/ping", "Ping backend")),
            )
            .child(el("h3").text("Toggles"))
            .child(toggles(&self.toggles))
            .child(el("h3").text("Settings"))
            .child(summary_table(&self.settings))
            .child(el("h3").text("Storage"))
            .child(backend(self.backend.as_ref()))
            .child(el("h3").text("Connection Export"))
            .child(summary_table(&self.export))
            .into()
    }
}

impl DevSlice {
    pub fn backup(&mut self, cx: &mut TabContext<'_>) {
        let result = cx.api.dev_backup();
        if let Some(reply) = finish_mutation(self, cx, "backup", "create", result) {
            self.last_result = reply_path(&reply).map(|p| format!("Backup written to: {p}"));
        }
    }

    pub fn restore(&mut self, cx: &mut TabContext<'_>, backup: &str) {
        let result = cx.api.dev_restore(backup);
        if finish_mutation(self, cx, "backup", "restore", result).is_some() {
            self.last_result = Some(format!("Restored: {backup}"));
        }
    }

    pub fn set_toggle(&mut self, cx: &mut TabContext<'_>, name: &str, enabled: bool) {
        let result = cx.api.set_dev_toggle(name, enabled);
        finish_mutation(self, cx, "toggle", "update", result);
    }

    pub fn save_settings(&mut self, cx: &mut TabContext<'_>, settings: Value) {
        let result = cx.api.save_settings(settings);
        finish_mutation(self, cx, "settings", "save", result);
    }

    pub fn save_backend_config(&mut self, cx: &mut TabContext<'_>, config: &BackendConfig) {
        let result = cx.api.save_backend_config(config);
        finish_mutation(self, cx, "config", "save", result);
    }

    /// Round trip to `/dev/ping`; the reply is shown as the last result.
    pub fn ping(&mut self, cx: &mut TabContext<'_>) {
        let reply = cx.api.dev_ping();
        if let Some(reply) = cx.guard("Dev ping failed", reply) {
            let line = format!("Dev ping: {}", display_value(&reply));
            cx.shared.toasts.info(line.clone());
            self.last_result = Some(line);
        }
    }

    /// Ask the backend to write a probe file under `path`.
    pub fn storage_test(&mut self, cx: &mut TabContext<'_>, path: &str) {
        let result = cx.api.storage_test(path);
        if let Some(result) = cx.guard("Storage test failed", result) {
            let line = format!("Saved test file to: {}", result.wrote);
            cx.success(line.clone());
            self.last_result = Some(line);
        }
    }
}

fn reply_path(reply: &Value) -> Option<String> {
    ["path", "file", "backup"]
        .iter()
        .find_map(|k| reply.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn toggles(value: &Value) -> Element {
    let Some(map) = value.as_object().filter(|m| !m.is_empty()) else {
        return empty_state("No toggles.");
    };
    el("ul").class("toggles").children(map.iter().map(|(name, state)| {
        let on = state
            .as_bool()
            .or_else(|| state.get("enabled").and_then(Value::as_bool))
            .unwrap_or(false);
        el("li")
            .text(format!("{name}: "))
            .child(el("span").class(if on { "pill ok" } else { "pill" }).text(if on { "on" } else { "off" }))
    }))
}

fn backend(config: Option<&BackendConfig>) -> Element {
    let Some(cfg) = config else {
        return empty_state("Backend config not loaded.");
    };
    let or_dash = |s: &str| if s.is_empty() { "—".to_string() } else { s.to_string() };
    table(
        &["Setting", "Value"],
        vec![
            vec!["Local storage".to_string(), or_dash(&cfg.local_storage_path)],
            vec!["Tailscale router".to_string(), or_dash(&cfg.tailscale_router)],
            vec!["Cloud sync".to_string(), or_dash(&cfg.cloud_sync.provider)],
            vec!["Cloud URL".to_string(), or_dash(&cfg.cloud_sync.base_url)],
        ],
    )
}
