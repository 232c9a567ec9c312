//! PIN-gated vault.
//!
//! Unlocking is presentation-layer gating only: the PIN accepted by
//! `/vault/auth` is kept in memory for the session and sent with every
//! later vault call, and the backend re-validates it each time.

use anyhow::Result;
use serde_json::Value;

use super::{TabContext, TabController};
use crate::store::{Shared, VaultSlice};
use crate::view::{Node, display_value, el, empty_state, record_title};

impl TabController for VaultSlice {
    /// Locked: nothing to fetch. Unlocked: the item list.
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()> {
        if let Some(pin) = self.pin.clone() {
            self.items = cx.api.vault_items(&pin)?;
        }
        Ok(())
    }

    fn render(&self, _shared: &Shared) -> Node {
        let gate = el("form")
            .id("vault-gate")
            .attr("method", "post")
            .attr("action", "/vault/unlock")
            .hidden(self.unlocked)
            .child(el("label").text("PIN"))
            .child(el("input").attr("type", "password").attr("name", "pin"))
            .child(el("button").attr("type", "submit").text("Unlock"));

        let items = if self.items.is_empty() {
            empty_state("The vault is empty.")
        } else {
            el("ul").id("vault-items").children(self.items.iter().map(|item| {
                let mut li = el("li").child(el("strong").text(record_title(item)));
                if let Some(kind) = item.get("kind").or_else(|| item.get("type")) {
                    li = li.child(el("span").class("meta").text(format!(" [{}]", display_value(kind))));
                }
                li
            }))
        };

        let secure = el("section")
            .id("vault-secure")
            .hidden(!self.unlocked)
            .child(el("p").class("meta").text("Unlocked for this session."))
            .child(items);

        el("section")
            .class("vault")
            .child(el("h2").text("Vault"))
            .child(gate)
            .child(secure)
            .into()
    }
}

impl VaultSlice {
    /// Submit a PIN. Returns whether the vault is now unlocked.
    pub fn unlock(&mut self, cx: &mut TabContext<'_>, pin: &str) -> bool {
        let accepted = cx.api.vault_auth(pin);
        match cx.guard("Vault unlock failed", accepted) {
            Some(true) => {}
            Some(false) => {
                cx.shared.toasts.danger("Invalid PIN");
                return false;
            }
            None => return false,
        }

        self.pin = Some(pin.to_string());
        self.unlocked = true;
        self.items.clear();
        cx.logger.event("vault", "unlocked");
        cx.success("Vault unlocked");

        let items = cx.api.vault_items(pin);
        if let Some(items) = cx.guard("Failed to load vault items", items) {
            self.items = items;
        }
        true
    }

    /// Forget the PIN and hide the secure section.
    pub fn lock(&mut self) {
        self.pin = None;
        self.unlocked = false;
        self.items.clear();
    }

    pub fn create(&mut self, cx: &mut TabContext<'_>, item: Value) {
        let Some(pin) = self.require_pin(cx) else {
            return;
        };
        let result = cx.api.create_vault_item(&pin, item);
        self.finish(cx, &pin, "Failed to save vault item", "Vault item saved", result);
    }

    pub fn delete(&mut self, cx: &mut TabContext<'_>, id: &str) {
        let Some(pin) = self.require_pin(cx) else {
            return;
        };
        let result = cx.api.delete_vault_item(&pin, id);
        self.finish(cx, &pin, "Failed to delete vault item", "Vault item deleted", result);
    }

    fn require_pin(&self, cx: &mut TabContext<'_>) -> Option<String> {
        if self.pin.is_none() {
            cx.shared.toasts.warning("Unlock the vault first");
        }
        self.pin.clone()
    }

    fn finish(
        &mut self,
        cx: &mut TabContext<'_>,
        pin: &str,
        failure: &str,
        success: &str,
        result: Result<Value>,
    ) {
        if cx.guard(failure, result).is_none() {
            return;
        }
        cx.success(success);
        let items = cx.api.vault_items(pin);
        if let Some(items) = cx.guard("Failed to reload", items) {
            self.items = items;
        }
    }
}
