//! Tab controllers and the lazy-load router.
//!
//! Each tab is a two-state machine: *unloaded* until its first activation,
//! *loaded* afterwards. [`Dashboard::activate`] performs that transition
//! exactly once per tab and calls [`TabController::load`]; later activations
//! only switch which tab is shown. A failed first load still counts as the
//! transition: the failure becomes a danger toast and the tab stays empty
//! until [`Dashboard::refresh`].
//!
//! Mutations inside a tab call the façade and then re-fetch that tab's
//! lists in full. Errors never escape a controller; they become toasts.

pub mod assistant;
pub mod budget;
pub mod data;
pub mod dev;
pub mod home;
pub mod projects;
pub mod sensors;
pub mod vault;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::Api;
use crate::config::HubConfig;
use crate::logging::Logger;
use crate::store::{LoadState, Shared, Slices, Store};
use crate::view::{Node, el};

// ---------------------------------------------------------------------------
// Tab ids
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabId {
    #[default]
    Home,
    Assistant,
    Projects,
    Budget,
    Data,
    Sensors,
    Vault,
    Dev,
}

impl TabId {
    pub const ALL: [TabId; 8] = [
        TabId::Home,
        TabId::Assistant,
        TabId::Projects,
        TabId::Budget,
        TabId::Data,
        TabId::Sensors,
        TabId::Vault,
        TabId::Dev,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Assistant => "assistant",
            Self::Projects => "projects",
            Self::Budget => "budget",
            Self::Data => "data",
            Self::Sensors => "sensors",
            Self::Vault => "vault",
            Self::Dev => "dev",
        }
    }

    /// Navigation label.
    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Assistant => "Assistant",
            Self::Projects => "Projects",
            Self::Budget => "Budget & KPI",
            Self::Data => "Data",
            Self::Sensors => "Sensors",
            Self::Vault => "Vault",
            Self::Dev => "Dev",
        }
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TabId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        match TabId::ALL.iter().find(|t| t.as_str() == wanted) {
            Some(tab) => Ok(*tab),
            None => bail!(
                "unknown tab '{s}' (expected one of: {})",
                TabId::ALL.map(TabId::as_str).join(", ")
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller seam
// ---------------------------------------------------------------------------

/// What a controller may use while loading or mutating.
pub struct TabContext<'a> {
    pub api: &'a Api,
    pub config: &'a HubConfig,
    pub logger: &'a Logger,
    pub shared: &'a mut Shared,
}

impl TabContext<'_> {
    /// Turn a failed call into a danger toast; pass successes through.
    pub fn guard<T>(&mut self, action: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.fail(action, &err);
                None
            }
        }
    }

    pub fn fail(&mut self, action: &str, err: &anyhow::Error) {
        let message = format!("{action}: {err}");
        self.logger.event("tab", &message);
        self.shared.toasts.danger(message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.shared.toasts.success(message);
    }
}

/// Finish a create/update/delete: toast the outcome and, on success,
/// re-fetch the whole tab. Returns the mutation's response.
pub fn finish_mutation<T>(
    tab: &mut dyn TabController,
    cx: &mut TabContext<'_>,
    noun: &str,
    verb: &str,
    result: Result<T>,
) -> Option<T> {
    let value = cx.guard(&format!("Failed to {verb} {noun}"), result)?;
    cx.success(format!("{} {}", capitalize(noun), past_tense(verb)));
    if let Err(err) = tab.load(cx) {
        cx.fail("Failed to reload", &err);
    }
    Some(value)
}

fn past_tense(verb: &str) -> String {
    if verb.ends_with('e') {
        format!("{verb}d")
    } else {
        format!("{verb}ed")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One dashboard tab.
pub trait TabController {
    /// Fetch everything the tab shows, replacing what it held.
    fn load(&mut self, cx: &mut TabContext<'_>) -> Result<()>;

    /// Render the tab's panel from its data.
    fn render(&self, shared: &Shared) -> Node;
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// The whole client: façade, settings, logger and the store.
pub struct Dashboard {
    api: Api,
    config: HubConfig,
    logger: Logger,
    store: Store,
}

impl Dashboard {
    /// Dashboard with nothing loaded; the configured default tab is active.
    pub fn new(api: Api, config: HubConfig, logger: Logger) -> Self {
        let active = config.dashboard.default_tab.parse().unwrap_or_default();
        Self {
            api,
            config,
            logger,
            store: Store::new(active),
        }
    }

    /// Page load: activate the default tab.
    pub fn start(&mut self) {
        self.activate(self.store.active);
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn active(&self) -> TabId {
        self.store.active
    }

    /// Show `tab`, loading it if this is its first activation.
    ///
    /// Returns whether a load ran.
    pub fn activate(&mut self, tab: TabId) -> bool {
        self.store.active = tab;
        if self.store.is_loaded(tab) {
            return false;
        }
        self.store.load.insert(tab, LoadState::Loaded);
        self.run_load(tab);
        true
    }

    /// Re-fetch `tab` regardless of its load state.
    pub fn refresh(&mut self, tab: TabId) {
        self.store.load.insert(tab, LoadState::Loaded);
        self.run_load(tab);
    }

    fn run_load(&mut self, tab: TabId) {
        self.logger.event("tab", &format!("load {tab}"));
        let (slices, mut cx) = self.split();
        if let Err(err) = slices.controller_mut(tab).load(&mut cx) {
            cx.fail(&format!("Failed to load {}", tab.title()), &err);
        }
    }

    fn split(&mut self) -> (&mut Slices, TabContext<'_>) {
        let Store { tabs, shared, .. } = &mut self.store;
        (
            tabs,
            TabContext {
                api: &self.api,
                config: &self.config,
                logger: &self.logger,
                shared,
            },
        )
    }

    /// Run a tab action with access to every slice and a context.
    pub fn act<R>(&mut self, action: impl FnOnce(&mut Slices, &mut TabContext<'_>) -> R) -> R {
        let (slices, mut cx) = self.split();
        action(slices, &mut cx)
    }

    /// Advance time-driven state (the home clock).
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let every = self.config.dashboard.clock_tick_secs;
        self.store.tabs.home.tick(now, every)
    }

    pub fn render_tab(&self, tab: TabId) -> Node {
        self.store
            .tabs
            .controller(tab)
            .render(&self.store.shared)
    }

    /// Full page body: navigation, every tab panel (inactive ones hidden)
    /// and the toast stack.
    pub fn render(&self) -> Node {
        let nav = el("nav").class("tabs").children(TabId::ALL.iter().map(|t| {
            let link = el("a")
                .attr("href", &format!("/tab/{t}"))
                .class("tab-link")
                .text(t.title());
            if *t == self.store.active {
                link.class("active")
            } else {
                link
            }
        }));

        let panels = TabId::ALL.iter().map(|t| {
            el("div")
                .class("tab-panel")
                .id(&format!("tab-{t}"))
                .hidden(*t != self.store.active)
                .child(self.render_tab(*t))
        });

        let toasts = el("div")
            .class("toasts")
            .children(self.store.shared.toasts.iter().map(|t| t.node()));

        el("main")
            .class("hub")
            .child(nav)
            .children(panels)
            .child(toasts)
            .into()
    }

    /// Take the queued toasts (the CLI prints them once).
    pub fn drain_toasts(&mut self) -> Vec<crate::view::Toast> {
        self.store.shared.toasts.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::transport::{ScriptedReply, ScriptedTransport};
    use crate::view::ToastLevel;
    use std::sync::Arc;

    fn dashboard(transport: &Arc<ScriptedTransport>) -> Dashboard {
        let api = Api::with_transport("http://hub", Box::new(transport.clone()));
        Dashboard::new(api, HubConfig::default(), Logger::disabled())
    }

    #[test]
    fn tab_ids_parse_and_display() {
        assert_eq!("Vault".parse::<TabId>().unwrap(), TabId::Vault);
        assert_eq!(TabId::Budget.to_string(), "budget");
        let err = "kitchen".parse::<TabId>().unwrap_err().to_string();
        assert!(err.contains("home, assistant"));
    }

    #[test]
    fn first_activation_loads_once() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_for("/sensors", ScriptedReply::ok(r#"[{"id":"t1","name":"Attic"}]"#));
        let mut dash = dashboard(&transport);

        assert!(dash.activate(TabId::Sensors));
        assert!(!dash.activate(TabId::Sensors));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(dash.store().tabs.sensors.sensors.len(), 1);
        assert_eq!(dash.active(), TabId::Sensors);
    }

    #[test]
    fn failed_load_is_toasted_and_not_retried_until_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(ScriptedReply::status(500, "Internal Server Error", "oops"));
        let mut dash = dashboard(&transport);

        assert!(dash.activate(TabId::Sensors));
        assert!(dash.store().is_loaded(TabId::Sensors));
        let toast = dash.store().shared.toasts.last().unwrap();
        assert_eq!(toast.level, ToastLevel::Danger);
        assert_eq!(toast.message, "Failed to load Sensors: Internal Server Error");

        assert!(!dash.activate(TabId::Sensors));
        assert_eq!(transport.requests().len(), 1);

        transport.push(ScriptedReply::ok("[]"));
        dash.refresh(TabId::Sensors);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn render_hides_inactive_panels() {
        let transport = Arc::new(ScriptedTransport::new());
        let dash = dashboard(&transport);
        let page = dash.render();
        let vault = page.find_id("tab-vault").unwrap();
        assert!(vault.is_hidden());
        assert!(!page.find_id("tab-home").unwrap().is_hidden());
        assert_eq!(page.find_class("tab-link").len(), TabId::ALL.len());
    }
}
