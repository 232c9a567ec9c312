//! Explicit client store.
//!
//! The dashboard owns exactly one [`Store`] and hands it to controllers;
//! nothing is global. Everything fetched from the backend is a cache that
//! a tab replaces wholesale on its next load. The only client-local state
//! is the active tab, the session vault PIN and the latency series.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::api::{BackendConfig, ModelEntry, Uptime};
use crate::ping::{LatencySeries, PingOutcome};
use crate::tabs::{TabController, TabId};
use crate::view::Toasts;

/// Lazy-load state of one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Unloaded,
    Loaded,
}

/// State every controller may touch: toasts and the latency series.
#[derive(Debug, Default)]
pub struct Shared {
    pub toasts: Toasts,
    pub series: LatencySeries,
}

#[derive(Debug, Default)]
pub struct Store {
    pub active: TabId,
    pub load: BTreeMap<TabId, LoadState>,
    pub shared: Shared,
    pub tabs: Slices,
}

impl Store {
    pub fn new(active: TabId) -> Self {
        Self {
            active,
            load: TabId::ALL.iter().map(|t| (*t, LoadState::Unloaded)).collect(),
            shared: Shared::default(),
            tabs: Slices::default(),
        }
    }

    pub fn load_state(&self, tab: TabId) -> LoadState {
        self.load.get(&tab).copied().unwrap_or(LoadState::Unloaded)
    }

    pub fn is_loaded(&self, tab: TabId) -> bool {
        self.load_state(tab) == LoadState::Loaded
    }

    /// PIN accepted by `/vault/auth` this session.
    pub fn vault_pin(&self) -> Option<&str> {
        self.tabs.vault.pin.as_deref()
    }

    /// JSON snapshot for the preview server's `/api/state`.
    pub fn snapshot(&self) -> Value {
        json!({
            "active": self.active,
            "load": self.load,
            "vault_unlocked": self.tabs.vault.unlocked,
            "series": self.shared.series.values(),
            "toasts": self.shared.toasts.iter().collect::<Vec<_>>(),
        })
    }
}

/// One data slice per tab.
#[derive(Debug, Default)]
pub struct Slices {
    pub home: HomeSlice,
    pub assistant: AssistantSlice,
    pub projects: ProjectsSlice,
    pub budget: BudgetSlice,
    pub data: DataSlice,
    pub sensors: SensorsSlice,
    pub vault: VaultSlice,
    pub dev: DevSlice,
}

impl Slices {
    pub fn controller(&self, tab: TabId) -> &dyn TabController {
        match tab {
            TabId::Home => &self.home,
            TabId::Assistant => &self.assistant,
            TabId::Projects => &self.projects,
            TabId::Budget => &self.budget,
            TabId::Data => &self.data,
            TabId::Sensors => &self.sensors,
            TabId::Vault => &self.vault,
            TabId::Dev => &self.dev,
        }
    }

    pub fn controller_mut(&mut self, tab: TabId) -> &mut dyn TabController {
        match tab {
            TabId::Home => &mut self.home,
            TabId::Assistant => &mut self.assistant,
            TabId::Projects => &mut self.projects,
            TabId::Budget => &mut self.budget,
            TabId::Data => &mut self.data,
            TabId::Sensors => &mut self.sensors,
            TabId::Vault => &mut self.vault,
            TabId::Dev => &mut self.dev,
        }
    }
}

// ---------------------------------------------------------------------------
// Slices
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct HomeSlice {
    pub dashboard: Value,
    pub env: Value,
    pub providers: Vec<String>,
    pub uptime: Option<Uptime>,
    /// When `uptime` was fetched; the clock advances from here.
    pub uptime_at: Option<DateTime<Utc>>,
    /// Time shown by the clock, updated by ticks.
    pub clock: Option<DateTime<Utc>>,
    /// Latest ping lines, newest last.
    pub pings: Vec<PingOutcome>,
}

/// One transcript line of the assistant chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatLine {
    pub author: String,
    pub text: String,
    pub meta: String,
}

#[derive(Debug, Default)]
pub struct AssistantSlice {
    pub providers: Vec<String>,
    pub provider: String,
    pub models: Vec<ModelEntry>,
    pub model: String,
    pub threads: Vec<Value>,
    pub thread: Option<String>,
    pub messages: Vec<Value>,
    pub transcript: Vec<ChatLine>,
}

#[derive(Debug, Default)]
pub struct ProjectsSlice {
    pub projects: Vec<Value>,
    pub tasks: Vec<Value>,
    pub notes: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct BudgetSlice {
    pub bills: Vec<Value>,
    pub summary: Value,
    pub kpi_datasets: Vec<Value>,
    /// Ledger of the selected bill.
    pub ledger: Option<(String, Vec<Value>)>,
}

#[derive(Debug, Default)]
pub struct DataSlice {
    pub assets: Vec<Value>,
    pub docs: Vec<Value>,
    pub query: String,
    pub results: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct SensorsSlice {
    pub sensors: Vec<Value>,
    pub selected: Option<String>,
    pub readings: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct VaultSlice {
    pub unlocked: bool,
    pub pin: Option<String>,
    pub items: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct DevSlice {
    pub status: Value,
    pub toggles: Value,
    pub settings: Value,
    pub backend: Option<BackendConfig>,
    pub export: Value,
    /// Outcome line of the last dev action.
    pub last_result: Option<String>,
}
