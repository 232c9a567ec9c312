/// Configuration schema and defaults for homehub.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[server]`, `[providers]`, `[dashboard]`, `[logging]`, and `[web]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

/// Providers swept when the backend cannot report its own list.
pub const FALLBACK_PROVIDERS: [&str; 5] = ["openai", "openrouter", "qwen", "ollama", "genesis"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level homehub configuration.
///
/// Maps directly to the `~/.homehub/config.toml` and `.homehub.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Connection settings for the hub backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub base_url: String,
    /// Request timeout for ordinary calls (milliseconds).
    pub timeout_ms: u64,
    /// Request timeout for provider pings (milliseconds).
    pub ping_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 60_000,
            ping_timeout_ms: 8_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [providers]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Used for the ping sweep only when `/assistant/providers` fails or is empty.
    pub fallback: Vec<String>,
    /// Provider preselected in the assistant tab and the `chat` command.
    pub default_provider: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            fallback: FALLBACK_PROVIDERS.iter().map(|p| p.to_string()).collect(),
            default_provider: "openai".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Tab activated on startup.
    pub default_tab: String,
    /// Scope passed to `/dashboard/{scope}` by the home tab.
    pub scope: String,
    /// Interval of the home clock tick (seconds).
    pub clock_tick_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_tab: "home".to_string(),
            scope: "home".to_string(),
            clock_tick_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append events to `~/.homehub/hub.log`.
    pub enabled: bool,
    /// Append every ping to `~/.homehub/ping-log.jsonl`.
    pub ping_history: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ping_history: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address of the local preview server.
    pub addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9750".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl HubConfig {
    /// Annotated default config written by `homehub config init`.
    pub fn default_toml() -> String {
        r#"# homehub configuration
#
# Layers (later wins): built-in defaults, ~/.homehub/config.toml,
# ./.homehub.toml, HOMEHUB_* environment variables.

[server]
# REST backend the dashboard talks to.
base_url = "http://127.0.0.1:8000"
timeout_ms = 60000
ping_timeout_ms = 8000

[providers]
# Swept only when the backend cannot report its provider list.
fallback = ["openai", "openrouter", "qwen", "ollama", "genesis"]
default_provider = "openai"

[dashboard]
default_tab = "home"
scope = "home"
clock_tick_secs = 60

[logging]
enabled = true
ping_history = true

[web]
addr = "127.0.0.1:9750"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
