/// Configuration system for homehub.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::HubConfig::default()`]
/// 2. **User global config**: `~/.homehub/config.toml`
/// 3. **Project local config**: `.homehub.toml` in the current working directory
/// 4. **Environment variables**: `HOMEHUB_*` overrides (highest precedence)
///
/// Layers are merged key by key: a file that only sets `server.base_url`
/// leaves every other value from the previous layer untouched.
///
/// # Usage
///
/// ```rust,ignore
/// use homehub::config;
///
/// let cfg = config::load();
/// let api = homehub::api::Api::from_config(&cfg);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::HubConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved homehub configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> HubConfig {
    let mut merged = match toml::Value::try_from(HubConfig::default()) {
        Ok(value) => value,
        Err(_) => return HubConfig::default(),
    };

    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = load_toml_value(path) {
            merge_values(&mut merged, layer);
        }
    }

    let mut config: HubConfig = merged.try_into().unwrap_or_default();
    apply_env_overrides(&mut config);
    config
}

/// Read a TOML file as an untyped value tree.
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken config file never stops the dashboard.
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Recursively overlay `overlay` onto `base`. Tables merge, scalars and
/// arrays replace.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding the global config and the logs: `~/.homehub/`.
pub fn hub_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".homehub"))
}

/// Path to the user global config: `~/.homehub/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    hub_dir().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config: `.homehub.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".homehub.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `HOMEHUB_BASE_URL`: backend base URL
/// - `HOMEHUB_TIMEOUT_MS`: request timeout
/// - `HOMEHUB_PROVIDERS`: comma-separated fallback provider list
/// - `HOMEHUB_DEFAULT_TAB`: tab activated on startup
/// - `HOMEHUB_LOG`: event and ping logging (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut HubConfig) {
    if let Ok(val) = std::env::var("HOMEHUB_BASE_URL")
        && !val.is_empty()
    {
        config.server.base_url = val.trim_end_matches('/').to_string();
    }
    if let Ok(val) = std::env::var("HOMEHUB_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("HOMEHUB_PROVIDERS") {
        let providers = parse_list(&val);
        if !providers.is_empty() {
            config.providers.fallback = providers;
        }
    }
    if let Ok(val) = std::env::var("HOMEHUB_DEFAULT_TAB")
        && !val.is_empty()
    {
        config.dashboard.default_tab = val.to_ascii_lowercase();
    }
    if let Ok(val) = std::env::var("HOMEHUB_LOG") {
        let on = is_truthy(&val);
        config.logging.enabled = on;
        config.logging.ping_history = on;
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.homehub/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.homehub/ directory")?;
    }

    fs::write(&path, HubConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `server.base_url`. The value's type is taken
/// from the key's current value. The file is rewritten with every key.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    // Keys the file omits still exist in the defaults, so start from those.
    let mut root =
        toml::Value::try_from(HubConfig::default()).context("failed to serialize default config")?;
    if path.exists() {
        let source = fs::read_to_string(&path).context("failed to read config file")?;
        let file: toml::Value =
            toml::from_str(&source).context("failed to parse config as TOML value")?;
        merge_values(&mut root, file);
    }
    set_toml_value(&mut root, key, value)?;

    // Reject edits that no longer deserialize into the schema.
    let _: HubConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("'{value}' is not a valid value for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table above '{leaf}' in '{key}'"))?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Array(_)) => toml::Value::Array(
            parse_list(raw_value)
                .into_iter()
                .map(toml::Value::String)
                .collect(),
        ),
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "On"] {
            assert!(is_truthy(yes), "{yes} should be truthy");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no} should be falsy");
        }
    }

    #[test]
    fn parse_list_trims_and_drops_blanks() {
        assert_eq!(parse_list(" ollama, ,openai "), vec!["ollama", "openai"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn merge_values_only_overrides_present_keys() {
        let mut base = toml::Value::try_from(HubConfig::default()).unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[server]
timeout_ms = 1500
"#,
        )
        .unwrap();
        merge_values(&mut base, overlay);

        let merged: HubConfig = base.try_into().unwrap();
        assert_eq!(merged.server.timeout_ms, 1500);
        assert_eq!(merged.server.base_url, "http://127.0.0.1:8000");
        assert_eq!(merged.web.addr, "127.0.0.1:9750");
    }

    #[test]
    fn set_toml_value_infers_types() {
        let mut root = toml::Value::try_from(HubConfig::default()).unwrap();
        set_toml_value(&mut root, "server.timeout_ms", "2500").unwrap();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();
        set_toml_value(&mut root, "providers.fallback", "ollama, qwen").unwrap();
        set_toml_value(&mut root, "server.base_url", "http://hub.lan").unwrap();

        let cfg: HubConfig = root.try_into().unwrap();
        assert_eq!(cfg.server.timeout_ms, 2500);
        assert!(!cfg.logging.enabled);
        assert_eq!(cfg.providers.fallback, vec!["ollama", "qwen"]);
        assert_eq!(cfg.server.base_url, "http://hub.lan");
    }

    #[test]
    fn set_toml_value_rejects_unknown_and_bad_values() {
        let mut root = toml::Value::try_from(HubConfig::default()).unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "x").is_err());
        assert!(set_toml_value(&mut root, "server.nope", "x").is_err());
        assert!(set_toml_value(&mut root, "server.timeout_ms", "soon").is_err());
        assert!(set_toml_value(&mut root, "", "x").is_err());
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: HubConfig = toml::from_str(&toml_str).unwrap();
    }
}
