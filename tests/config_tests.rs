//! Layered configuration: defaults, global file, env overrides.
//!
//! Everything runs in one test because it mutates process-wide env vars
//! (`HOME` and `HOMEHUB_*`).

use std::fs;
use std::path::Path;

use homehub::config;
use homehub::tabs::TabId;

const ENV_VARS: [&str; 5] = [
    "HOMEHUB_BASE_URL",
    "HOMEHUB_TIMEOUT_MS",
    "HOMEHUB_PROVIDERS",
    "HOMEHUB_DEFAULT_TAB",
    "HOMEHUB_LOG",
];

fn set_env(key: &str, value: impl AsRef<std::ffi::OsStr>) {
    unsafe { std::env::set_var(key, value) }
}

fn clear_env(key: &str) {
    unsafe { std::env::remove_var(key) }
}

fn write_global(home: &Path, content: &str) {
    let dir = home.join(".homehub");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

#[test]
fn config_layers_merge_and_env_wins() {
    let home = std::env::temp_dir().join(format!("homehub-config-{}", std::process::id()));
    let _ = fs::remove_dir_all(&home);
    fs::create_dir_all(&home).unwrap();
    let saved_home = std::env::var_os("HOME");
    set_env("HOME", &home);
    ENV_VARS.iter().for_each(|k| clear_env(k));

    // No file: pure defaults.
    let cfg = config::load();
    assert_eq!(cfg.server.base_url, "http://127.0.0.1:8000");
    assert_eq!(cfg.providers.fallback.len(), 5);

    // A partial global file only overrides what it names.
    write_global(
        &home,
        "[server]\nbase_url = \"http://hub.local:8000\"\ntimeout_ms = 1234\n\n[dashboard]\ndefault_tab = \"budget\"\n",
    );
    let cfg = config::load();
    assert_eq!(cfg.server.base_url, "http://hub.local:8000");
    assert_eq!(cfg.server.timeout_ms, 1234);
    assert_eq!(cfg.server.ping_timeout_ms, 8000);
    assert_eq!(cfg.dashboard.default_tab.parse::<TabId>().unwrap(), TabId::Budget);

    // Env vars take precedence over the file.
    set_env("HOMEHUB_BASE_URL", "http://10.0.0.2:8000/");
    set_env("HOMEHUB_PROVIDERS", "ollama, qwen");
    set_env("HOMEHUB_DEFAULT_TAB", "Vault");
    set_env("HOMEHUB_LOG", "off");
    let cfg = config::load();
    assert_eq!(cfg.server.base_url, "http://10.0.0.2:8000");
    assert_eq!(cfg.server.timeout_ms, 1234);
    assert_eq!(cfg.providers.fallback, vec!["ollama", "qwen"]);
    assert_eq!(cfg.dashboard.default_tab, "vault");
    assert!(!cfg.logging.enabled && !cfg.logging.ping_history);
    ENV_VARS.iter().for_each(|k| clear_env(k));

    // `config set` edits the global file with the key's existing type.
    config::set_config_value("dashboard.clock_tick_secs", "30").unwrap();
    assert!(config::set_config_value("dashboard.clock_tick_secs", "soon").is_err());
    let cfg = config::load();
    assert_eq!(cfg.dashboard.clock_tick_secs, 30);
    assert_eq!(cfg.server.base_url, "http://hub.local:8000");

    // A malformed file is ignored.
    write_global(&home, "[server\nbase_url = ");
    assert_eq!(config::load().server.base_url, "http://127.0.0.1:8000");

    // init refuses to clobber without force; reset always writes defaults.
    assert!(config::init_config(false).is_err());
    let path = config::reset_config().unwrap();
    assert!(path.starts_with(&home));
    assert_eq!(config::load(), homehub::config::HubConfig::default());

    match saved_home {
        Some(value) => set_env("HOME", value),
        None => clear_env("HOME"),
    }
    let _ = fs::remove_dir_all(&home);
}
