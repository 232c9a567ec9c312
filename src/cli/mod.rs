//! CLI command implementations for homehub.
//!
//! Provides subcommand handlers for:
//! - `homehub tab <id>`: load a tab and print its panel
//! - `homehub ping [provider]` / `ping-all`: timed provider pings
//! - `homehub pings`: ping history summary
//! - `homehub chat`: stream a chat reply to stdout
//! - `homehub models <provider>`: list a provider's models
//! - `homehub vault <pin>`: unlock the vault and list its items
//! - `homehub health` / `wait`: backend reachability
//! - `homehub config show|init|set|reset`: configuration management
//! - `homehub web`: local HTML preview

use std::io::Write;
use std::time::Duration;

use anyhow::{Result, bail};
use colored::Colorize;

use crate::api::Api;
use crate::config::{self, HubConfig};
use crate::logging::{self, Logger, ProviderSummary};
use crate::ping::PingOutcome;
use crate::ping::sparkline::block_sparkline;
use crate::tabs::{Dashboard, TabId};
use crate::view::{Toast, ToastLevel, format_uptime};
use crate::web;

/// Output format for history commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Dashboard wired to the configured backend and log files.
pub fn dashboard(cfg: HubConfig) -> Dashboard {
    let api = Api::from_config(&cfg);
    let logger = Logger::from_config(&cfg);
    Dashboard::new(api, cfg, logger)
}

// ---------------------------------------------------------------------------
// homehub tab
// ---------------------------------------------------------------------------

/// Activate a tab (loading it) and print its panel as text.
pub fn run_tab(dashboard: &mut Dashboard, tab: TabId) -> Result<()> {
    dashboard.activate(tab);
    println!("{}", dashboard.render_tab(tab).render_text().trim_end());
    print_toasts(&dashboard.drain_toasts());
    Ok(())
}

// ---------------------------------------------------------------------------
// homehub ping / ping-all / pings
// ---------------------------------------------------------------------------

/// Ping one provider, or the configured default when none is given.
pub fn run_ping(dashboard: &mut Dashboard, provider: Option<&str>) -> Result<()> {
    let provider = match provider {
        Some(p) => p.to_string(),
        None => default_provider(dashboard.config())?,
    };
    let outcome = dashboard.act(|tabs, cx| tabs.home.ping(cx, &provider));
    print_outcome(&outcome);
    print_series(dashboard);
    if outcome.ok { Ok(()) } else { bail!("ping to {provider} failed") }
}

/// Sequential sweep over the backend's providers.
pub fn run_ping_all(dashboard: &mut Dashboard) -> Result<()> {
    println!("{}", "Provider Ping Sweep".bold().cyan());
    println!("{}", "=".repeat(50));
    let outcomes = dashboard.act(|tabs, cx| tabs.home.ping_all(cx));
    for outcome in &outcomes {
        print_outcome(outcome);
    }
    print_series(dashboard);

    let failed = outcomes.iter().filter(|o| !o.ok).count();
    println!();
    println!(
        "  {} of {} providers answered",
        outcomes.len() - failed,
        outcomes.len()
    );
    Ok(())
}

fn default_provider(cfg: &HubConfig) -> Result<String> {
    if !cfg.providers.default_provider.is_empty() {
        return Ok(cfg.providers.default_provider.clone());
    }
    match cfg.providers.fallback.first() {
        Some(p) => Ok(p.clone()),
        None => bail!("no provider given and none configured (set providers.default_provider)"),
    }
}

fn print_outcome(outcome: &PingOutcome) {
    let line = outcome.to_string();
    if outcome.ok {
        println!("  {} {}", "✓".green().bold(), line);
    } else {
        println!("  {} {}", "✗".red().bold(), line.red());
    }
}

fn print_series(dashboard: &Dashboard) {
    let values = dashboard.store().shared.series.values();
    if !values.is_empty() {
        println!("  {} {}", "Latency:".dimmed(), block_sparkline(&values).cyan());
    }
}

/// Summarize the ping history log.
pub fn run_pings(logger: &Logger, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let Some(path) = logger.ping_log_path() else {
        println!("{}", "Ping history is disabled (logging.ping_history = false).".yellow());
        return Ok(());
    };
    let records = logging::read_ping_history(path, limit);
    if records.is_empty() {
        println!(
            "{}",
            "No pings recorded yet. Run `homehub ping-all` to collect some.".yellow()
        );
        return Ok(());
    }
    let summary = logging::summarize(&records);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Table => print_pings_table(&summary, records.len()),
    }
    Ok(())
}

fn print_pings_table(summary: &[ProviderSummary], total: usize) {
    println!("{}", format!("Ping History ({total} samples)").bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {:<16} {:>6} {:>8} {:>9} {:>8} {:>8}",
        "Provider", "Pings", "Failed", "Avg ms", "Min", "Max"
    );
    println!("  {}", "-".repeat(58));

    for (i, row) in summary.iter().enumerate() {
        let ms = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "—".to_string());
        let line = format!(
            "  {:<16} {:>6} {:>8} {:>9} {:>8} {:>8}",
            truncate(&row.provider, 16),
            row.count,
            row.failures,
            row.avg_ms
                .map(|a| format!("{a:.1}"))
                .unwrap_or_else(|| "—".to_string()),
            ms(row.min_ms),
            ms(row.max_ms),
        );
        if row.failures == row.count {
            println!("{}", line.red());
        } else if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

// ---------------------------------------------------------------------------
// homehub chat / models
// ---------------------------------------------------------------------------

/// Stream a chat reply to stdout as it arrives.
pub fn run_chat(
    dashboard: &mut Dashboard,
    provider: &str,
    model: Option<&str>,
    message: &str,
) -> Result<()> {
    let result = dashboard.act(|tabs, cx| {
        let assistant = &mut tabs.assistant;
        assistant.select_provider(cx, provider);
        if let Some(model) = model {
            assistant.select_model(model);
        }
        eprintln!(
            "{}",
            format!("Provider: {} • Model: {}", assistant.provider, assistant.model).dimmed()
        );
        let mut stdout = std::io::stdout();
        assistant.chat(cx, message, &mut |chunk| {
            let _ = stdout.write_all(chunk.as_bytes());
            let _ = stdout.flush();
        })
    });

    match result {
        Ok(_) => {
            println!();
            print_toasts(&dashboard.drain_toasts());
            Ok(())
        }
        Err(err) => {
            if let Some(line) = dashboard.store().tabs.assistant.transcript.last() {
                eprintln!("{}", line.text.red().bold());
                if !line.meta.is_empty() {
                    eprintln!("  {}", line.meta.dimmed());
                }
            }
            Err(err)
        }
    }
}

/// List the models a provider offers.
pub fn run_models(api: &Api, provider: &str) -> Result<()> {
    let list = api.models(provider)?;
    println!("{}", format!("Models for {provider}").bold().cyan());
    println!("{}", "=".repeat(40));
    for entry in list.entries() {
        if entry.name == entry.id {
            println!("  {}", entry.id);
        } else {
            println!("  {:<28} {}", entry.id, entry.name.dimmed());
        }
    }
    if let Some(notice) = list.notice() {
        println!();
        println!("  {} {}", "Warning:".yellow().bold(), notice);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// homehub vault
// ---------------------------------------------------------------------------

/// Unlock the vault with `pin` and print its items.
pub fn run_vault(dashboard: &mut Dashboard, pin: &str) -> Result<()> {
    dashboard.activate(TabId::Vault);
    let unlocked = dashboard.act(|tabs, cx| tabs.vault.unlock(cx, pin));
    if unlocked {
        println!("{}", dashboard.render_tab(TabId::Vault).render_text().trim_end());
    }
    print_toasts(&dashboard.drain_toasts());
    if unlocked { Ok(()) } else { bail!("vault is still locked") }
}

// ---------------------------------------------------------------------------
// homehub health / wait
// ---------------------------------------------------------------------------

/// Check backend reachability, config files and log files.
pub fn run_health(cfg: &HubConfig, api: &Api, logger: &Logger) -> Result<()> {
    println!("{}", "homehub Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    match api.uptime() {
        Ok(uptime) => {
            print_health_item("Backend", true, &format!("reachable at {}", api.base_url()));
            print_health_item("Uptime", true, &format_uptime(uptime.seconds));
        }
        Err(err) => print_health_item(
            "Backend",
            false,
            &format!("{} unreachable: {err}", api.base_url()),
        ),
    }

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.homehub/config.toml found"
        } else {
            "not found (run `homehub config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".homehub.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item(
        "Fallback providers",
        !cfg.providers.fallback.is_empty(),
        &cfg.providers.fallback.join(", "),
    );

    match logger.event_log_path() {
        Some(path) => print_health_item(
            "Event log",
            path.exists(),
            &if path.exists() {
                path.display().to_string()
            } else {
                "no log file yet".to_string()
            },
        ),
        None => print_health_item("Event log", false, "disabled"),
    }
    match logger.ping_log_path() {
        Some(path) => {
            let entries = logging::read_ping_history(path, None).len();
            print_health_item(
                "Ping history",
                entries > 0,
                &format!("{entries} records"),
            )
        }
        None => print_health_item("Ping history", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

/// Block until `/uptime` answers.
pub fn run_wait(api: &Api, timeout_secs: u64) -> Result<()> {
    println!(
        "{} {}",
        "Waiting for".dimmed(),
        api.base_url().bold()
    );
    let uptime = api.wait_until_ready(Duration::from_secs(timeout_secs))?;
    println!(
        "{} Backend ready (up {})",
        "✓".green().bold(),
        format_uptime(uptime.seconds)
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// homehub web
// ---------------------------------------------------------------------------

pub fn run_web(dashboard: &mut Dashboard, addr: &str) -> Result<()> {
    web::serve(dashboard, addr)
}

// ---------------------------------------------------------------------------
// homehub config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective homehub Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.homehub/config.toml", global_exists);
    print_source(".homehub.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "HOMEHUB_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.homehub/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point homehub at your backend.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn print_toasts(toasts: &[Toast]) {
    for toast in toasts {
        let tag = match toast.level {
            ToastLevel::Info => "info".blue().bold(),
            ToastLevel::Success => "ok".green().bold(),
            ToastLevel::Warning => "warn".yellow().bold(),
            ToastLevel::Danger => "error".red().bold(),
        };
        eprintln!("[{tag}] {}", toast.message);
    }
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("ollama", 10), "ollama");
        assert_eq!(truncate("openrouter", 5), "open…");
        assert_eq!(truncate("qwén", 4), "qwén");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str_opt(Some("csv")),
            OutputFormat::Table
        );
    }

    #[test]
    fn default_provider_prefers_configured_one() {
        let mut cfg = HubConfig::default();
        assert_eq!(default_provider(&cfg).unwrap(), "openai");

        cfg.providers.default_provider = "ollama".to_string();
        assert_eq!(default_provider(&cfg).unwrap(), "ollama");

        cfg.providers.default_provider.clear();
        cfg.providers.fallback.clear();
        assert!(default_provider(&cfg).is_err());
    }
}
