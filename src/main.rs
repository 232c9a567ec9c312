use anyhow::Result;
use clap::{Parser, Subcommand};

use homehub::api::Api;
use homehub::cli;
use homehub::config;
use homehub::logging::Logger;
use homehub::tabs::TabId;

#[derive(Debug, Parser)]
#[command(name = "homehub")]
#[command(about = "Terminal and preview client for the home hub dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a dashboard tab and print it
    Tab {
        /// home, assistant, projects, budget, data, sensors, vault or dev
        id: TabId,
    },
    /// Ping one provider and record the latency
    Ping {
        /// Provider id (default: providers.default_provider)
        provider: Option<String>,
    },
    /// Ping every provider the backend reports, one after another
    PingAll,
    /// Summarize the recorded ping history
    Pings {
        /// Only include the newest N records
        #[arg(long)]
        limit: Option<usize>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Send a chat message and stream the reply
    Chat {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        model: Option<String>,
        /// The message to send
        #[arg(trailing_var_arg = true, required = true)]
        message: Vec<String>,
    },
    /// List the models a provider offers
    Models { provider: String },
    /// Unlock the vault and list its items
    Vault { pin: String },
    /// Check backend reachability, config and logs
    Health,
    /// Wait until the backend answers /uptime
    Wait {
        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Serve the dashboard as HTML on a local port
    Web {
        /// Listen address (default: web.addr)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective merged configuration
    Show,
    /// Write the default config to ~/.homehub/config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `server.base_url http://hub.local:8000`
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    match app.command {
        Commands::Tab { id } => cli::run_tab(&mut cli::dashboard(cfg), id),
        Commands::Ping { provider } => {
            cli::run_ping(&mut cli::dashboard(cfg), provider.as_deref())
        }
        Commands::PingAll => cli::run_ping_all(&mut cli::dashboard(cfg)),
        Commands::Pings { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_pings(&Logger::from_config(&cfg), limit, fmt)
        }
        Commands::Chat {
            provider,
            model,
            message,
        } => {
            let message = message.join(" ");
            cli::run_chat(
                &mut cli::dashboard(cfg),
                &provider,
                model.as_deref(),
                &message,
            )
        }
        Commands::Models { provider } => cli::run_models(&Api::from_config(&cfg), &provider),
        Commands::Vault { pin } => cli::run_vault(&mut cli::dashboard(cfg), &pin),
        Commands::Health => cli::run_health(&cfg, &Api::from_config(&cfg), &Logger::from_config(&cfg)),
        Commands::Wait { timeout } => cli::run_wait(&Api::from_config(&cfg), timeout),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Web { addr } => {
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            cli::run_web(&mut cli::dashboard(cfg), &addr)
        }
    }
}
