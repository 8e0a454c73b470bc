mod challenges;
mod config;
mod progress;
mod sandbox;
mod session;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::challenges::builtin;
use crate::challenges::registry::ChallengeRegistry;
use crate::config::Config;
use crate::progress::store::ProgressStore;
use crate::progress::Progression;
use crate::sandbox::Sandbox;
use crate::session::{console, SessionRuntime};

fn print_help() {
    println!(
        "\
kata-bot v{}

A learn-to-code bot: solve scripting challenges from the console.

USAGE:
    kata-bot [OPTIONS] [CONFIG_PATH]

ARGUMENTS:
    CONFIG_PATH    Path to TOML configuration file [default: config/bot.toml]

OPTIONS:
    -h, --help       Print this help message and exit
    -V, --version    Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG              Log level filter for tracing
                          (e.g. debug, kata_bot=debug,warn)

EXAMPLES:
    kata-bot                          # uses config/bot.toml
    kata-bot /etc/kata/bot.toml       # custom config path
    RUST_LOG=debug kata-bot           # with debug logging",
        env!("CARGO_PKG_VERSION"),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --help / --version before anything else
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("kata-bot v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    // Initialize logging (RUST_LOG=debug for debug mode)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kata_bot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/bot.toml".to_string());

    info!("Loading configuration from {config_path}");
    let config = Config::load(&config_path)?;

    info!("Bot: {}", config.agent.name);
    info!("Allowed users: {}", config.agent.allowed_users.join(", "));
    info!(
        "Sandbox: {}s per submission, {} call levels",
        config.sandbox.deadline_secs, config.sandbox.max_call_levels
    );

    let mut registry = ChallengeRegistry::new();
    builtin::register_all(&mut registry)?;
    anyhow::ensure!(!registry.is_empty(), "No challenges registered");
    info!("Challenges: {} registered", registry.len());

    let store = ProgressStore::open(&config.state.path)?;
    let sandbox = Sandbox::from_config(&config.sandbox);
    let runtime = SessionRuntime::new(
        config.clone(),
        Progression::new(registry),
        sandbox,
        store,
    );

    let (event_tx, event_rx) = mpsc::channel(32);
    let (cmd_tx, cmd_rx) = mpsc::channel(32);

    console::spawn_reader(config.agent.console_user.clone(), event_tx);
    let printer = tokio::spawn(console::print_replies(config.agent.name.clone(), cmd_rx));

    tokio::select! {
        result = runtime.run(event_rx, cmd_tx) => {
            result?;
            // Let the printer drain the last replies
            let _ = printer.await;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, exiting");
            // A pending stdin read would otherwise hold the runtime open
            std::process::exit(0);
        }
    }

    Ok(())
}
