mod config_commands;
mod serve;
mod session_commands;
mod setup;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "switchboard", about = "Switchboard: menu router for USSD and SMS applications")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./switchboard.toml and the user
    /// config directory).
    #[arg(long, global = true, env = "SWITCHBOARD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route JSON-lines messages from stdin to stdout (default).
    Serve,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Inspect and clear stored sessions (SQLite store only).
    Sessions {
        #[command(subcommand)]
        action: session_commands::SessionAction,
    },
    /// Print the menu users would see with the current config.
    Menu,
}

/// Initialise tracing. Logs always go to stderr; stdout carries messages.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "switchboard starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        None | Some(Commands::Serve) => serve::run(config_path).await,
        Some(Commands::Config { action }) => config_commands::handle_config(action, config_path),
        Some(Commands::Sessions { action }) => {
            session_commands::handle_sessions(action, config_path).await
        },
        Some(Commands::Menu) => {
            let (config, _) = setup::load(config_path)?;
            println!(
                "{}",
                switchboard_routing::render_menu(
                    &config.router.menu_title.content,
                    &config.router.labels()
                )
            );
            Ok(())
        },
    }
}
