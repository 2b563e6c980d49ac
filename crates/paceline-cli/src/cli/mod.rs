//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use paceline_core::{config, interrupt};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "paceline")]
#[command(version)]
#[command(about = "Habit and mentoring client shell")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Resolve the session and mount the root stack
    Run {
        /// Keep running and react to sign-in/sign-out until Ctrl+C
        #[arg(long)]
        watch: bool,
    },

    /// Sign in with a local profile
    Login {
        /// Email address for the profile
        #[arg(long)]
        email: String,

        /// Display name shown to mentors and mentees
        #[arg(long)]
        name: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show session, cache, and config status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Enable or disable the remembered-session fast path
    SetRemember {
        /// "true" or "false"
        #[arg(value_name = "BOOL")]
        value: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    interrupt::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    // default to resolving the session once
    let Some(command) = cli.command else {
        return commands::run::run(&config, false).await;
    };

    match command {
        Commands::Run { watch } => commands::run::run(&config, watch).await,
        Commands::Login { email, name } => commands::auth::login(&email, name),
        Commands::Logout => commands::auth::logout(),
        Commands::Status => commands::status::show(&config),
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetRemember { value } => commands::config::set_remember(value),
        },
    }
}
