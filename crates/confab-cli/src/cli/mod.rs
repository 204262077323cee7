//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use confab_core::ChatRuntime;
use confab_core::config::{self, Config};
use confab_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "confab")]
#[command(version)]
#[command(about = "Terminal client for a multi-session AI chat service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the chat service (overrides config)
    #[arg(long, global = true, env = "CONFAB_BASE_URL", value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Send {
        /// The message text (may be empty when a file is attached)
        #[arg(value_name = "MESSAGE", default_value = "")]
        message: String,

        /// Attach a file to the message
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Continue an existing session instead of starting a new one
        #[arg(short, long, value_name = "ID")]
        session: Option<String>,
    },

    /// Manage sessions on the server
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// Lists sessions with their titles
    List {
        /// Only show sessions whose title contains TERM (case-insensitive)
        #[arg(long, value_name = "TERM")]
        search: Option<String>,
    },
    /// Shows the history of a session
    Show {
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
    /// Deletes a session
    Delete {
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the base URL of the chat service
    SetUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work even with a broken config file.
    if let Some(Commands::Config { command }) = &cli.command {
        return run_config(command);
    }

    let config = Config::load().context("load config")?;
    // Keep the interactive transcript free of routine info lines.
    let default_level = if cli.command.is_none() { "warn" } else { "info" };
    let _log_guard = logging::init(&config.log, default_level, &config::paths::confab_home())?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, &config).await })
}

async fn dispatch(cli: Cli, config: &Config) -> Result<()> {
    let Cli { command, base_url } = cli;

    let base_url = config.resolve_base_url(base_url.as_deref())?;
    let runtime = ChatRuntime::from_config(config, &base_url).context("create chat runtime")?;

    // default to chat mode
    let Some(command) = command else {
        return commands::chat::run(runtime, &base_url).await;
    };

    match command {
        Commands::Send {
            message,
            file,
            session,
        } => commands::send::run(runtime, message, file, session).await,

        Commands::Sessions { command } => match command {
            SessionCommands::List { search } => {
                commands::sessions::list(runtime, search.as_deref()).await
            }
            SessionCommands::Show { id } => commands::sessions::show(runtime, &id).await,
            SessionCommands::Delete { id } => commands::sessions::delete(runtime, &id).await,
        },

        Commands::Config { command } => run_config(&command),
    }
}

fn run_config(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            commands::config::path();
            Ok(())
        }
        ConfigCommands::Init => commands::config::init(),
        ConfigCommands::SetUrl { url } => commands::config::set_url(url),
    }
}
