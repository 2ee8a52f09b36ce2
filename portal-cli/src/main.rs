//! Main entry point for the Agent Portal command-line client.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use portal_shared::config::MAX_EARNINGS_WEEKS;
use url::Url;

use commands::{
    context::{Portal, init_tracing, load_config},
    jobs::{ApplyArgs, JobsCommand},
    profile::ProfileCommand,
    session::LoginArgs,
};

mod commands;

/// Agent Portal CLI
#[derive(Parser, Debug)]
#[command(name = "agent-portal", version)]
#[command(about = "Command-line client for the Agent Portal", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the configuration file (yaml, json, or toml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the Agent Portal API (e.g. `https://portal.example.com/`)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<Url>,

    /// Directory holding the persisted session
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); `RUST_LOG` takes precedence
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print responses as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Subcommands for the Agent Portal CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and persist the session
    Login(LoginArgs),

    /// Sign out and clear the persisted session
    Logout,

    /// Show the signed-in agent
    Whoami {
        /// Re-verify the session and pick up profile changes first
        #[arg(long)]
        refresh: bool,
    },

    /// Browse the job board
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },

    /// List your job applications
    Applications,

    /// Apply to a job
    Apply(ApplyArgs),

    /// Show your commission earnings
    Earnings {
        /// Number of weeks in the chart (1-104); defaults to the configured value
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_EARNINGS_WEEKS)))]
        weeks: Option<u32>,
    },

    /// Show your sponsor code and invitations
    Invitations {
        /// Only invitations that have not been accepted
        #[arg(long)]
        pending: bool,
    },

    /// Invite a new agent under your sponsor code
    Invite {
        /// Email address to invite
        email: String,

        /// Name of the invitee
        #[arg(long)]
        name: Option<String>,
    },

    /// Show or update your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(long, short)]
        shell: clap_complete::Shell,
    },

    /// Print the resolved configuration
    Config {
        /// Output format (yaml, json, or toml)
        #[arg(long, short, default_value = "yaml")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Completion { shell } = cli.command {
        commands::completion::generate_completion(shell);
        return Ok(());
    }

    let config = load_config(&cli.global)?;
    init_tracing(&config.log_level);

    if let Commands::Config { format, output } = &cli.command {
        return commands::config::generate_config(&config, format, output.as_deref());
    }

    let portal = Portal::connect(config, cli.global.json)?;
    match cli.command {
        Commands::Login(args) => commands::session::login(&portal, args).await?,
        Commands::Logout => commands::session::logout(&portal),
        Commands::Whoami { refresh } => commands::session::whoami(&portal, refresh).await?,
        Commands::Jobs { command } => commands::jobs::run(&portal, command).await?,
        Commands::Applications => commands::jobs::applications(&portal).await?,
        Commands::Apply(args) => commands::jobs::apply(&portal, args).await?,
        Commands::Earnings { weeks } => commands::earnings::run(&portal, weeks).await?,
        Commands::Invitations { pending } => {
            commands::recruit::invitations(&portal, pending).await?;
        }
        Commands::Invite { email, name } => {
            commands::recruit::invite(&portal, &email, name).await?;
        }
        Commands::Profile { command } => commands::profile::run(&portal, command).await?,
        Commands::Completion { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}
