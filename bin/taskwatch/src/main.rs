mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "taskwatch")]
#[command(about = "Watch a task tracker tab and get notified about new tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize taskwatch configuration and state directories
    Onboard {
        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show watcher status
    Status,

    /// Run the watcher (long-running daemon)
    Run,

    /// Refresh the pinned tab and scan it once, right now
    Scan,

    /// Show recently found tasks
    History {
        /// Max entries to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Clear the notification history (previously seen tasks will notify again)
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Send a test desktop notification
    TestNotify {
        /// Message body (a default is used if omitted)
        #[arg(long)]
        message: Option<String>,
    },

    /// Run environment diagnostics
    Doctor,

    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Onboard { force } => {
            commands::onboard::run(force).await?;
        }
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Run => {
            commands::run_cmd::run().await?;
        }
        Commands::Scan => {
            commands::scan_cmd::run().await?;
        }
        Commands::History { limit } => {
            commands::history_cmd::run(limit).await?;
        }
        Commands::Clear { force } => {
            commands::clear_cmd::run(force).await?;
        }
        Commands::TestNotify { message } => {
            commands::notify_cmd::run(message).await?;
        }
        Commands::Doctor => {
            commands::doctor::run().await?;
        }
        Commands::Completions { shell } => {
            commands::completions_cmd::run(&shell)?;
        }
    }

    Ok(())
}
