use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "flowstate", version, about = "Flowstate focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive focus/break timer
    Run(commands::run::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Enable or disable background tracks
    Tracks {
        #[command(subcommand)]
        action: commands::tracks::TracksAction,
    },
    /// Color theme
    Theme {
        #[command(subcommand)]
        action: commands::theme::ThemeAction,
    },
    /// List session categories from the backend
    Categories,
    /// Recently recorded sessions
    History {
        /// Number of sessions to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Print the backend's analytics dashboard as JSON
    Dashboard,
}

fn init_tracing() {
    // Logs go to stderr; stdout carries the status line and command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Tracks { action } => commands::tracks::run(action),
        Commands::Theme { action } => commands::theme::run(action),
        Commands::Categories => commands::api::categories(),
        Commands::History { limit } => commands::api::history(limit),
        Commands::Dashboard => commands::api::dashboard(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
