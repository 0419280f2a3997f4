use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "trailhead-cli", version, about = "Trailhead CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Goal management and progress logging
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// App usage recording and classification
    Usage {
        #[command(subcommand)]
        action: commands::usage::UsageAction,
    },
    /// Step economy and trail progress
    Steps {
        #[command(subcommand)]
        action: commands::steps::StepsAction,
    },
    /// Nightly maintenance sweeps
    Sweep {
        #[command(subcommand)]
        action: commands::sweep::SweepAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Usage { action } => commands::usage::run(action),
        Commands::Steps { action } => commands::steps::run(action),
        Commands::Sweep { action } => commands::sweep::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
