use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use streakbook_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

/// Overrides the `logging.filter` config value.
const LOG_ENV: &str = "STREAKBOOK_LOG";

#[derive(Parser)]
#[command(
    name = "streakbook",
    version,
    about = "Track solved coding problems, daily streaks and a medication study log"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, sign in and manage the session
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Solved-problem log
    #[command(alias = "ex")]
    Exercise {
        #[command(subcommand)]
        action: commands::exercise::ExerciseAction,
    },
    /// Medication study log
    Med {
        #[command(subcommand)]
        action: commands::medication::MedicationAction,
    },
    /// Profile and streak
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Dashboard numbers
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

fn init_tracing() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_new(Config::load_or_default().logging.filter).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Exercise { action } => commands::exercise::run(action),
        Commands::Med { action } => commands::medication::run(action),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Stats { json } => commands::stats::run(json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "streakbook", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
