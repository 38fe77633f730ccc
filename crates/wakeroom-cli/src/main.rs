use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod host;

#[derive(Parser)]
#[command(name = "wakeroom-cli", version, about = "Wakeroom alarm clock CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Arm and run the alarm
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Audio checks
    Sound {
        #[command(subcommand)]
        action: commands::sound::SoundAction,
    },
    /// Practice the dismissal puzzle
    Puzzle(commands::puzzle::PuzzleArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wakeroom_cli=info,wakeroom_core=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::Sound { action } => commands::sound::run(action),
        Commands::Puzzle(args) => commands::puzzle::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
