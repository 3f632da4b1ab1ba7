use clap::{ArgAction, Parser, Subcommand};
use latomate_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod notifier;

#[derive(Parser)]
#[command(name = "latomate", version, about = "LaTomate Pomodoro timer")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Session history
    Sessions {
        #[command(subcommand)]
        action: commands::sessions::SessionsAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Timer mode and durations
    Mode {
        #[command(subcommand)]
        action: commands::mode::ModeAction,
    },
    /// Show or toggle session-complete notifications
    Notifications {
        #[arg(value_enum)]
        toggle: Option<commands::mode::Toggle>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: u8, config: &Config) {
    let fallback = match verbose {
        0 => config.log.filter.clone(),
        1 => "latomate=debug,latomate_core=debug".to_string(),
        _ => "latomate=trace,latomate_core=trace".to_string(),
    };
    let filter = if verbose > 0 {
        EnvFilter::new(fallback)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_logging(cli.verbose, &config);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Sessions { action } => commands::sessions::run(action, &config),
        Commands::Stats { action } => commands::stats::run(action, &config),
        Commands::Mode { action } => commands::mode::run(action, &config),
        Commands::Notifications { toggle } => commands::mode::notifications(toggle, &config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
