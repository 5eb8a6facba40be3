mod commands;

use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "worklog")]
#[command(about = "Conversational time tracker", version)]
struct Cli {
    /// User the event is delivered for
    #[arg(long, global = true, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Restart the conversation and show the main menu
    Start,
    /// Press a button by its action token
    Press {
        /// Action token, e.g. "record" or "pick:Work"
        token: String,
    },
    /// Send a free-text reply
    Say {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },
    /// Show the current screen without sending anything
    Screen,
    /// Per-project totals over all recorded entries
    Report {
        /// Emit the totals as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write all entries to a CSV file
    Export {
        /// Target path (defaults to the configured filename)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manage the project list
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Set the display timezone offset in hours
    Timezone {
        #[arg(allow_negative_numbers = true)]
        hours: i64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start => commands::session::run_start(&cli.user),
        Commands::Press { token } => commands::session::run_press(&cli.user, &token),
        Commands::Say { text } => commands::session::run_say(&cli.user, &text),
        Commands::Screen => commands::session::run_screen(&cli.user),
        Commands::Report { json } => commands::report::run(&cli.user, json),
        Commands::Export { output } => commands::export::run(&cli.user, output),
        Commands::Project { action } => commands::project::run(&cli.user, action),
        Commands::Timezone { hours } => commands::timezone::run(&cli.user, hours),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        exit(1);
    }
}
