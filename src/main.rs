use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::feedback::Outcome;

/// Log filter variable, e.g. `SUPPORT_ASSIST_LOG=debug`
const LOG_ENV_VAR: &str = "SUPPORT_ASSIST_LOG";

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Find the closest past support ticket and rank its solutions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load tickets from a spreadsheet export and build the search index
    Ingest {
        /// JSON array or YAML list of ticket rows
        file: PathBuf,

        /// Rebuild even if an index already exists
        #[arg(long)]
        rebuild: bool,
    },

    /// Describe a problem and get the best matching ticket's solutions
    Search {
        /// Problem description
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,

        /// Skip the generated troubleshooting response
        #[arg(long)]
        no_generate: bool,
    },

    /// Record whether a solution worked
    Feedback {
        /// Ticket ID
        ticket_id: String,

        /// Solution level (1 = first remedy)
        level: u32,

        /// The solution fixed the problem
        #[arg(long, conflicts_with = "failed", required_unless_present = "failed")]
        worked: bool,

        /// The solution did not help
        #[arg(long)]
        failed: bool,
    },

    /// Record that none of a ticket's solutions worked
    NoneWorked {
        /// Ticket ID
        ticket_id: String,
    },

    /// Show feedback counters and current ranking for a ticket
    Stats {
        /// Ticket ID
        ticket_id: String,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Ingest { file, rebuild } => commands::ingest::execute(&file, rebuild)?,
        Commands::Search {
            query,
            json,
            no_generate,
        } => commands::search::execute(&query.join(" "), json, !no_generate)?,
        Commands::Feedback {
            ticket_id,
            level,
            worked,
            failed: _,
        } => {
            let outcome = if worked {
                Outcome::Worked
            } else {
                Outcome::Failed
            };
            commands::feedback::execute(&ticket_id, level, outcome)?
        }
        Commands::NoneWorked { ticket_id } => commands::feedback::execute_none_worked(&ticket_id)?,
        Commands::Stats { ticket_id, json } => commands::stats::execute(&ticket_id, json)?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
