//! examdesk CLI — inspect and report on an exam store.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use examdesk_store::config::load_config_from;

mod commands;

#[derive(Parser)]
#[command(name = "examdesk", version, about = "Exam results store and reporting")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed TOML or snapshot JSON to load (overrides data_path)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and seed file
    Init,

    /// Check a seed file for integrity problems
    Validate,

    /// Show student and exam counts
    Stats,

    /// Show a student's dashboard
    Dashboard {
        /// Student id
        #[arg(long)]
        student: u64,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Rank the results of one exam
    Ranking {
        /// Exam id
        #[arg(long)]
        exam: u64,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List results, optionally for one student or exam
    Results {
        #[arg(long)]
        student: Option<u64>,

        #[arg(long)]
        exam: Option<u64>,
    },

    /// Write a JSON snapshot of the loaded store
    Export {
        /// Snapshot file to write
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate => commands::validate::execute(cli.data, &config),
        Commands::Stats => commands::stats::execute(cli.data, &config).await,
        Commands::Dashboard { student, format } => {
            commands::dashboard::execute(cli.data, &config, student, format).await
        }
        Commands::Ranking { exam, format } => {
            commands::ranking::execute(cli.data, &config, exam, format).await
        }
        Commands::Results { student, exam } => {
            commands::results::execute(cli.data, &config, student, exam).await
        }
        Commands::Export { output } => commands::export::execute(cli.data, &config, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
