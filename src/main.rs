use std::{path::PathBuf, process};

use clap::Parser;
use settle_up_lib::{process_group, GroupFiles, OutputFormat, Settings};
use tracing_subscriber::EnvFilter;

/// Computes net balances for a group and the transfers that settle them.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Expenses csv: expense,payer,amount,split_with
    expenses: PathBuf,
    /// Payments csv: confirmation,from,to,amount,confirmed_by,slip_url
    #[arg(long)]
    payments: Option<PathBuf>,
    /// Participants csv: participant,name
    #[arg(long)]
    participants: Option<PathBuf>,
    /// Settings file, without extension
    #[arg(long, env = "SETTLE_UP_CONFIG", default_value = "settle_up")]
    config: String,
    /// Print json instead of csv
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut settings = match Settings::from_file(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load settings: {e}");
            process::exit(1);
        }
    };
    if cli.json {
        settings.output_format = OutputFormat::Json;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "settle_up_lib={level},settle_up_bin={level}",
            level = settings.log_level
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let files = GroupFiles {
        expenses: cli.expenses,
        payments: cli.payments,
        participants: cli.participants,
    };

    match process_group(&files, &settings) {
        Ok(result) => {
            print!("{}", result);
            process::exit(0);
        }
        Err(e) => {
            tracing::error!("failed to settle group: {e}");
            eprintln!("an error occurred: {e}");
            process::exit(1);
        }
    }
}
