//! Student Grade Predictor - Main Entry Point

use clap::Parser;
use grade_predictor::cli::{cmd_charts, cmd_evaluate, cmd_info, cmd_interactive, cmd_predict, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grade_predictor=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.app_config()?;

    match cli.command {
        Some(Commands::Predict { student, model }) => {
            cmd_predict(&config, &student, &model)?;
        }
        Some(Commands::Charts) => {
            cmd_charts(&config)?;
        }
        Some(Commands::Evaluate { json, model }) => {
            cmd_evaluate(&config, json, model.as_deref())?;
        }
        Some(Commands::Info) => {
            cmd_info(&config)?;
        }
        None => {
            cmd_interactive(&config)?;
        }
    }

    Ok(())
}
