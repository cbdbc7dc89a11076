//! FraudGuard - Main Entry Point
//!
//! Train, predict and serve from one binary.

use clap::Parser;
use fraudguard::cli::{cmd_predict, cmd_serve, cmd_train, Cli, Commands};
use fraudguard::inference::TransactionInput;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so `predict --json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraudguard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Train { data, target, model, output, n_estimators, seed, threshold } => {
            cmd_train(
                &cli.data_dir,
                &cli.models_dir,
                &data,
                &target,
                model,
                &output,
                n_estimators,
                seed,
                threshold,
            )?;
        }
        Commands::Predict {
            amount,
            transaction_type,
            device_type,
            transaction_time,
            model,
            threshold,
            json,
        } => {
            let input = TransactionInput::new(amount, transaction_type, device_type, transaction_time);
            cmd_predict(&cli.models_dir, &model, input, threshold, json)?;
        }
        Commands::Serve { host, port, model } => {
            cmd_serve(host, port, &cli.models_dir, &model).await?;
        }
    }

    Ok(())
}
