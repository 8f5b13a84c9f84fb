//! finblog CLI entrypoint

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finblog::cli::Cli;
use finblog::error::{FinblogError, EXIT_FAILURE};

#[tokio::main]
async fn main() -> ExitCode {
    // Variables from .env, without overriding the real environment
    dotenv::dotenv().ok();

    // Initialize tracing (stderr, so stdout stays clean for command output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Parse and execute CLI
    let cli = Cli::parse();
    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<FinblogError>() {
            Some(err) => {
                eprintln!("{}: {:#}", err.kind(), e);
                ExitCode::from(err.exit_code())
            }
            None => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}
