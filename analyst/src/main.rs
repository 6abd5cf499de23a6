//! Brio Analyst: ask data questions, get answers computed in a Python sandbox.

use brio_analyst::app;
use brio_analyst::cli::Args;
use brio_analyst::infrastructure::{config::Settings, telemetry::TelemetryBuilder};
use clap::Parser;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info};

fn main() -> ExitCode {
    let args = Args::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Fatal Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(run(args));
    // A pending stdin read parks a blocking thread; do not wait for it.
    runtime.shutdown_background();
    code
}

async fn run(args: Args) -> ExitCode {
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Fatal Error: failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_level = if args.verbose {
        "info,brio_analyst=debug,agent_sdk=debug".to_string()
    } else {
        settings.telemetry.log_level.clone()
    };
    if let Err(e) = TelemetryBuilder::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .with_log_level(log_level)
        .with_json(settings.telemetry.json)
        .init()
    {
        eprintln!("Fatal Error: {e:#}");
        return ExitCode::FAILURE;
    }

    // Dropping the session future on interrupt tears down any live container.
    tokio::select! {
        result = app::run(args, settings) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Fatal Error: {e:#}");
                ExitCode::FAILURE
            }
        },
        () = shutdown_signal() => {
            info!("Goodbye!");
            ExitCode::SUCCESS
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
