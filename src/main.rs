//! `appserver` — persistent application worker.
//!
//! Starts one worker process for a named profile from the profiles file:
//!
//! ```text
//! appserver http site --config appserver.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use appserver::config::loader;
use appserver::kernel::EchoKernel;
use appserver::lifecycle::{signals, Shutdown};
use appserver::observability::logging;
use appserver::worker::Worker;

#[derive(Parser)]
#[command(name = "appserver")]
#[command(about = "Persistent worker for per-request web applications", long_about = None)]
struct Cli {
    /// Profiles file.
    #[arg(short, long, default_value = "appserver.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP worker for a named profile
    Http { profile: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Http { profile: name } = cli.command;

    let profile = match loader::load_profiles(&cli.config)
        .and_then(|profiles| loader::select_profile(&profiles, &name))
    {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("appserver: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(profile.debug);
    tracing::info!(
        profile = %name,
        address = %profile.bind_address(),
        root = %profile.root.display(),
        debug = profile.debug,
        "appserver starting"
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("appserver: failed to build runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Dispatch must stay single-threaded: connection tasks are spawned on a
    // LocalSet driven by a current-thread runtime.
    let local = tokio::task::LocalSet::new();
    let outcome = local.block_on(&runtime, async move {
        let shutdown = Shutdown::new();
        let shutdown_rx = shutdown.subscribe();
        let (reload_tx, reload_rx) = tokio::sync::mpsc::unbounded_channel();
        signals::spawn_handlers(shutdown, reload_tx);

        let worker = Worker::new(profile, Box::new(EchoKernel));
        worker.run(shutdown_rx, reload_rx).await
    });

    match outcome {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Worker failed");
            ExitCode::FAILURE
        }
    }
}
