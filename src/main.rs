use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genrelay::config::ConfigLoader;
use genrelay::orchestrator::Orchestrator;
use genrelay::provider::{MeshProvider, SkyboxProvider};
use genrelay::quota::{InMemoryQuotaStore, QuotaResetTask, RateLimiter};
use genrelay::server::{AppState, serve};

#[derive(Parser)]
#[command(name = "genrelay")]
#[command(
    version,
    about = "Orchestration and rate limiting for third-party generation APIs"
)]
struct Cli {
    /// Config file path (defaults to genrelay.toml when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configured value
    #[arg(long, short)]
    port: Option<u16>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConfigLoader::load_with_file(cli.config.as_deref())?;
    let port = cli.port.unwrap_or(config.server.port);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let store = Arc::new(InMemoryQuotaStore::new());
        let limiter = RateLimiter::new(store.clone(), config.quota.max_concurrent_generations);

        let orchestrator = Orchestrator::new(
            Arc::new(MeshProvider::new(config.providers.mesh_api_key.clone())?),
            Arc::new(SkyboxProvider::new(config.providers.skybox_api_key.clone())?),
            limiter,
        );

        let reset = QuotaResetTask::new(
            store,
            std::time::Duration::from_secs(config.quota.reset_interval_secs),
        )
        .start();

        let state = Arc::new(AppState {
            orchestrator,
            disabled: config.server.disabled,
        });

        serve(state, port, shutdown_signal()).await?;

        // The reset task outlives the last request; stop it explicitly
        reset.shutdown().await;

        Ok(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
