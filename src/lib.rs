pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod extract;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

/// Installs the global subscriber. `RUST_LOG` overrides `general.log_level`.
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.observability.json_logs;
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn install_metrics(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if let Some(Commands::Init) = &cli.command {
        return cli::cmd_init(&cli.config_path()).await;
    }

    config.validate()?;

    match cli.command {
        None | Some(Commands::Serve) => run_server(config).await,
        Some(command) => {
            let state = SharedState::new(config).await?;
            run_command(&state, command).await
        }
    }
}

async fn run_command(state: &SharedState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Queries { active } => cli::cmd_list_queries(state, active).await,
        Commands::Cases {
            business,
            county,
            case_status,
            user_status,
        } => cli::cmd_list_cases(state, business, county, case_status, user_status).await,
        Commands::Mark { status, case_ids } => cli::cmd_mark(state, &status, &case_ids).await,
        Commands::ImportCases { query_id, file } => {
            cli::cmd_import_cases(state, &query_id, &file).await
        }
        Commands::Advance { query_id, status } => {
            cli::cmd_advance(state, &query_id, &status).await
        }
        Commands::Extract { url, file } => cli::cmd_extract(state, url, file.as_deref()).await,
        Commands::Serve | Commands::Init => Ok(()),
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("casedesk v{} starting", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = install_metrics(&config)?;
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);

    let shared = Arc::new(SharedState::new(config).await?);
    let app = api::router(api::create_app_state(shared, prometheus_handle)).await;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
