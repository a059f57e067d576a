use anyhow::Result;
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tokio::net::TcpListener;
use tracing::{error, info};

use lingua_runner::exit_err;
use lingua_runner::inference::models::exaone::ExaoneModel;
use lingua_runner::server::{build_router, AppState, SharedBackend};
use lingua_runner::telemetry::{init_telemetry, shutdown_telemetry};
use lingua_runner::config::DEFAULT_CONFIG_FILE;
use lingua_runner::{Config, Orchestrator, TaskRegistry};

#[cfg(unix)]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    let config_result = Config::load(&args.config_file);
    let config = match &config_result {
        Ok(conf) => conf.clone().merge(&mut args.opt_config),
        Err(_) => Config::default().merge(&mut args.opt_config),
    };

    init_telemetry(&config.log_dir, &config.log_name, config.otlp_endpoint())?;
    if let Err(err) = config_result {
        exit_err!(
            1,
            "Failed to read configuration file {} with error: {}",
            args.config_file,
            err
        );
    }

    let model = match ExaoneModel::from_config(&config) {
        Ok(model) => model,
        Err(err) => exit_err!(1, "Failed to load model {}: {}", config.model_repo, err),
    };
    let base = model.base().clone();
    let backend: SharedBackend = Box::new(model);
    let orchestrator = Orchestrator::new(TaskRegistry::new(config.match_policy), backend);
    let router = build_router(AppState::new(orchestrator, base));

    let listener = TcpListener::bind(format!("{}:{}", config.address, config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    info!(
        "Supported features: avx: {}, neon: {}, simd128: {}, f16c: {}",
        candle_core::utils::with_avx(),
        candle_core::utils::with_neon(),
        candle_core::utils::with_simd128(),
        candle_core::utils::with_f16c()
    );
    info!(policy = %config.match_policy, template = %config.chat_template, "accepting commands");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
