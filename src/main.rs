use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kv_translator::build_runtimes;
use kv_translator::http;
use kv_translator::start_metrics_server;
use kv_translator::Error;
use kv_translator::MemoryStore;
use kv_translator::Result;
use kv_translator::TaskPools;
use kv_translator::Translator;
use kv_translator::TranslatorConfig;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

fn main() -> Result<()> {
    let settings = TranslatorConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.log_dir)?;
    info!(?settings, "configuration loaded");

    // Initializing Pools
    let (store_rt, blocking_rt) = build_runtimes(&settings.pools)?;
    let pools = TaskPools::new(store_rt.handle().clone(), blocking_rt.handle().clone());

    let store = match &settings.store.seed_file {
        Some(path) => MemoryStore::from_seed_file(path)?,
        None => MemoryStore::new(),
    };
    info!(
        endpoints = ?settings.store.resolved_endpoints(),
        keys = store.len(),
        "store client ready"
    );

    let result = store_rt.block_on(run(settings, store, pools));
    if let Err(e) = &result {
        error!("translator stops: {:?}", e);
    }

    blocking_rt.shutdown_timeout(Duration::from_secs(1));
    store_rt.shutdown_timeout(Duration::from_secs(1));
    println!("Exiting program.");
    result
}

async fn run(
    settings: TranslatorConfig,
    store: MemoryStore,
    pools: TaskPools,
) -> Result<()> {
    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    let translator = Arc::new(Translator::new(Arc::new(store), &settings, pools));
    translator.start().await?;

    if settings.monitoring.prometheus_enabled {
        tokio::spawn(start_metrics_server(
            settings.monitoring.prometheus_port,
            graceful_rx.clone(),
        ));
    }
    let server = settings.server.enabled.then(|| {
        tokio::spawn(http::start_server(
            translator.clone(),
            settings.server.listen_port,
            graceful_rx.clone(),
        ))
    });

    info!("Application started. Waiting for CTRL+C signal...");
    graceful_shutdown(graceful_tx).await?;

    translator.stop();
    if let Some(server) = server {
        server.await?;
    }
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::SignalSenderClosed(format!("Failed to send shutdown signal: {}", e))
    })?;

    info!("Shutdown completed");
    Ok(())
}

pub fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let log_file = tracing_appender::rolling::never(log_dir, "translator.log");

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
