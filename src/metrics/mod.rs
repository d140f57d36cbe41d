use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::warn;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref RELOAD_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reload_total", "Reloads by outcome (ready, partial, failed, skipped)"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref RELOAD_DURATION_MS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("reload_duration_ms", "Histogram of reload pipeline duration in ms")
            .buckets(exponential_buckets(1.0, 2.0, 16).expect("valid buckets")),
        &["mode"]
    )
    .expect("metric can not be created");

    pub static ref LOCALE_LOAD_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("locale_load_failures", "Failed per-locale bulk loads"),
        &["locale"]
    )
    .expect("metric can not be created");

    pub static ref TRANSLATIONS_LOADED: IntGaugeVec = IntGaugeVec::new(
        Opts::new("translations_loaded", "Translation entries live per locale"),
        &["locale"]
    )
    .expect("metric can not be created");

    pub static ref FORMAT_CACHE_LOOKUPS: IntCounterVec = IntCounterVec::new(
        Opts::new("format_cache_lookups", "Compiled format lookups by result (hit, miss)"),
        &["result"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_BATCHES: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_batches", "Watch batches received, split by whether they triggered a reload"),
        &["qualifying"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub(crate) fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RELOAD_TOTAL.clone()),
        Box::new(RELOAD_DURATION_MS.clone()),
        Box::new(LOCALE_LOAD_FAILURES.clone()),
        Box::new(TRANSLATIONS_LOADED.clone()),
        Box::new(FORMAT_CACHE_LOOKUPS.clone()),
        Box::new(WATCH_BATCHES.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("collector can not be registered: {}", e);
        }
    }
}

/// Serves `GET /metrics` until `shutdown_signal` fires.
pub async fn start_metrics_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    register_custom_metrics(&REGISTRY);

    let metrics_route = warp::path!("metrics")
        .map(|| REGISTRY.clone())
        .and_then(metrics_handler);

    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    server.await;
}

pub(crate) async fn metrics_handler(registry: Registry) -> Result<impl Reply, Rejection> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    let res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    Ok(res)
}
