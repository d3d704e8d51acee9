
use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::info;
use tracing::warn;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::constants::METRIC_FIELD_LABEL;
use crate::Error;
use crate::FieldRegistry;
use crate::MonitoringConfig;
use crate::Result;

lazy_static! {
    pub static ref MUTATIONS_ACCEPTED: IntCounterVec = IntCounterVec::new(
        Opts::new("mutations_accepted", "Mutations whose CAS succeeded"),
        &[METRIC_FIELD_LABEL]
    )
    .expect("metric can not be created");

    pub static ref MUTATIONS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("mutations_rejected", "Mutations rejected for a stale expected value"),
        &[METRIC_FIELD_LABEL]
    )
    .expect("metric can not be created");

    pub static ref MUTATIONS_INVALID: IntCounter = IntCounter::new(
        "mutations_invalid",
        "Mutations rejected for an out-of-range field index"
    )
    .expect("metric can not be created");

    pub static ref EVENTS_DROPPED: IntCounter = IntCounter::new(
        "events_dropped",
        "Change events dropped because the channel was full, closed or unattended"
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

/// Registers the tracer collectors into `registry`. Already-registered
/// collectors are skipped with a warning.
pub fn register_custom_metrics(registry: &Registry) {
    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(MUTATIONS_ACCEPTED.clone()),
        Box::new(MUTATIONS_REJECTED.clone()),
        Box::new(MUTATIONS_INVALID.clone()),
        Box::new(EVENTS_DROPPED.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("collector can not be registered: {}", e);
        }
    }
}

/// Per-field counter handles, resolved once so the mutation path never
/// touches the label map.
#[derive(Debug, Clone)]
pub(crate) struct FieldCounters {
    accepted: Vec<IntCounter>,
    rejected: Vec<IntCounter>,
}

impl FieldCounters {
    pub(crate) fn new(registry: &FieldRegistry) -> Self {
        let names: Vec<&str> = registry.iter().map(|f| f.name()).collect();
        Self {
            accepted: names
                .iter()
                .map(|n| MUTATIONS_ACCEPTED.with_label_values(&[*n]))
                .collect(),
            rejected: names
                .iter()
                .map(|n| MUTATIONS_REJECTED.with_label_values(&[*n]))
                .collect(),
        }
    }

    pub(crate) fn accepted(
        &self,
        index: u32,
    ) {
        if let Some(c) = self.accepted.get(index as usize) {
            c.inc();
        }
    }

    pub(crate) fn rejected(
        &self,
        index: u32,
    ) {
        if let Some(c) = self.rejected.get(index as usize) {
            c.inc();
        }
    }
}

/// Serves `/metrics` on `port` until `shutdown_signal` fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) -> Result<()> {
    register_custom_metrics(&REGISTRY);

    let metrics_route = warp::path!("metrics")
        .map(|| REGISTRY.clone())
        .and_then(metrics_handler);

    let (addr, server) = warp::serve(metrics_route)
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        })
        .map_err(|e| Error::Metrics(format!("bind to port {port} failed: {e}")))?;

    info!(%addr, "metrics server listening");
    server.await;
    info!("metrics server stopped");
    Ok(())
}

/// Spawns [`start_server`] on the current tokio runtime when
/// `prometheus_enabled` is set. Returns `None` when monitoring is disabled.
///
/// Must be called from within a tokio runtime.
pub fn spawn_from_config(
    config: &MonitoringConfig,
    shutdown_signal: watch::Receiver<()>,
) -> Option<JoinHandle<Result<()>>> {
    if !config.prometheus_enabled {
        info!("prometheus monitoring disabled");
        return None;
    }

    let port = config.prometheus_port;
    Some(tokio::spawn(async move {
        let result = start_server(port, shutdown_signal).await;
        if let Err(e) = &result {
            error!(port, "metrics server failed: {}", e);
        }
        result
    }))
}

async fn metrics_handler(registry: Registry) -> std::result::Result<impl Reply, Rejection> {
    Ok(encode_metrics(&registry))
}

/// Prometheus text exposition of `registry`.
pub fn encode_metrics(registry: &Registry) -> String {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
