//! Prometheus metrics for the governance crates.
//!
//! All metrics follow the naming convention: `fx_<component>_<metric>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // QUEUE METRICS
    // =========================================================================

    /// Proposals accepted into a queue
    pub static ref PROPOSALS_QUEUED: Counter = Counter::new(
        "fx_queue_proposals_queued_total",
        "Total proposals accepted into an admission queue"
    ).expect("metric creation failed");

    /// Proposals evicted by a higher bid
    pub static ref PROPOSALS_EVICTED: Counter = Counter::new(
        "fx_queue_proposals_evicted_total",
        "Total queued proposals evicted by a higher-priority submission"
    ).expect("metric creation failed");

    /// Submissions rejected, by failure kind
    pub static ref PROPOSALS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("fx_queue_proposals_rejected_total", "Rejected submissions by failure kind"),
        &["kind"]
    ).expect("metric creation failed");

    /// Proposals handed from a queue to proposal creation
    pub static ref PROPOSALS_ACTIVATED: Counter = Counter::new(
        "fx_queue_proposals_activated_total",
        "Total proposals activated"
    ).expect("metric creation failed");

    /// Current queue length per DAO
    pub static ref QUEUE_DEPTH: GaugeVec = GaugeVec::new(
        Opts::new("fx_queue_depth", "Proposals waiting in the queue"),
        &["dao"]
    ).expect("metric creation failed");

    /// Currently active proposals per DAO
    pub static ref ACTIVE_PROPOSALS: GaugeVec = GaugeVec::new(
        Opts::new("fx_queue_active_proposals", "Proposals holding a concurrency slot"),
        &["dao"]
    ).expect("metric creation failed");

    // =========================================================================
    // LIFECYCLE METRICS
    // =========================================================================

    /// Finalized proposals by verdict
    pub static ref PROPOSALS_FINALIZED: CounterVec = CounterVec::new(
        Opts::new("fx_lifecycle_proposals_finalized_total", "Finalized proposals by verdict"),
        &["verdict"]  // verdict: approved/rejected
    ).expect("metric creation failed");

    /// Settlement order attempts by result
    pub static ref SETTLEMENT_ORDERS: CounterVec = CounterVec::new(
        Opts::new("fx_lifecycle_settlement_orders_total", "Settlement order attempts by result"),
        &["result"]  // result: paid/failed
    ).expect("metric creation failed");
}

/// Proof that the governance metrics are registered with [`REGISTRY`].
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    newly_registered: usize,
}

impl MetricsHandle {
    /// Collectors this call added; zero when an earlier call already did.
    pub fn newly_registered(&self) -> usize {
        self.newly_registered
    }

    pub fn encode(&self) -> Result<String, TelemetryError> {
        encode_metrics()
    }
}

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Queue
        Box::new(PROPOSALS_QUEUED.clone()),
        Box::new(PROPOSALS_EVICTED.clone()),
        Box::new(PROPOSALS_REJECTED.clone()),
        Box::new(PROPOSALS_ACTIVATED.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(ACTIVE_PROPOSALS.clone()),
        // Lifecycle
        Box::new(PROPOSALS_FINALIZED.clone()),
        Box::new(SETTLEMENT_ORDERS.clone()),
    ];

    let mut newly_registered = 0;
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => newly_registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    debug!(newly_registered, "Governance metrics registered");

    Ok(MetricsHandle { newly_registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
