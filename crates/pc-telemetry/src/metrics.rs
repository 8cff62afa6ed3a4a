//! Prometheus metrics for the pool.
//!
//! Metrics follow the naming convention `pool_<subsystem>_<metric>_<unit>`.
//! Unlike a process-wide set of `lazy_static` globals, `PoolMetrics` is a
//! struct the caller constructs once at startup and threads through the
//! components that need it — simpler to test, and nothing stops two
//! instances (e.g. in integration tests) from using independent registries.

use prometheus::{exponential_buckets, Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder, Encoder};

use crate::TelemetryError;

pub struct PoolMetrics {
    pub submissions_accepted: Counter,
    pub submissions_rejected: CounterVec,
    pub blocks_won: Counter,
    pub blocks_lost: Counter,
    pub payouts_sent: Counter,
    pub payout_amount_planck: Counter,
    pub reward_engine_cycles: Counter,
    pub deadline_kernel_batch_size: Histogram,
    pub deadline_kernel_latency_seconds: Histogram,
    pub miners_registered: Gauge,
    pub current_round_height: Gauge,
}

impl PoolMetrics {
    pub fn new(registry: &Registry) -> Result<Self, TelemetryError> {
        let submissions_accepted = Counter::new(
            "pool_submissions_accepted_total",
            "Total nonce submissions accepted",
        )
        .expect("metric creation failed");

        let submissions_rejected = CounterVec::new(
            Opts::new("pool_submissions_rejected_total", "Total nonce submissions rejected"),
            &["reason"],
        )
        .expect("metric creation failed");

        let blocks_won = Counter::new("pool_blocks_won_total", "Total blocks the pool won").expect("metric creation failed");
        let blocks_lost = Counter::new("pool_blocks_lost_total", "Total rounds the pool lost").expect("metric creation failed");
        let payouts_sent = Counter::new("pool_payouts_sent_total", "Total payout transactions sent").expect("metric creation failed");
        let payout_amount_planck = Counter::new(
            "pool_payout_amount_planck_total",
            "Total planck paid out to miners",
        )
        .expect("metric creation failed");
        let reward_engine_cycles = Counter::new(
            "pool_reward_engine_cycles_total",
            "Total reward engine ticks processed",
        )
        .expect("metric creation failed");

        let deadline_kernel_batch_size = Histogram::with_opts(
            HistogramOpts::new("pool_deadline_kernel_batch_size", "Size of flushed deadline batches")
                .buckets(vec![1.0, 2.0, 4.0, 8.0]),
        )
        .expect("metric creation failed");

        let deadline_kernel_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "pool_deadline_kernel_latency_seconds",
                "Time from submission to deadline result",
            )
            .buckets(exponential_buckets(0.001, 2.0, 14).unwrap()),
        )
        .expect("metric creation failed");

        let miners_registered = Gauge::new("pool_miners_registered", "Miners currently in the registry").expect("metric creation failed");
        let current_round_height = Gauge::new("pool_current_round_height", "Height of the active round").expect("metric creation failed");

        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(submissions_accepted.clone()),
            Box::new(submissions_rejected.clone()),
            Box::new(blocks_won.clone()),
            Box::new(blocks_lost.clone()),
            Box::new(payouts_sent.clone()),
            Box::new(payout_amount_planck.clone()),
            Box::new(reward_engine_cycles.clone()),
            Box::new(deadline_kernel_batch_size.clone()),
            Box::new(deadline_kernel_latency_seconds.clone()),
            Box::new(miners_registered.clone()),
            Box::new(current_round_height.clone()),
        ];
        for collector in collectors {
            registry.register(collector).map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }

        Ok(Self {
            submissions_accepted,
            submissions_rejected,
            blocks_won,
            blocks_lost,
            payouts_sent,
            payout_amount_planck,
            reward_engine_cycles,
            deadline_kernel_batch_size,
            deadline_kernel_latency_seconds,
            miners_registered,
            current_round_height,
        })
    }
}

/// Encodes every metric in `registry` as Prometheus text exposition format,
/// for a `/metrics` HTTP handler to serve verbatim.
pub fn encode_metrics(registry: &Registry) -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation on drop.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
