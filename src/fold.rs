//! Metric folding.
//!
//! Every insert may carry a metric map (idle seconds, ttl, ...). A [`Fold`]
//! turns it into running totals on the terminal node. Collapsing a subtree
//! later sums those totals by name, so a fold should only ever add.

use std::collections::HashMap;

/// Metric name to integer value. Used both for per-key input and for the
/// accumulated totals on a node.
pub type Metrics = HashMap<String, i64>;

pub const METRIC_IDLE: &str = "idle";
pub const METRIC_TTL: &str = "ttl";
pub const METRIC_IDLE_NUM: &str = "idle_num";
pub const METRIC_IDLE_TIME: &str = "idle_time";

/// Accumulates one key's metrics into a node's totals.
///
/// Only the node's metric map is handed over; counts, samples and children
/// stay out of reach.
pub trait Fold {
    fn fold(&mut self, data: &mut Metrics, metrics: &Metrics);
}

impl<F> Fold for F
where
    F: FnMut(&mut Metrics, &Metrics),
{
    #[inline]
    fn fold(&mut self, data: &mut Metrics, metrics: &Metrics) {
        self(data, metrics)
    }
}

/// Reads a metric, treating a missing name as zero.
#[inline]
pub fn metric(metrics: &Metrics, name: &str) -> i64 {
    metrics.get(name).copied().unwrap_or(0)
}

#[inline]
pub fn add_metric(data: &mut Metrics, name: &str, value: i64) {
    match data.get_mut(name) {
        Some(total) => *total += value,
        None => {
            data.insert(name.to_string(), value);
        }
    }
}

/// Sums ttl seconds; used by the size report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtlFold;

impl Fold for TtlFold {
    fn fold(&mut self, data: &mut Metrics, metrics: &Metrics) {
        add_metric(data, METRIC_TTL, metric(metrics, METRIC_TTL));
    }
}

/// Counts keys idle for longer than `idle_threshold` seconds and sums their
/// idle time; sums ttl for every key.
#[derive(Debug, Clone, Copy)]
pub struct IdleFold {
    pub idle_threshold: i64,
}

impl IdleFold {
    /// One week, the default idle cut-off of the idle report.
    pub const DEFAULT_THRESHOLD: i64 = 7 * 86_400;

    pub fn new(idle_threshold: i64) -> Self {
        Self { idle_threshold }
    }
}

impl Default for IdleFold {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl Fold for IdleFold {
    fn fold(&mut self, data: &mut Metrics, metrics: &Metrics) {
        let idle = metric(metrics, METRIC_IDLE);
        if idle > self.idle_threshold {
            add_metric(data, METRIC_IDLE_NUM, 1);
            add_metric(data, METRIC_IDLE_TIME, idle);
        }
        add_metric(data, METRIC_TTL, metric(metrics, METRIC_TTL));
    }
}
