//! Request Metrics
//!
//! Process-wide request counters shared by every in-flight request. Counters
//! are monotonic and reset only on restart; they are not persisted or
//! aggregated across instances.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use utoipa::ToSchema;

/// Endpoint group used when no route claimed the request.
pub const UNKNOWN_ENDPOINT: &str = "UnknownController";

#[derive(Debug, Default)]
pub struct RequestMetrics {
    total_requests: AtomicU64,
    total_elapsed_micros: AtomicU64,
    per_endpoint: DashMap<String, AtomicU64>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request. Safe to call from any number of tasks.
    pub fn record(&self, endpoint: &str, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_elapsed_micros.fetch_add(micros, Ordering::Relaxed);

        if let Some(counter) = self.per_endpoint.get(endpoint) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.per_endpoint
            .entry(endpoint.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Mean elapsed time in milliseconds; 0 before the first request.
    pub fn average_response_time_ms(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let micros = self.total_elapsed_micros.load(Ordering::Relaxed);
        micros as f64 / total as f64 / 1000.0
    }

    pub fn endpoint_count(&self, endpoint: &str) -> u64 {
        self.per_endpoint
            .get(endpoint)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Point-in-time view. Individual reads are atomic; the set of counters
    /// is not read under a common lock.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut per_endpoint: Vec<EndpointCount> = self
            .per_endpoint
            .iter()
            .map(|entry| EndpointCount {
                endpoint: entry.key().clone(),
                count: entry.value().load(Ordering::Relaxed),
            })
            .collect();
        per_endpoint.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));

        MetricsSnapshot {
            total_requests: self.total_requests(),
            average_response_time_ms: round2(self.average_response_time_ms()),
            per_endpoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    /// Rounded to two decimals
    pub average_response_time_ms: f64,
    /// Sorted by endpoint name
    pub per_endpoint: Vec<EndpointCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCount {
    pub endpoint: String,
    pub count: u64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
