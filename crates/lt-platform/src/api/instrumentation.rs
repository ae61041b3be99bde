//! Request instrumentation
//!
//! Outermost layer of the platform router. Every request, including ones
//! rejected by the gate or matched by no route, is timed, logged once and
//! counted in [`RequestMetrics`]. Recording happens when the in-flight guard
//! drops, so handler panics and client disconnects are counted too.

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::info;

use crate::service::{RequestMetrics, UNKNOWN_ENDPOINT};

/// Endpoint group for the current request, filled in by [`tag_endpoint`]
/// once routing has picked a router.
#[derive(Clone, Default)]
pub struct EndpointSlot(Arc<OnceLock<&'static str>>);

impl EndpointSlot {
    pub fn set(&self, endpoint: &'static str) {
        let _ = self.0.set(endpoint);
    }

    pub fn get(&self) -> &'static str {
        self.0.get().copied().unwrap_or(UNKNOWN_ENDPOINT)
    }
}

/// Who made the request, attached to the response by the gate.
#[derive(Debug, Clone)]
pub struct CallerLabel(pub String);

pub async fn instrument_requests(
    State(metrics): State<Arc<RequestMetrics>>,
    mut request: Request,
    next: Next,
) -> Response {
    let slot = EndpointSlot::default();
    request.extensions_mut().insert(slot.clone());

    let mut in_flight = InFlightRequest {
        metrics,
        slot,
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        started: Instant::now(),
        status: None,
        caller: None,
    };

    let response = next.run(request).await;

    in_flight.status = Some(response.status());
    in_flight.caller = response.extensions().get::<CallerLabel>().map(|c| c.0.clone());
    response
}

/// Route layer naming the endpoint group of every route in a router.
pub async fn tag_endpoint(
    State(endpoint): State<&'static str>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(slot) = request.extensions().get::<EndpointSlot>() {
        slot.set(endpoint);
    }
    next.run(request).await
}

struct InFlightRequest {
    metrics: Arc<RequestMetrics>,
    slot: EndpointSlot,
    method: Method,
    path: String,
    started: Instant,
    status: Option<StatusCode>,
    caller: Option<String>,
}

impl Drop for InFlightRequest {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        let endpoint = self.slot.get();
        self.metrics.record(endpoint, elapsed);

        // No status means the handler never produced a response
        let status = self
            .status
            .map(|s| s.as_u16().to_string())
            .unwrap_or_else(|| "aborted".to_string());

        info!(
            method = %self.method,
            path = %self.path,
            status = %status,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            endpoint = endpoint,
            caller = self.caller.as_deref().unwrap_or("anonymous"),
            "HTTP request"
        );

        metrics::counter!(
            "lt_http_requests_total",
            "endpoint" => endpoint,
            "status" => status
        )
        .increment(1);
        metrics::histogram!("lt_http_request_duration_seconds", "endpoint" => endpoint)
            .record(elapsed.as_secs_f64());
    }
}
