//! # Prometheus Metrics
//!
//! Operational metrics for the banking API, scraped from the `/metrics`
//! endpoint on the dedicated metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] under the
//! `centra` namespace so they never collide with default-registry users.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the server.
///
/// Clone-friendly (prometheus handles are internally shared) so it can be
/// passed to request handlers and background tasks alike.
#[derive(Clone)]
pub struct BankMetrics {
    registry: Registry,
    /// Total transaction records appended to the ledger.
    pub transactions_posted_total: IntCounter,
    /// Total deposits applied (customer-facing and admin).
    pub deposits_total: IntCounter,
    /// Total peer transfers committed.
    pub transfers_total: IntCounter,
    /// Money-movement operations rejected by validation or sufficiency
    /// checks (insufficient funds, bad amount, unknown recipient).
    pub rejected_operations_total: IntCounter,
    /// Accounts opened since process start.
    pub accounts_created_total: IntCounter,
    /// Live sessions right now.
    pub active_sessions: IntGauge,
    /// Accounts on file (sampled after mutations).
    pub accounts_total: IntGauge,
    /// End-to-end money-movement latency in seconds.
    pub operation_latency_seconds: Histogram,
}

impl BankMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("centra".into()), None)
            .expect("failed to create prometheus registry");

        fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
            let c = IntCounter::new(name, help).expect("metric creation");
            registry.register(Box::new(c.clone())).expect("metric registration");
            c
        }

        fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
            let g = IntGauge::new(name, help).expect("metric creation");
            registry.register(Box::new(g.clone())).expect("metric registration");
            g
        }

        let transactions_posted_total = counter(
            &registry,
            "transactions_posted_total",
            "Total transaction records appended to the ledger",
        );
        let deposits_total = counter(&registry, "deposits_total", "Total deposits applied");
        let transfers_total =
            counter(&registry, "transfers_total", "Total peer transfers committed");
        let rejected_operations_total = counter(
            &registry,
            "rejected_operations_total",
            "Money-movement operations rejected before committing",
        );
        let accounts_created_total = counter(
            &registry,
            "accounts_created_total",
            "Accounts opened since process start",
        );
        let active_sessions = gauge(&registry, "active_sessions", "Live customer sessions");
        let accounts_total = gauge(&registry, "accounts_total", "Accounts on file");

        let operation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "operation_latency_seconds",
                "End-to-end money-movement operation latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            transactions_posted_total,
            deposits_total,
            transfers_total,
            rejected_operations_total,
            accounts_created_total,
            active_sessions,
            accounts_total,
            operation_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for BankMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<BankMetrics>;

/// Axum handler rendering `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_encode() {
        let metrics = BankMetrics::new();
        metrics.transfers_total.inc();
        metrics.active_sessions.set(3);

        let body = metrics.encode().expect("encode");
        assert!(body.contains("centra_transfers_total 1"));
        assert!(body.contains("centra_active_sessions 3"));
    }
}
