use std::sync::OnceLock;
use std::time::Duration;

use axum::{Router, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

static METRICS_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if metrics are enabled via METRICS_ENABLED env var
pub fn is_metrics_enabled() -> bool {
    *METRICS_ENABLED.get_or_init(|| {
        std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
/// Returns None if metrics are disabled or a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_metrics_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0,
            ],
        )
        .and_then(|builder| builder.install_recorder());

    let handle = match handle {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed, metrics disabled");
            return None;
        }
    };

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Router exposing `/metrics` in the Prometheus text format.
pub fn metrics_router<S>(handle: PrometheusHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Holds one slot of `http_requests_active` until dropped, so a request
/// whose future is cancelled still gives its slot back.
#[must_use]
pub struct ActiveRequest {
    tracked: bool,
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        if self.tracked {
            gauge!("http_requests_active").decrement(1.0);
        }
    }
}

pub fn request_started() -> ActiveRequest {
    let tracked = is_metrics_enabled();
    if tracked {
        gauge!("http_requests_active").increment(1.0);
    }
    ActiveRequest { tracked }
}

pub fn request_finished(route: &'static str, method: &str, status: u16, latency: Duration) {
    if !is_metrics_enabled() {
        return;
    }

    let method = method.to_owned();
    counter!(
        "http_requests_total",
        "route" => route,
        "method" => method.clone(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("http_request_duration_seconds", "route" => route, "method" => method)
        .record(latency.as_secs_f64());

    let status_category = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("http_requests_by_status", "status_category" => status_category).increment(1);
}

// Business metrics helpers

pub fn track_purchase_created() {
    if !is_metrics_enabled() {
        return;
    }
    counter!("purchases_created_total").increment(1);
}

pub fn track_purchase_updated(fields: usize) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("purchases_updated_total").increment(1);
    histogram!("purchase_update_fields").record(fields as f64);
}

pub fn track_purchase_removed(changed: bool) {
    if !is_metrics_enabled() {
        return;
    }
    let outcome = if changed { "removed" } else { "unchanged" };
    counter!("purchases_removed_total", "outcome" => outcome).increment(1);
}
