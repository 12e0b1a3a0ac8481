//! Metrics definitions for the Chaos Service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `chaos_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: the fixed route table, everything else is `/other`
//! - `status`: success, error, timeout (plus outcome labels per metric)
//! - `provider`, `operation`: static strings chosen at the call site
//! - `check_type`: `pre`, `post` or `other`; callers may send free-form labels

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("chaos_http_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Cloud API latency: tens of milliseconds to a few seconds
        .set_buckets_for_metric(
            Matcher::Prefix("chaos_provider_call".to_string()),
            &[0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000],
        )
        .map_err(|e| format!("Failed to set provider call buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `chaos_http_requests_total`, `chaos_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level rejections (404, 405, 415) as well as handler
/// responses.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("chaos_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("chaos_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path onto the fixed route table.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/api/v1/targets/select" => "/api/v1/targets/select",
        "/api/v1/failures/inject" => "/api/v1/failures/inject",
        "/api/v1/health/validate" => "/api/v1/health/validate",
        "/api/v1/system/health" => "/api/v1/system/health",
        _ => "/other",
    }
}

// ============================================================================
// Experiment Step Metrics
// ============================================================================

/// Record a target selection outcome and, when known, the eligible pool size.
///
/// Metric: `chaos_target_selections_total`, `chaos_eligible_targets`
/// Labels: `status` (selected, no_eligible_targets, error)
pub fn record_target_selection(status: &'static str, eligible: Option<usize>) {
    counter!("chaos_target_selections_total", "status" => status).increment(1);

    if let Some(eligible) = eligible {
        #[allow(clippy::cast_precision_loss)]
        gauge!("chaos_eligible_targets").set(eligible as f64);
    }
}

/// Record a failure injection outcome.
///
/// Metric: `chaos_failure_injections_total`
/// Labels: `action` (skipped, validated, terminated, refused, error)
pub fn record_failure_injection(action: &'static str) {
    counter!("chaos_failure_injections_total", "action" => action).increment(1);
}

/// Record a health validation verdict.
///
/// Metric: `chaos_health_validations_total`
/// Labels: `result` (pass, fail, error), `check_type`
pub fn record_health_validation(result: &'static str, check_type: &str) {
    counter!("chaos_health_validations_total",
        "result" => result,
        "check_type" => bounded_check_type(check_type)
    )
    .increment(1);
}

fn bounded_check_type(check_type: &str) -> &'static str {
    match check_type {
        "pre" => "pre",
        "post" => "post",
        _ => "other",
    }
}

// ============================================================================
// Provider Metrics
// ============================================================================

/// Record a cloud provider API call.
///
/// Metric: `chaos_provider_calls_total`, `chaos_provider_call_duration_seconds`
/// Labels: `provider`, `operation`, `status` (success, error)
pub fn record_provider_call(
    provider: &'static str,
    operation: &'static str,
    status: &'static str,
    duration: Duration,
) {
    histogram!("chaos_provider_call_duration_seconds",
        "provider" => provider,
        "operation" => operation
    )
    .record(duration.as_secs_f64());

    counter!("chaos_provider_calls_total",
        "provider" => provider,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    // Recording without an installed recorder is a no-op; these calls only
    // exercise the label construction.
    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, Duration::from_millis(5));
        record_http_request("POST", "/api/v1/targets/select", 409, Duration::from_millis(80));
        record_http_request("POST", "/api/v1/failures/inject", 500, Duration::from_millis(300));
        record_http_request("GET", "/api/v1/unknown", 404, Duration::from_millis(1));
        record_http_request("POST", "/api/v1/health/validate", 504, Duration::from_secs(30));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(299), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(400), "error");
        assert_eq!(categorize_status_code(409), "error");
        assert_eq!(categorize_status_code(500), "error");
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(
            normalize_endpoint("/api/v1/failures/inject"),
            "/api/v1/failures/inject"
        );
        assert_eq!(normalize_endpoint("/api/v1/failures/i-0abc"), "/other");
        assert_eq!(normalize_endpoint("/"), "/other");
    }

    #[test]
    fn test_bounded_check_type() {
        assert_eq!(bounded_check_type("pre"), "pre");
        assert_eq!(bounded_check_type("post"), "post");
        assert_eq!(bounded_check_type("unknown"), "other");
        assert_eq!(bounded_check_type("my-adhoc-label-123"), "other");
    }

    #[test]
    fn test_failure_injection_counter_is_recorded() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_failure_injection("terminated");
            record_failure_injection("terminated");
            record_failure_injection("refused");
        });

        let terminated = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find(|(key, _, _, _)| {
                key.key().name() == "chaos_failure_injections_total"
                    && key
                        .key()
                        .labels()
                        .any(|l| l.key() == "action" && l.value() == "terminated")
            })
            .map(|(_, _, _, value)| value);

        assert_eq!(terminated, Some(DebugValue::Counter(2)));
    }

    #[test]
    fn test_provider_and_step_metrics_do_not_panic() {
        record_provider_call("ec2", "terminate_instances", "success", Duration::from_millis(120));
        record_provider_call("cloudwatch", "get_metric_statistics", "error", Duration::from_millis(40));
        record_target_selection("selected", Some(3));
        record_target_selection("no_eligible_targets", Some(0));
        record_target_selection("error", None);
        record_health_validation("pass", "pre");
        record_health_validation("fail", "whatever");
    }
}
