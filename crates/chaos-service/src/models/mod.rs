//! Chaos Service models.
//!
//! Request and response types for the three experiment steps and the
//! operational endpoints. Wire names are camelCase.

use chrono::{DateTime, Utc};
use common::types::{InstanceDetails, TargetState};
use serde::{Deserialize, Serialize};

/// Placeholder for a field the providers did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Check-type label used when the caller does not supply one.
pub const DEFAULT_CHECK_TYPE: &str = "unknown";

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

// ============================================================================
// Target selection
// ============================================================================

/// Request body for `POST /api/v1/targets/select`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTargetRequest {
    pub auto_scaling_group_name: Option<String>,
}

impl SelectTargetRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(self.auto_scaling_group_name.as_deref()) {
            return Err("Missing required parameter: autoScalingGroupName");
        }
        Ok(())
    }
}

/// The randomly chosen instance.
///
/// Enrichment fields (`privateIpAddress`, `instanceType`, `launchTime`) are
/// `"N/A"` when the secondary lookup failed or did not report them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTargetResponse {
    pub instance_id: String,
    pub availability_zone: String,
    pub health_status: String,
    pub lifecycle_state: String,
    pub private_ip_address: String,
    pub instance_type: String,
    pub launch_time: String,
    /// False when the enrichment lookup failed outright.
    pub details_available: bool,
    /// Size of the eligible pool at selection time.
    pub total_healthy_instances: usize,
    pub auto_scaling_group_name: String,
    pub message: String,
}

// ============================================================================
// Failure injection
// ============================================================================

/// Request body for `POST /api/v1/failures/inject`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectFailureRequest {
    pub instance_id: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl InjectFailureRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(self.instance_id.as_deref()) {
            return Err("Missing required parameter: instanceId");
        }
        Ok(())
    }
}

/// What the injector did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionAction {
    /// Instance already terminated or on its way there; nothing issued.
    Skipped,
    /// Dry run passed every check; nothing issued.
    Validated,
    /// Termination request issued.
    Terminated,
}

impl InjectionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InjectionAction::Skipped => "skipped",
            InjectionAction::Validated => "validated",
            InjectionAction::Terminated => "terminated",
        }
    }
}

/// Result of a failure injection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectFailureResponse {
    pub instance_id: String,
    pub action: InjectionAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    pub previous_state: String,
    pub current_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    /// Full attribute snapshot, returned on dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_details: Option<InstanceDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chaos_experiment: Option<bool>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Health validation
// ============================================================================

/// Request body for `POST /api/v1/health/validate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateHealthRequest {
    pub target_group_arn: Option<String>,
    pub load_balancer_arn: Option<String>,
    pub expected_healthy_hosts: Option<u32>,
    pub check_type: Option<String>,
}

impl ValidateHealthRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if is_blank(self.target_group_arn.as_deref()) {
            return Err("Missing required parameter: targetGroupArn");
        }
        Ok(())
    }
}

/// Outcome of a single health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Warn => "WARN",
        }
    }
}

/// One named check in a health verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckEvaluation {
    pub check: String,
    pub status: CheckStatus,
    pub details: String,
}

/// Per-target health detail. A missing reason is reported as `"N/A"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHealthDetail {
    pub target_id: String,
    pub state: TargetState,
    pub reason: String,
}

/// Live target counts for a target group.
///
/// Targets in `initial`, `unavailable` or `unhealthy.draining` count toward
/// `total` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetHealthSummary {
    pub healthy: usize,
    pub unhealthy: usize,
    pub draining: usize,
    pub unused: usize,
    pub total: usize,
    pub details: Vec<TargetHealthDetail>,
}

/// Most recent value of one metric over the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub value: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricSample {
    pub fn observed(value: f64, timestamp: DateTime<Utc>, unit: Option<String>) -> Self {
        Self {
            value: Some(value),
            timestamp: Some(timestamp),
            available: true,
            unit,
            error: None,
        }
    }

    /// No datapoints in the window.
    pub fn unavailable() -> Self {
        Self {
            value: None,
            timestamp: None,
            available: false,
            unit: None,
            error: None,
        }
    }

    /// The query itself failed.
    pub fn errored(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::unavailable()
        }
    }

    /// Value if the sample is usable for evaluation.
    pub fn usable_value(&self) -> Option<f64> {
        if self.available {
            self.value
        } else {
            None
        }
    }
}

/// Raw signals gathered for a health verdict.
///
/// Metric fields are present only when a load balancer was supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub target_health: TargetHealthSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthy_host_count: Option<MetricSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhealthy_host_count: Option<MetricSample>,
    #[serde(rename = "target5xxErrors", skip_serializing_if = "Option::is_none")]
    pub target_5xx_errors: Option<MetricSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<MetricSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_count: Option<MetricSample>,
}

/// Health verdict returned by `POST /api/v1/health/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthValidationResponse {
    pub check_type: String,
    /// `PASS` or `FAIL`; never `WARN`.
    pub health_status: CheckStatus,
    pub healthy: bool,
    pub timestamp: DateTime<Utc>,
    pub metrics: HealthMetrics,
    pub evaluation: Vec<CheckEvaluation>,
    pub summary: String,
    pub issues: Vec<String>,
}

// ============================================================================
// System health snapshot
// ============================================================================

/// Coarse state of the experiment target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Healthy,
    Degraded,
    Critical,
}

impl SystemStatus {
    /// healthy iff `healthy >= desired`, degraded iff `0 < healthy < desired`.
    pub fn classify(healthy: u32, desired: u32) -> Self {
        if healthy >= desired {
            SystemStatus::Healthy
        } else if healthy > 0 {
            SystemStatus::Degraded
        } else {
            SystemStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Healthy => "healthy",
            SystemStatus::Degraded => "degraded",
            SystemStatus::Critical => "critical",
        }
    }
}

/// Response for `GET /api/v1/system/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealthResponse {
    pub status: SystemStatus,
    pub target_instance_count: u32,
    pub healthy_instances: u32,
    pub load_balancer_status: String,
    pub last_checked: DateTime<Utc>,
}

// ============================================================================
// Operational
// ============================================================================

/// Readiness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_api: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_select_request_requires_group_name() {
        assert!(SelectTargetRequest::default().validate().is_err());

        let blank = SelectTargetRequest {
            auto_scaling_group_name: Some("  ".to_string()),
        };
        assert_eq!(
            blank.validate(),
            Err("Missing required parameter: autoScalingGroupName")
        );

        let ok = SelectTargetRequest {
            auto_scaling_group_name: Some("web-asg".to_string()),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_inject_request_defaults_dry_run_false() {
        let request: InjectFailureRequest =
            serde_json::from_str(r#"{"instanceId":"i-0abc"}"#).unwrap();
        assert_eq!(request.instance_id.as_deref(), Some("i-0abc"));
        assert!(!request.dry_run);
        assert!(request.validate().is_ok());

        let missing: InjectFailureRequest = serde_json::from_str(r#"{"dryRun":true}"#).unwrap();
        assert_eq!(
            missing.validate(),
            Err("Missing required parameter: instanceId")
        );
    }

    #[test]
    fn test_validate_request_camel_case() {
        let request: ValidateHealthRequest = serde_json::from_str(
            r#"{"targetGroupArn":"arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/web/abc",
                "expectedHealthyHosts":3,"checkType":"pre"}"#,
        )
        .unwrap();
        assert_eq!(request.expected_healthy_hosts, Some(3));
        assert_eq!(request.check_type.as_deref(), Some("pre"));
        assert!(request.load_balancer_arn.is_none());
        assert!(request.validate().is_ok());

        assert_eq!(
            ValidateHealthRequest::default().validate(),
            Err("Missing required parameter: targetGroupArn")
        );
    }

    #[test]
    fn test_check_status_serialization() {
        assert_eq!(serde_json::to_value(CheckStatus::Pass).unwrap(), "PASS");
        assert_eq!(serde_json::to_value(CheckStatus::Warn).unwrap(), "WARN");
        assert_eq!(serde_json::to_value(InjectionAction::Validated).unwrap(), "validated");
    }

    #[test]
    fn test_metric_sample_variants() {
        let sample = MetricSample::unavailable();
        assert!(!sample.available);
        assert_eq!(sample.usable_value(), None);

        let errored = MetricSample::errored("Throttling: Rate exceeded");
        assert!(!errored.available);
        assert_eq!(errored.error.as_deref(), Some("Throttling: Rate exceeded"));

        let observed = MetricSample::observed(2.5, Utc::now(), Some("Seconds".to_string()));
        assert_eq!(observed.usable_value(), Some(2.5));
    }

    #[test]
    fn test_health_metrics_field_names() {
        let metrics = HealthMetrics {
            target_5xx_errors: Some(MetricSample::unavailable()),
            ..HealthMetrics::default()
        };
        let json = serde_json::to_value(&metrics).unwrap();

        assert!(json.get("targetHealth").is_some());
        assert_eq!(json["target5xxErrors"]["available"], false);
        assert!(json.get("responseTime").is_none());
    }

    #[test]
    fn test_system_status_classification() {
        assert_eq!(SystemStatus::classify(3, 2), SystemStatus::Healthy);
        assert_eq!(SystemStatus::classify(2, 2), SystemStatus::Healthy);
        assert_eq!(SystemStatus::classify(1, 2), SystemStatus::Degraded);
        assert_eq!(SystemStatus::classify(0, 2), SystemStatus::Critical);
        assert_eq!(SystemStatus::classify(0, 0), SystemStatus::Healthy);
    }
}
