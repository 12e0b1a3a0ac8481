//! Health validation.
//!
//! Aggregates live target health and load-balancer metrics into a pass/fail
//! verdict. Only the target-health query is structurally required; a metric
//! that cannot be read is reported as unavailable and left out of the
//! evaluation.
//!
//! Checks, in order:
//!
//! | Check                     | Fails verdict | Otherwise |
//! |---------------------------|---------------|-----------|
//! | Target Health             | yes           |           |
//! | HealthyHostCount Metric   | no            | WARN      |
//! | 5XX Errors                | yes           |           |
//! | Response Time             | no            | WARN      |

use crate::config::HealthThresholds;
use crate::errors::ChaosError;
use crate::models::{
    CheckEvaluation, CheckStatus, HealthMetrics, HealthValidationResponse, MetricSample,
    TargetHealthDetail, TargetHealthSummary, ValidateHealthRequest, DEFAULT_CHECK_TYPE,
    NOT_AVAILABLE,
};
use crate::observability::metrics::record_health_validation;
use crate::providers::{observed, LoadBalancing, MetricsSource};
use chrono::{Duration as ChronoDuration, Utc};
use common::arn::{load_balancer_short_name, target_group_short_name};
use common::types::{Dimension, MetricQuery, Statistic, TargetHealthRecord, TargetState};
use std::sync::Arc;
use tracing::instrument;

/// Namespace of application load balancer metrics.
pub const ALB_NAMESPACE: &str = "AWS/ApplicationELB";

/// Validates downstream application health.
pub struct HealthValidator {
    load_balancing: Arc<dyn LoadBalancing>,
    metrics: Arc<dyn MetricsSource>,
    thresholds: HealthThresholds,
}

/// Overall outcome of the check sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub healthy: bool,
    pub evaluation: Vec<CheckEvaluation>,
    pub summary: String,
    pub issues: Vec<String>,
}

impl HealthValidator {
    pub fn new(
        load_balancing: Arc<dyn LoadBalancing>,
        metrics: Arc<dyn MetricsSource>,
        thresholds: HealthThresholds,
    ) -> Self {
        Self {
            load_balancing,
            metrics,
            thresholds,
        }
    }

    /// Run one health validation.
    ///
    /// # Errors
    ///
    /// - `ChaosError::Validation` - target group missing, or an ARN is malformed
    /// - `ChaosError::Provider` - the target-health query failed
    #[instrument(skip_all, fields(check_type = ?request.check_type))]
    pub async fn validate(
        &self,
        request: &ValidateHealthRequest,
    ) -> Result<HealthValidationResponse, ChaosError> {
        let check_type = request
            .check_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CHECK_TYPE.to_string());

        let result = self.validate_inner(request, check_type.clone()).await;

        let outcome = match &result {
            Ok(response) if response.healthy => "pass",
            Ok(_) => "fail",
            Err(_) => "error",
        };
        record_health_validation(outcome, &check_type);

        result
    }

    async fn validate_inner(
        &self,
        request: &ValidateHealthRequest,
        check_type: String,
    ) -> Result<HealthValidationResponse, ChaosError> {
        request
            .validate()
            .map_err(|e| ChaosError::Validation(e.to_string()))?;
        let target_group_arn = request
            .target_group_arn
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        let load_balancer_arn = request
            .load_balancer_arn
            .as_deref()
            .map(str::trim)
            .filter(|arn| !arn.is_empty());

        let target_group_name = target_group_short_name(target_group_arn)
            .map_err(|e| ChaosError::Validation(format!("Invalid targetGroupArn: {e}")))?;
        let load_balancer_name = load_balancer_arn
            .map(load_balancer_short_name)
            .transpose()
            .map_err(|e| ChaosError::Validation(format!("Invalid loadBalancerArn: {e}")))?;

        let expected = request
            .expected_healthy_hosts
            .unwrap_or(self.thresholds.default_expected_healthy_hosts);

        tracing::info!(
            target: "chaos.services.health_validator",
            check_type = %check_type,
            target_group = %target_group_name,
            expected_healthy = expected,
            "Validating system health"
        );

        let records = observed(
            "elbv2",
            "describe_target_health",
            self.load_balancing.describe_target_health(target_group_arn),
        )
        .await?;

        let mut metrics = HealthMetrics {
            target_health: summarize_target_health(&records),
            ..HealthMetrics::default()
        };

        if let Some(lb_name) = &load_balancer_name {
            self.collect_metrics(&mut metrics, &target_group_name, lb_name)
                .await;
        }

        let verdict = evaluate(&metrics, expected, &self.thresholds);

        tracing::info!(
            target: "chaos.services.health_validator",
            check_type = %check_type,
            healthy = verdict.healthy,
            summary = %verdict.summary,
            "Health validation complete"
        );

        Ok(HealthValidationResponse {
            check_type,
            health_status: if verdict.healthy {
                CheckStatus::Pass
            } else {
                CheckStatus::Fail
            },
            healthy: verdict.healthy,
            timestamp: Utc::now(),
            metrics,
            evaluation: verdict.evaluation,
            summary: verdict.summary,
            issues: verdict.issues,
        })
    }

    async fn collect_metrics(
        &self,
        metrics: &mut HealthMetrics,
        target_group_name: &str,
        load_balancer_name: &str,
    ) {
        let both = || {
            vec![
                Dimension::new("TargetGroup", target_group_name),
                Dimension::new("LoadBalancer", load_balancer_name),
            ]
        };
        let lb_only = || vec![Dimension::new("LoadBalancer", load_balancer_name)];

        metrics.healthy_host_count = Some(
            self.sample("HealthyHostCount", both(), Statistic::Average)
                .await,
        );
        metrics.unhealthy_host_count = Some(
            self.sample("UnHealthyHostCount", both(), Statistic::Average)
                .await,
        );
        metrics.target_5xx_errors = Some(
            self.sample("HTTPCode_Target_5XX_Count", lb_only(), Statistic::Sum)
                .await,
        );
        metrics.response_time = Some(
            self.sample("TargetResponseTime", lb_only(), Statistic::Average)
                .await,
        );
        metrics.request_count = Some(
            self.sample("RequestCount", lb_only(), Statistic::Sum)
                .await,
        );
    }

    /// Latest datapoint over the lookback window.
    async fn sample(
        &self,
        metric_name: &str,
        dimensions: Vec<Dimension>,
        statistic: Statistic,
    ) -> MetricSample {
        let end_time = Utc::now();
        let start_time =
            end_time - ChronoDuration::seconds(i64::from(self.thresholds.metric_lookback_seconds));

        let query = MetricQuery {
            namespace: ALB_NAMESPACE.to_string(),
            metric_name: metric_name.to_string(),
            dimensions,
            statistic,
            start_time,
            end_time,
            period_seconds: self.thresholds.metric_period_seconds,
        };

        let datapoints = match observed(
            "cloudwatch",
            "get_metric_statistics",
            self.metrics.get_metric_statistics(&query),
        )
        .await
        {
            Ok(datapoints) => datapoints,
            Err(e) => {
                tracing::warn!(
                    target: "chaos.services.health_validator",
                    metric = %metric_name,
                    error = %e,
                    "Metric query failed"
                );
                return MetricSample::errored(e.to_string());
            }
        };

        match datapoints.into_iter().max_by_key(|d| d.timestamp) {
            Some(latest) => {
                tracing::debug!(
                    target: "chaos.services.health_validator",
                    metric = %metric_name,
                    value = latest.value,
                    "Metric sampled"
                );
                MetricSample::observed(latest.value, latest.timestamp, latest.unit)
            }
            None => {
                tracing::warn!(
                    target: "chaos.services.health_validator",
                    metric = %metric_name,
                    "No datapoints found"
                );
                MetricSample::unavailable()
            }
        }
    }
}

/// Count targets per state.
pub fn summarize_target_health(records: &[TargetHealthRecord]) -> TargetHealthSummary {
    let count = |state: TargetState| records.iter().filter(|r| r.state == state).count();

    TargetHealthSummary {
        healthy: count(TargetState::Healthy),
        unhealthy: count(TargetState::Unhealthy),
        draining: count(TargetState::Draining),
        unused: count(TargetState::Unused),
        total: records.len(),
        details: records
            .iter()
            .map(|r| TargetHealthDetail {
                target_id: r.target_id.clone(),
                state: r.state.clone(),
                reason: r
                    .reason
                    .clone()
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            })
            .collect(),
    }
}

fn check(name: &str, status: CheckStatus, details: String) -> CheckEvaluation {
    CheckEvaluation {
        check: name.to_string(),
        status,
        details,
    }
}

/// Evaluate the fixed check sequence.
pub fn evaluate(metrics: &HealthMetrics, expected: u32, thresholds: &HealthThresholds) -> Verdict {
    let mut evaluation = Vec::new();
    let mut issues = Vec::new();
    let mut healthy = true;

    let healthy_count = metrics.target_health.healthy;
    let unhealthy_count = metrics.target_health.unhealthy;

    if healthy_count >= expected as usize {
        evaluation.push(check(
            "Target Health",
            CheckStatus::Pass,
            format!("{healthy_count} healthy targets (expected >= {expected})"),
        ));
    } else {
        evaluation.push(check(
            "Target Health",
            CheckStatus::Fail,
            format!("Only {healthy_count} healthy targets (expected >= {expected})"),
        ));
        healthy = false;
        issues.push(format!(
            "Insufficient healthy targets: {healthy_count}/{expected}"
        ));
    }

    if unhealthy_count > 0 {
        issues.push(format!("{unhealthy_count} unhealthy targets detected"));
    }

    if let Some(value) = usable(metrics.healthy_host_count.as_ref()) {
        if value >= f64::from(expected) {
            evaluation.push(check(
                "HealthyHostCount Metric",
                CheckStatus::Pass,
                format!("CloudWatch reports {value} healthy hosts"),
            ));
        } else {
            evaluation.push(check(
                "HealthyHostCount Metric",
                CheckStatus::Warn,
                format!("CloudWatch reports {value} healthy hosts (expected >= {expected})"),
            ));
        }
    }

    if let Some(errors) = usable(metrics.target_5xx_errors.as_ref()) {
        let max = thresholds.max_5xx_errors;
        if errors <= f64::from(max) {
            evaluation.push(check(
                "5XX Errors",
                CheckStatus::Pass,
                format!("{errors} errors (threshold: {max})"),
            ));
        } else {
            evaluation.push(check(
                "5XX Errors",
                CheckStatus::Fail,
                format!("{errors} errors exceeds threshold of {max}"),
            ));
            healthy = false;
            issues.push(format!("High error rate: {errors} 5XX errors"));
        }
    }

    if let Some(seconds) = usable(metrics.response_time.as_ref()) {
        let max = thresholds.max_response_time_ms;
        let millis = seconds * 1000.0;
        if millis <= f64::from(max) {
            evaluation.push(check(
                "Response Time",
                CheckStatus::Pass,
                format!("{millis:.2}ms (threshold: {max}ms)"),
            ));
        } else {
            evaluation.push(check(
                "Response Time",
                CheckStatus::Warn,
                format!("{millis:.2}ms exceeds threshold of {max}ms"),
            ));
            issues.push(format!("High response time: {millis:.2}ms"));
        }
    }

    let summary = if healthy {
        format!("System is HEALTHY: {healthy_count} targets healthy, all checks passed")
    } else {
        format!("System is UNHEALTHY: {}", issues.join(", "))
    };

    Verdict {
        healthy,
        evaluation,
        summary,
        issues,
    }
}

fn usable(sample: Option<&MetricSample>) -> Option<f64> {
    sample.and_then(MetricSample::usable_value)
}
