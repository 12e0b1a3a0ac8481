//! System health snapshot for the configured deployment.
//!
//! A dashboard-style summary of one scaling group, target group and load
//! balancer. Provider failures never surface as errors here: the snapshot
//! degrades to `critical` with a load-balancer status of `"error"`.

use crate::models::{SystemHealthResponse, SystemStatus};
use crate::providers::{observed, Providers};
use chrono::Utc;
use common::arn::ResourceArn;
use common::error::ProviderError;
use common::types::TargetState;
use tracing::instrument;

/// Load-balancer status reported when no load balancer is configured or it
/// is not visible.
pub const UNKNOWN_LB_STATUS: &str = "unknown";

/// Load-balancer status reported when any provider call failed.
pub const ERROR_LB_STATUS: &str = "error";

/// Reports on the configured deployment.
pub struct SystemHealthService {
    providers: Providers,
    scaling_group_name: String,
    target_group_arn: Option<ResourceArn>,
    load_balancer_arn: Option<ResourceArn>,
}

impl SystemHealthService {
    pub fn new(
        providers: Providers,
        scaling_group_name: impl Into<String>,
        target_group_arn: Option<ResourceArn>,
        load_balancer_arn: Option<ResourceArn>,
    ) -> Self {
        Self {
            providers,
            scaling_group_name: scaling_group_name.into(),
            target_group_arn,
            load_balancer_arn,
        }
    }

    /// Take a snapshot. Never fails.
    #[instrument(skip_all, fields(group = %self.scaling_group_name))]
    pub async fn snapshot(&self) -> SystemHealthResponse {
        match self.try_snapshot().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    target: "chaos.services.system_health",
                    error = %e,
                    "System health snapshot failed"
                );
                SystemHealthResponse {
                    status: SystemStatus::Critical,
                    target_instance_count: 0,
                    healthy_instances: 0,
                    load_balancer_status: ERROR_LB_STATUS.to_string(),
                    last_checked: Utc::now(),
                }
            }
        }
    }

    async fn try_snapshot(&self) -> Result<SystemHealthResponse, ProviderError> {
        let group = observed(
            "autoscaling",
            "describe_auto_scaling_groups",
            self.providers
                .compute
                .describe_scaling_group(&self.scaling_group_name),
        )
        .await?;

        let (desired, group_healthy) = match &group {
            Some(group) => (
                group.desired_capacity.unwrap_or(0),
                count_u32(
                    group
                        .instances
                        .iter()
                        .filter(|i| i.health_status == "Healthy")
                        .count(),
                ),
            ),
            None => {
                tracing::warn!(
                    target: "chaos.services.system_health",
                    group = %self.scaling_group_name,
                    "Scaling group not found"
                );
                (0, 0)
            }
        };

        let target_group_healthy = match &self.target_group_arn {
            Some(arn) => {
                let records = observed(
                    "elbv2",
                    "describe_target_health",
                    self.providers
                        .load_balancing
                        .describe_target_health(&arn.to_string()),
                )
                .await?;
                count_u32(
                    records
                        .iter()
                        .filter(|r| r.state == TargetState::Healthy)
                        .count(),
                )
            }
            None => 0,
        };

        let load_balancer_status = match &self.load_balancer_arn {
            Some(arn) => observed(
                "elbv2",
                "describe_load_balancers",
                self.providers
                    .load_balancing
                    .describe_load_balancer_state(&arn.to_string()),
            )
            .await?
            .unwrap_or_else(|| UNKNOWN_LB_STATUS.to_string()),
            None => UNKNOWN_LB_STATUS.to_string(),
        };

        let status = SystemStatus::classify(group_healthy, desired);

        tracing::debug!(
            target: "chaos.services.system_health",
            status = status.as_str(),
            desired = desired,
            group_healthy = group_healthy,
            target_group_healthy = target_group_healthy,
            "System health snapshot taken"
        );

        Ok(SystemHealthResponse {
            status,
            target_instance_count: desired,
            healthy_instances: group_healthy.max(target_group_healthy),
            load_balancer_status,
            last_checked: Utc::now(),
        })
    }
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
