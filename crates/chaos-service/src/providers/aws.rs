//! Provider adapters backed by the AWS SDK.
//!
//! Auto Scaling and EC2 implement [`ComputeFleet`], Elastic Load Balancing v2
//! implements [`LoadBalancing`], CloudWatch implements [`MetricsSource`].
//! Service error codes and messages are passed through unchanged.

use super::{ComputeFleet, LoadBalancing, MetricsSource, Providers};
use aws_sdk_cloudwatch::primitives::DateTime as SdkDateTime;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use chrono::{DateTime, Utc};
use common::error::{ProviderError, ProviderResult};
use common::types::{
    Datapoint, GroupInstance, InstanceDetails, MetricQuery, ScalingGroup, StateChange, Statistic,
    Tag, TargetHealthRecord, TargetState,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// EC2 error code for an instance id that does not exist.
const INSTANCE_NOT_FOUND_CODE: &str = "InvalidInstanceID.NotFound";

/// ELBv2 error code for a load balancer that does not exist.
const LOAD_BALANCER_NOT_FOUND_CODE: &str = "LoadBalancerNotFound";

/// Convert an SDK error, keeping the service error code and message.
fn provider_error<E>(err: E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    match err.code() {
        Some(code) => ProviderError::new(code, message),
        None => ProviderError::unknown(message),
    }
}

fn from_sdk_time(time: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

fn to_sdk_time(time: DateTime<Utc>) -> SdkDateTime {
    SdkDateTime::from_secs(time.timestamp())
}

/// Build every provider from the ambient AWS configuration.
pub async fn build_providers(region: &str) -> Providers {
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await;

    let compute = AwsComputeFleet {
        autoscaling: aws_sdk_autoscaling::Client::new(&sdk_config),
        ec2: aws_sdk_ec2::Client::new(&sdk_config),
    };
    let load_balancing = AwsLoadBalancing {
        elbv2: aws_sdk_elasticloadbalancingv2::Client::new(&sdk_config),
    };
    let metrics = AwsMetricsSource {
        cloudwatch: aws_sdk_cloudwatch::Client::new(&sdk_config),
    };

    Providers::new(
        Arc::new(compute),
        Arc::new(load_balancing),
        Arc::new(metrics),
    )
}

/// Auto Scaling + EC2.
pub struct AwsComputeFleet {
    autoscaling: aws_sdk_autoscaling::Client,
    ec2: aws_sdk_ec2::Client,
}

fn instance_details(instance: &aws_sdk_ec2::types::Instance) -> Option<InstanceDetails> {
    let instance_id = instance.instance_id()?.to_string();

    let tags = instance
        .tags()
        .iter()
        .filter_map(|t| Some(Tag::new(t.key()?, t.value().unwrap_or_default())))
        .collect();

    Some(InstanceDetails {
        instance_id,
        instance_type: instance.instance_type().map(|t| t.as_str().to_string()),
        private_ip_address: instance.private_ip_address().map(str::to_string),
        public_ip_address: instance.public_ip_address().map(str::to_string),
        launch_time: instance.launch_time().and_then(from_sdk_time),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string()),
        availability_zone: instance
            .placement()
            .and_then(|p| p.availability_zone())
            .map(str::to_string),
        subnet_id: instance.subnet_id().map(str::to_string),
        vpc_id: instance.vpc_id().map(str::to_string),
        tags,
    })
}

#[async_trait::async_trait]
impl ComputeFleet for AwsComputeFleet {
    #[instrument(skip(self), target = "chaos.providers.aws")]
    async fn describe_scaling_group(&self, name: &str) -> ProviderResult<Option<ScalingGroup>> {
        let output = self
            .autoscaling
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(name)
            .send()
            .await
            .map_err(provider_error)?;

        let Some(group) = output.auto_scaling_groups().first() else {
            return Ok(None);
        };

        let instances = group
            .instances()
            .iter()
            .filter_map(|i| {
                Some(GroupInstance {
                    instance_id: i.instance_id()?.to_string(),
                    availability_zone: i.availability_zone().unwrap_or_default().to_string(),
                    health_status: i.health_status().unwrap_or_default().to_string(),
                    lifecycle_state: i
                        .lifecycle_state()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>();

        debug!(
            target: "chaos.providers.aws",
            group = %name,
            instances = instances.len(),
            "Described scaling group"
        );

        Ok(Some(ScalingGroup {
            name: group
                .auto_scaling_group_name()
                .unwrap_or(name)
                .to_string(),
            desired_capacity: group.desired_capacity().and_then(|c| u32::try_from(c).ok()),
            instances,
        }))
    }

    #[instrument(skip(self), target = "chaos.providers.aws")]
    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> ProviderResult<Option<InstanceDetails>> {
        let result = self
            .ec2
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) if err.code() == Some(INSTANCE_NOT_FOUND_CODE) => return Ok(None),
            Err(err) => return Err(provider_error(err)),
        };

        Ok(output
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .find_map(instance_details))
    }

    #[instrument(skip(self), target = "chaos.providers.aws")]
    async fn terminate_instance(&self, instance_id: &str) -> ProviderResult<StateChange> {
        let output = self
            .ec2
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(provider_error)?;

        let state_name = |state: Option<&aws_sdk_ec2::types::InstanceState>| {
            state
                .and_then(|s| s.name())
                .map(|n| n.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        };

        let change = output
            .terminating_instances()
            .first()
            .map(|c| StateChange {
                previous_state: state_name(c.previous_state()),
                current_state: state_name(c.current_state()),
            })
            .unwrap_or_else(|| StateChange {
                previous_state: "unknown".to_string(),
                current_state: "unknown".to_string(),
            });

        debug!(
            target: "chaos.providers.aws",
            instance_id = %instance_id,
            previous = %change.previous_state,
            current = %change.current_state,
            "Termination accepted"
        );

        Ok(change)
    }
}

/// Elastic Load Balancing v2.
pub struct AwsLoadBalancing {
    elbv2: aws_sdk_elasticloadbalancingv2::Client,
}

#[async_trait::async_trait]
impl LoadBalancing for AwsLoadBalancing {
    #[instrument(skip(self), target = "chaos.providers.aws")]
    async fn describe_target_health(
        &self,
        target_group_arn: &str,
    ) -> ProviderResult<Vec<TargetHealthRecord>> {
        let output = self
            .elbv2
            .describe_target_health()
            .target_group_arn(target_group_arn)
            .send()
            .await
            .map_err(provider_error)?;

        Ok(output
            .target_health_descriptions()
            .iter()
            .filter_map(|d| {
                let health = d.target_health();
                Some(TargetHealthRecord {
                    target_id: d.target()?.id()?.to_string(),
                    state: health
                        .and_then(|h| h.state())
                        .map_or(TargetState::Unavailable, |s| {
                            TargetState::from_provider(s.as_str())
                        }),
                    reason: health
                        .and_then(|h| h.reason())
                        .map(|r| r.as_str().to_string()),
                })
            })
            .collect())
    }

    #[instrument(skip(self), target = "chaos.providers.aws")]
    async fn describe_load_balancer_state(
        &self,
        load_balancer_arn: &str,
    ) -> ProviderResult<Option<String>> {
        let result = self
            .elbv2
            .describe_load_balancers()
            .load_balancer_arns(load_balancer_arn)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) if err.code() == Some(LOAD_BALANCER_NOT_FOUND_CODE) => return Ok(None),
            Err(err) => return Err(provider_error(err)),
        };

        Ok(output
            .load_balancers()
            .first()
            .and_then(|lb| lb.state())
            .and_then(|s| s.code())
            .map(|c| c.as_str().to_string()))
    }
}

/// CloudWatch.
pub struct AwsMetricsSource {
    cloudwatch: aws_sdk_cloudwatch::Client,
}

fn sdk_statistic(statistic: Statistic) -> aws_sdk_cloudwatch::types::Statistic {
    use aws_sdk_cloudwatch::types::Statistic as Sdk;
    match statistic {
        Statistic::Average => Sdk::Average,
        Statistic::Sum => Sdk::Sum,
        Statistic::Minimum => Sdk::Minimum,
        Statistic::Maximum => Sdk::Maximum,
    }
}

fn datapoint_value(point: &aws_sdk_cloudwatch::types::Datapoint, statistic: Statistic) -> Option<f64> {
    match statistic {
        Statistic::Average => point.average(),
        Statistic::Sum => point.sum(),
        Statistic::Minimum => point.minimum(),
        Statistic::Maximum => point.maximum(),
    }
}

#[async_trait::async_trait]
impl MetricsSource for AwsMetricsSource {
    #[instrument(
        skip(self, query),
        target = "chaos.providers.aws",
        fields(metric = %query.metric_name)
    )]
    async fn get_metric_statistics(&self, query: &MetricQuery) -> ProviderResult<Vec<Datapoint>> {
        let dimensions = query
            .dimensions
            .iter()
            .map(|d| {
                aws_sdk_cloudwatch::types::Dimension::builder()
                    .name(&d.name)
                    .value(&d.value)
                    .build()
            })
            .collect::<Vec<_>>();

        let period = i32::try_from(query.period_seconds).map_err(|_| {
            ProviderError::unknown(format!("Metric period out of range: {}", query.period_seconds))
        })?;

        let output = self
            .cloudwatch
            .get_metric_statistics()
            .namespace(&query.namespace)
            .metric_name(&query.metric_name)
            .set_dimensions(Some(dimensions))
            .start_time(to_sdk_time(query.start_time))
            .end_time(to_sdk_time(query.end_time))
            .period(period)
            .statistics(sdk_statistic(query.statistic))
            .send()
            .await
            .map_err(provider_error)?;

        // Datapoints without a timestamp or the requested statistic are dropped.
        Ok(output
            .datapoints()
            .iter()
            .filter_map(|p| {
                Some(Datapoint {
                    timestamp: p.timestamp().and_then(from_sdk_time)?,
                    value: datapoint_value(p, query.statistic)?,
                    unit: p.unit().map(|u| u.as_str().to_string()),
                })
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_time_round_trip() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let converted = from_sdk_time(&to_sdk_time(now)).unwrap();
        assert_eq!(converted, now);
    }

    #[test]
    fn test_instance_details_mapping() {
        use aws_sdk_ec2::types::{Instance, InstanceState, InstanceStateName, Placement};

        let instance = Instance::builder()
            .instance_id("i-0abc")
            .private_ip_address("10.0.1.12")
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::ShuttingDown)
                    .build(),
            )
            .placement(Placement::builder().availability_zone("us-east-1b").build())
            .tags(
                aws_sdk_ec2::types::Tag::builder()
                    .key("ChaosTarget")
                    .value("true")
                    .build(),
            )
            .build();

        let details = instance_details(&instance).unwrap();
        assert_eq!(details.instance_id, "i-0abc");
        assert_eq!(details.state.as_deref(), Some("shutting-down"));
        assert_eq!(details.availability_zone.as_deref(), Some("us-east-1b"));
        assert!(details.is_chaos_target("ChaosTarget"));
        assert!(details.is_terminating());
    }
}
