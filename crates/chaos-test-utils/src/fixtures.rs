//! Fixture builders for provider records.

use chrono::{Duration, TimeZone, Utc};
use common::types::{
    Datapoint, GroupInstance, InstanceDetails, ScalingGroup, Tag, TargetHealthRecord, TargetState,
};

/// Default chaos tag key used by the fixtures.
pub const CHAOS_TAG: &str = "ChaosTarget";

/// Builder for [`InstanceDetails`].
///
/// Defaults to a running `t3.micro` in `us-east-1a` with no tags.
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    details: InstanceDetails,
}

impl InstanceBuilder {
    pub fn new(instance_id: &str) -> Self {
        Self {
            details: InstanceDetails {
                instance_id: instance_id.to_string(),
                instance_type: Some("t3.micro".to_string()),
                private_ip_address: Some("10.0.1.10".to_string()),
                public_ip_address: None,
                launch_time: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).single(),
                state: Some("running".to_string()),
                availability_zone: Some("us-east-1a".to_string()),
                subnet_id: Some("subnet-0a1b2c3d".to_string()),
                vpc_id: Some("vpc-0a1b2c3d".to_string()),
                tags: Vec::new(),
            },
        }
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.details.tags.push(Tag::new(key, value));
        self
    }

    /// Tag with `ChaosTarget=true`.
    pub fn chaos_target(self) -> Self {
        self.tag(CHAOS_TAG, "true")
    }

    pub fn state(mut self, state: &str) -> Self {
        self.details.state = Some(state.to_string());
        self
    }

    pub fn zone(mut self, zone: &str) -> Self {
        self.details.availability_zone = Some(zone.to_string());
        self
    }

    /// Drop the optional enrichment fields.
    pub fn sparse(mut self) -> Self {
        self.details.instance_type = None;
        self.details.private_ip_address = None;
        self.details.launch_time = None;
        self
    }

    pub fn build(self) -> InstanceDetails {
        self.details
    }
}

/// A running instance tagged `ChaosTarget=true`.
pub fn tagged_instance(instance_id: &str) -> InstanceDetails {
    InstanceBuilder::new(instance_id).chaos_target().build()
}

/// A running instance with no chaos tag.
pub fn untagged_instance(instance_id: &str) -> InstanceDetails {
    InstanceBuilder::new(instance_id)
        .tag("Name", "web-server")
        .build()
}

/// A scaling-group member.
pub fn member(instance_id: &str, health_status: &str, lifecycle_state: &str) -> GroupInstance {
    GroupInstance {
        instance_id: instance_id.to_string(),
        availability_zone: "us-east-1a".to_string(),
        health_status: health_status.to_string(),
        lifecycle_state: lifecycle_state.to_string(),
    }
}

/// A healthy, in-service member.
pub fn healthy_member(instance_id: &str) -> GroupInstance {
    member(instance_id, "Healthy", "InService")
}

/// A scaling group whose desired capacity equals its member count.
pub fn group(name: &str, members: Vec<GroupInstance>) -> ScalingGroup {
    ScalingGroup {
        name: name.to_string(),
        desired_capacity: u32::try_from(members.len()).ok(),
        instances: members,
    }
}

/// A target-health record.
pub fn target(target_id: &str, state: TargetState) -> TargetHealthRecord {
    let reason = match state {
        TargetState::Unhealthy => Some("Target.FailedHealthChecks".to_string()),
        TargetState::Draining => Some("Target.DeregistrationInProgress".to_string()),
        _ => None,
    };
    TargetHealthRecord {
        target_id: target_id.to_string(),
        state,
        reason,
    }
}

/// `healthy` healthy targets followed by `unhealthy` unhealthy ones.
pub fn targets(healthy: usize, unhealthy: usize) -> Vec<TargetHealthRecord> {
    (0..healthy)
        .map(|i| target(&format!("i-healthy{i}"), TargetState::Healthy))
        .chain((0..unhealthy).map(|i| target(&format!("i-unhealthy{i}"), TargetState::Unhealthy)))
        .collect()
}

/// A datapoint `minutes_ago` minutes in the past.
pub fn datapoint(value: f64, minutes_ago: i64) -> Datapoint {
    Datapoint {
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
        value,
        unit: None,
    }
}

/// Target group ARN used across the integration suite.
pub const TARGET_GROUP_ARN: &str =
    "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/web-tg/50dc6c495c0c9188";

/// Load balancer ARN used across the integration suite.
pub const LOAD_BALANCER_ARN: &str =
    "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/web-alb/50dc6c495c0c9188";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_instance_is_chaos_target() {
        assert!(tagged_instance("i-1").is_chaos_target(CHAOS_TAG));
        assert!(!untagged_instance("i-1").is_chaos_target(CHAOS_TAG));
    }

    #[test]
    fn test_targets_counts() {
        let records = targets(2, 1);
        assert_eq!(records.len(), 3);
        assert_eq!(
            records
                .iter()
                .filter(|r| r.state == TargetState::Healthy)
                .count(),
            2
        );
    }

    #[test]
    fn test_group_desired_matches_members() {
        let g = group("web-asg", vec![healthy_member("i-1"), healthy_member("i-2")]);
        assert_eq!(g.desired_capacity, Some(2));
    }
}
