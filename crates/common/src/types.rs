//! Cloud resource records read from the compute, load-balancing and metrics
//! providers.
//!
//! None of these are owned by the toolkit: they are fetched fresh for every
//! request and discarded afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scaling-group health status of an instance that may be selected.
pub const HEALTH_STATUS_HEALTHY: &str = "Healthy";

/// Scaling-group lifecycle state of an instance that may be selected.
pub const LIFECYCLE_IN_SERVICE: &str = "InService";

/// Instance states for which a termination request would be a no-op.
pub const TERMINAL_INSTANCE_STATES: [&str; 3] = ["terminated", "terminating", "shutting-down"];

/// Returns true if a tag value counts as "true" (case-insensitive).
#[must_use]
pub fn is_true_like(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// A key/value tag attached to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An instance as reported by its scaling group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInstance {
    pub instance_id: String,
    pub availability_zone: String,
    /// `Healthy` or `Unhealthy`.
    pub health_status: String,
    /// `Pending`, `InService`, `Terminating`, ...
    pub lifecycle_state: String,
}

impl GroupInstance {
    /// Healthy and in service: the precondition for chaos selection.
    #[must_use]
    pub fn is_healthy_in_service(&self) -> bool {
        self.health_status == HEALTH_STATUS_HEALTHY && self.lifecycle_state == LIFECYCLE_IN_SERVICE
    }
}

/// A scaling group and its ordered member instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingGroup {
    pub name: String,
    pub desired_capacity: Option<u32>,
    pub instances: Vec<GroupInstance>,
}

/// Point-in-time details of a single instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDetails {
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_time: Option<DateTime<Utc>>,
    /// Instance state name (`pending`, `running`, `shutting-down`, `terminated`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    pub tags: Vec<Tag>,
}

impl InstanceDetails {
    /// Value of the first tag with the given key.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// True if any tag with `tag_key` carries a true-like value.
    #[must_use]
    pub fn is_chaos_target(&self, tag_key: &str) -> bool {
        self.tags
            .iter()
            .any(|t| t.key == tag_key && is_true_like(&t.value))
    }

    /// True if the instance is already terminated or on its way there.
    #[must_use]
    pub fn is_terminating(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| TERMINAL_INSTANCE_STATES.contains(&s))
    }
}

/// State transition reported by a termination request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub previous_state: String,
    pub current_state: String,
}

/// Load-balancer view of a target's health.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    Initial,
    Healthy,
    Unhealthy,
    Draining,
    Unused,
    Unavailable,
    #[serde(rename = "unhealthy.draining")]
    UnhealthyDraining,
}

impl TargetState {
    /// Parse a provider state string. Unknown values map to `Unavailable`.
    #[must_use]
    pub fn from_provider(value: &str) -> Self {
        match value {
            "initial" => TargetState::Initial,
            "healthy" => TargetState::Healthy,
            "unhealthy" => TargetState::Unhealthy,
            "draining" => TargetState::Draining,
            "unused" => TargetState::Unused,
            "unhealthy.draining" => TargetState::UnhealthyDraining,
            _ => TargetState::Unavailable,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetState::Initial => "initial",
            TargetState::Healthy => "healthy",
            TargetState::Unhealthy => "unhealthy",
            TargetState::Draining => "draining",
            TargetState::Unused => "unused",
            TargetState::Unavailable => "unavailable",
            TargetState::UnhealthyDraining => "unhealthy.draining",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-target health record from the load-balancing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHealthRecord {
    pub target_id: String,
    pub state: TargetState,
    pub reason: Option<String>,
}

/// Aggregation applied to a metric over one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Average,
    Sum,
    Minimum,
    Maximum,
}

impl Statistic {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
        }
    }
}

/// A metric dimension (name/value pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single statistic query over a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub statistic: Statistic,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub period_seconds: u32,
}

/// One aggregated value returned for a metric query.
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: Option<String>,
}
