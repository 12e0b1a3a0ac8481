//! Cloud provider capabilities.
//!
//! Each experiment step talks to at most three external APIs: the compute
//! fleet (scaling groups and instances), the load balancer (target health)
//! and the metrics time-series store. They are modelled as traits and
//! injected into the services at construction.
//!
//! Implementations:
//! - [`mock`]: in-memory fakes with call counters and failure injection
//! - `aws` (feature `aws`): adapters over the AWS SDK clients

use crate::observability::metrics::record_provider_call;
use common::error::ProviderResult;
use common::types::{
    Datapoint, InstanceDetails, MetricQuery, ScalingGroup, StateChange, TargetHealthRecord,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "aws")]
pub mod aws;
pub mod mock;

/// Scaling groups and instances.
#[async_trait::async_trait]
pub trait ComputeFleet: Send + Sync {
    /// Describe a scaling group. `Ok(None)` if it does not exist.
    async fn describe_scaling_group(&self, name: &str) -> ProviderResult<Option<ScalingGroup>>;

    /// Describe a single instance. `Ok(None)` if it does not exist or is not
    /// visible to the caller.
    async fn describe_instance(&self, instance_id: &str)
        -> ProviderResult<Option<InstanceDetails>>;

    /// Request termination of an instance.
    async fn terminate_instance(&self, instance_id: &str) -> ProviderResult<StateChange>;
}

/// Load-balancer health queries.
#[async_trait::async_trait]
pub trait LoadBalancing: Send + Sync {
    /// Current health of every target registered with a target group.
    async fn describe_target_health(
        &self,
        target_group_arn: &str,
    ) -> ProviderResult<Vec<TargetHealthRecord>>;

    /// State code of a load balancer (`active`, `provisioning`, ...).
    async fn describe_load_balancer_state(
        &self,
        load_balancer_arn: &str,
    ) -> ProviderResult<Option<String>>;
}

/// Metric statistics over a time window.
#[async_trait::async_trait]
pub trait MetricsSource: Send + Sync {
    /// All datapoints for the query, in no particular order.
    async fn get_metric_statistics(&self, query: &MetricQuery) -> ProviderResult<Vec<Datapoint>>;
}

/// The provider set handed to every service.
#[derive(Clone)]
pub struct Providers {
    pub compute: Arc<dyn ComputeFleet>,
    pub load_balancing: Arc<dyn LoadBalancing>,
    pub metrics: Arc<dyn MetricsSource>,
}

impl Providers {
    pub fn new(
        compute: Arc<dyn ComputeFleet>,
        load_balancing: Arc<dyn LoadBalancing>,
        metrics: Arc<dyn MetricsSource>,
    ) -> Self {
        Self {
            compute,
            load_balancing,
            metrics,
        }
    }
}

/// Await a provider call, recording its outcome and latency.
///
/// `provider` and `operation` must be static, bounded labels.
pub async fn observed<T, F>(
    provider: &'static str,
    operation: &'static str,
    call: F,
) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    let start = Instant::now();
    let result = call.await;
    let status = if result.is_ok() { "success" } else { "error" };
    record_provider_call(provider, operation, status, start.elapsed());
    result
}
