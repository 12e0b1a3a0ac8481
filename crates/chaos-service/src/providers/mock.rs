//! In-memory provider fakes.
//!
//! Used by unit tests, the integration suite and `chaos-test-utils`. Every
//! fake counts its calls so tests can assert that an operation (termination
//! in particular) was never reached.

use super::{ComputeFleet, LoadBalancing, MetricsSource};
use common::error::{ProviderError, ProviderResult};
use common::types::{
    Datapoint, InstanceDetails, MetricQuery, ScalingGroup, StateChange, TargetHealthRecord,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// State reported by the fake right after a termination request.
pub const MOCK_TERMINATING_STATE: &str = "shutting-down";

/// Fake compute fleet.
#[derive(Default)]
pub struct MockComputeFleet {
    groups: RwLock<HashMap<String, ScalingGroup>>,
    instances: RwLock<HashMap<String, InstanceDetails>>,
    group_error: Option<ProviderError>,
    instance_errors: HashMap<String, ProviderError>,
    /// Instance lookups beyond this many calls fail with the given error.
    instance_error_after: Option<(usize, ProviderError)>,
    terminate_error: Option<ProviderError>,
    describe_group_calls: AtomicUsize,
    describe_instance_calls: AtomicUsize,
    terminate_calls: AtomicUsize,
    terminated: RwLock<Vec<String>>,
}

impl MockComputeFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scaling group.
    pub fn with_group(mut self, group: ScalingGroup) -> Self {
        self.groups.get_mut().insert(group.name.clone(), group);
        self
    }

    /// Register an instance.
    pub fn with_instance(mut self, details: InstanceDetails) -> Self {
        self.instances
            .get_mut()
            .insert(details.instance_id.clone(), details);
        self
    }

    /// Fail every scaling-group lookup.
    pub fn with_group_error(mut self, error: ProviderError) -> Self {
        self.group_error = Some(error);
        self
    }

    /// Fail lookups of one instance.
    pub fn with_instance_error(mut self, instance_id: &str, error: ProviderError) -> Self {
        self.instance_errors.insert(instance_id.to_string(), error);
        self
    }

    /// Let the first `calls` instance lookups through, then fail the rest.
    pub fn with_instance_error_after(mut self, calls: usize, error: ProviderError) -> Self {
        self.instance_error_after = Some((calls, error));
        self
    }

    /// Fail every termination request.
    pub fn with_terminate_error(mut self, error: ProviderError) -> Self {
        self.terminate_error = Some(error);
        self
    }

    pub fn describe_group_calls(&self) -> usize {
        self.describe_group_calls.load(Ordering::SeqCst)
    }

    pub fn describe_instance_calls(&self) -> usize {
        self.describe_instance_calls.load(Ordering::SeqCst)
    }

    /// Number of termination requests received, including failed ones.
    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    /// Instance ids successfully terminated, in order.
    pub async fn terminated(&self) -> Vec<String> {
        self.terminated.read().await.clone()
    }

    /// Current state of a registered instance.
    pub async fn instance_state(&self, instance_id: &str) -> Option<String> {
        self.instances
            .read()
            .await
            .get(instance_id)
            .and_then(|d| d.state.clone())
    }
}

#[async_trait::async_trait]
impl ComputeFleet for MockComputeFleet {
    async fn describe_scaling_group(&self, name: &str) -> ProviderResult<Option<ScalingGroup>> {
        self.describe_group_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.group_error {
            return Err(error.clone());
        }

        Ok(self.groups.read().await.get(name).cloned())
    }

    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> ProviderResult<Option<InstanceDetails>> {
        let previous_calls = self.describe_instance_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.instance_errors.get(instance_id) {
            return Err(error.clone());
        }
        if let Some((allowed, error)) = &self.instance_error_after {
            if previous_calls >= *allowed {
                return Err(error.clone());
            }
        }

        Ok(self.instances.read().await.get(instance_id).cloned())
    }

    async fn terminate_instance(&self, instance_id: &str) -> ProviderResult<StateChange> {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.terminate_error {
            return Err(error.clone());
        }

        let mut instances = self.instances.write().await;
        let details = instances.get_mut(instance_id).ok_or_else(|| {
            ProviderError::new(
                "InvalidInstanceID.NotFound",
                format!("The instance ID '{instance_id}' does not exist"),
            )
        })?;

        let previous_state = details
            .state
            .replace(MOCK_TERMINATING_STATE.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        self.terminated.write().await.push(instance_id.to_string());

        Ok(StateChange {
            previous_state,
            current_state: MOCK_TERMINATING_STATE.to_string(),
        })
    }
}

/// Fake load balancer.
#[derive(Default)]
pub struct MockLoadBalancing {
    target_groups: HashMap<String, Vec<TargetHealthRecord>>,
    load_balancers: HashMap<String, String>,
    error: Option<ProviderError>,
    target_health_calls: AtomicUsize,
}

impl MockLoadBalancing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target group and its current target health.
    pub fn with_target_group(mut self, arn: &str, targets: Vec<TargetHealthRecord>) -> Self {
        self.target_groups.insert(arn.to_string(), targets);
        self
    }

    /// Register a load balancer with a state code.
    pub fn with_load_balancer(mut self, arn: &str, state: &str) -> Self {
        self.load_balancers
            .insert(arn.to_string(), state.to_string());
        self
    }

    /// Fail every call.
    pub fn with_error(mut self, error: ProviderError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn target_health_calls(&self) -> usize {
        self.target_health_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LoadBalancing for MockLoadBalancing {
    async fn describe_target_health(
        &self,
        target_group_arn: &str,
    ) -> ProviderResult<Vec<TargetHealthRecord>> {
        self.target_health_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        self.target_groups
            .get(target_group_arn)
            .cloned()
            .ok_or_else(|| {
                ProviderError::new(
                    "TargetGroupNotFound",
                    format!("Target groups '{target_group_arn}' not found"),
                )
            })
    }

    async fn describe_load_balancer_state(
        &self,
        load_balancer_arn: &str,
    ) -> ProviderResult<Option<String>> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        Ok(self.load_balancers.get(load_balancer_arn).cloned())
    }
}

/// Fake metrics store keyed by metric name.
#[derive(Default)]
pub struct MockMetricsSource {
    series: HashMap<String, Vec<Datapoint>>,
    errors: HashMap<String, ProviderError>,
    queries: RwLock<Vec<MetricQuery>>,
}

impl MockMetricsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Datapoints returned for every query of `metric_name`.
    pub fn with_datapoints(mut self, metric_name: &str, datapoints: Vec<Datapoint>) -> Self {
        self.series.insert(metric_name.to_string(), datapoints);
        self
    }

    /// Fail queries of `metric_name`.
    pub fn with_error(mut self, metric_name: &str, error: ProviderError) -> Self {
        self.errors.insert(metric_name.to_string(), error);
        self
    }

    /// Queries received, in order.
    pub async fn queries(&self) -> Vec<MetricQuery> {
        self.queries.read().await.clone()
    }

    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait::async_trait]
impl MetricsSource for MockMetricsSource {
    async fn get_metric_statistics(&self, query: &MetricQuery) -> ProviderResult<Vec<Datapoint>> {
        self.queries.write().await.push(query.clone());

        if let Some(error) = self.errors.get(&query.metric_name) {
            return Err(error.clone());
        }

        Ok(self
            .series
            .get(&query.metric_name)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::types::TargetState;

    fn running(instance_id: &str) -> InstanceDetails {
        InstanceDetails {
            instance_id: instance_id.to_string(),
            instance_type: Some("t3.micro".to_string()),
            private_ip_address: None,
            public_ip_address: None,
            launch_time: None,
            state: Some("running".to_string()),
            availability_zone: Some("us-east-1a".to_string()),
            subnet_id: None,
            vpc_id: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_terminate_moves_instance_to_shutting_down() {
        let fleet = MockComputeFleet::new().with_instance(running("i-1"));

        let change = fleet.terminate_instance("i-1").await.unwrap();

        assert_eq!(change.previous_state, "running");
        assert_eq!(change.current_state, "shutting-down");
        assert_eq!(fleet.terminate_calls(), 1);
        assert_eq!(fleet.terminated().await, vec!["i-1".to_string()]);
        assert_eq!(
            fleet.instance_state("i-1").await.as_deref(),
            Some("shutting-down")
        );
    }

    #[tokio::test]
    async fn test_unknown_instance_is_absent() {
        let fleet = MockComputeFleet::new();
        assert!(fleet.describe_instance("i-missing").await.unwrap().is_none());
        assert_eq!(fleet.describe_instance_calls(), 1);
    }

    #[tokio::test]
    async fn test_instance_error_after() {
        let fleet = MockComputeFleet::new()
            .with_instance(running("i-1"))
            .with_instance_error_after(1, ProviderError::new("Throttling", "Rate exceeded"));

        assert!(fleet.describe_instance("i-1").await.is_ok());
        let err = fleet.describe_instance("i-1").await.unwrap_err();
        assert_eq!(err.code, "Throttling");
    }

    #[tokio::test]
    async fn test_unknown_target_group_errors() {
        let lb = MockLoadBalancing::new().with_target_group(
            "tg-arn",
            vec![TargetHealthRecord {
                target_id: "i-1".to_string(),
                state: TargetState::Healthy,
                reason: None,
            }],
        );

        assert_eq!(lb.describe_target_health("tg-arn").await.unwrap().len(), 1);
        let err = lb.describe_target_health("other").await.unwrap_err();
        assert_eq!(err.code, "TargetGroupNotFound");
        assert_eq!(lb.target_health_calls(), 2);
    }
}
