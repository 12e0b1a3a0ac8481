//! Target selection.
//!
//! Picks one instance uniformly at random from the healthy, in-service,
//! chaos-tagged members of a scaling group.
//!
//! # Security
//!
//! - Uses CSPRNG for selection
//! - Every candidate's tag is read fresh from the compute API; membership
//!   data from the scaling group is never trusted for eligibility

use crate::errors::{ChaosError, DomainErrorCode};
use crate::models::{SelectTargetRequest, SelectTargetResponse, NOT_AVAILABLE};
use crate::observability::metrics::record_target_selection;
use crate::providers::{observed, ComputeFleet};
use common::types::{GroupInstance, InstanceDetails};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tracing::instrument;

/// Selects a random eligible instance from a scaling group.
pub struct TargetSelector {
    compute: Arc<dyn ComputeFleet>,
    chaos_tag_key: String,
    rng: SystemRandom,
}

impl TargetSelector {
    pub fn new(compute: Arc<dyn ComputeFleet>, chaos_tag_key: impl Into<String>) -> Self {
        Self {
            compute,
            chaos_tag_key: chaos_tag_key.into(),
            rng: SystemRandom::new(),
        }
    }

    /// Select one eligible instance.
    ///
    /// # Errors
    ///
    /// - `ChaosError::Validation` - group name missing
    /// - `ChaosError::Domain(ScalingGroupNotFound)` - group does not exist
    /// - `ChaosError::Domain(NoEligibleTargets)` - nothing left after filtering
    /// - `ChaosError::Provider` - group lookup failed
    #[instrument(skip_all, fields(group = ?request.auto_scaling_group_name))]
    pub async fn select(
        &self,
        request: &SelectTargetRequest,
    ) -> Result<SelectTargetResponse, ChaosError> {
        let result = self.select_inner(request).await;

        match &result {
            Ok(response) => {
                record_target_selection("selected", Some(response.total_healthy_instances));
            }
            Err(e) if e.domain_code() == Some(DomainErrorCode::NoEligibleTargets) => {
                record_target_selection("no_eligible_targets", Some(0));
            }
            Err(_) => record_target_selection("error", None),
        }

        result
    }

    async fn select_inner(
        &self,
        request: &SelectTargetRequest,
    ) -> Result<SelectTargetResponse, ChaosError> {
        request
            .validate()
            .map_err(|e| ChaosError::Validation(e.to_string()))?;
        let group_name = request
            .auto_scaling_group_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();

        let eligible = self.eligible_instances(group_name).await?;

        if eligible.is_empty() {
            tracing::warn!(
                target: "chaos.services.target_selector",
                group = %group_name,
                "No eligible instances for chaos selection"
            );
            return Err(ChaosError::domain(
                DomainErrorCode::NoEligibleTargets,
                format!("No eligible instances found in Auto Scaling Group: {group_name}"),
            ));
        }

        let index = uniform_index(&self.rng, eligible.len())?;
        let chosen = eligible.get(index).ok_or_else(|| {
            ChaosError::Internal(format!(
                "Selection index {index} out of range for {} candidates",
                eligible.len()
            ))
        })?;

        let details = self.enrichment(&chosen.instance_id).await;

        tracing::info!(
            target: "chaos.services.target_selector",
            group = %group_name,
            instance_id = %chosen.instance_id,
            pool_size = eligible.len(),
            "Selected chaos target"
        );

        Ok(build_response(group_name, chosen, details.as_ref(), eligible.len()))
    }

    /// Healthy, in-service members that carry a true-valued chaos tag.
    async fn eligible_instances(&self, group_name: &str) -> Result<Vec<GroupInstance>, ChaosError> {
        let group = observed(
            "autoscaling",
            "describe_auto_scaling_groups",
            self.compute.describe_scaling_group(group_name),
        )
        .await?
        .ok_or_else(|| {
            ChaosError::domain(
                DomainErrorCode::ScalingGroupNotFound,
                format!("Auto Scaling Group not found: {group_name}"),
            )
        })?;

        tracing::debug!(
            target: "chaos.services.target_selector",
            group = %group_name,
            total = group.instances.len(),
            "Fetched scaling group members"
        );

        let mut eligible = Vec::new();
        for instance in group
            .instances
            .into_iter()
            .filter(GroupInstance::is_healthy_in_service)
        {
            if self.is_chaos_target(&instance.instance_id).await {
                eligible.push(instance);
            }
        }

        tracing::debug!(
            target: "chaos.services.target_selector",
            group = %group_name,
            eligible = eligible.len(),
            "Filtered eligible instances"
        );

        Ok(eligible)
    }

    /// Fresh tag check. Lookup failures exclude the candidate.
    async fn is_chaos_target(&self, instance_id: &str) -> bool {
        let lookup = observed(
            "ec2",
            "describe_instances",
            self.compute.describe_instance(instance_id),
        )
        .await;

        match lookup {
            Ok(Some(details)) if details.is_chaos_target(&self.chaos_tag_key) => true,
            Ok(Some(_)) => {
                tracing::warn!(
                    target: "chaos.services.target_selector",
                    instance_id = %instance_id,
                    tag = %self.chaos_tag_key,
                    "Instance is not tagged as chaos target, skipping"
                );
                false
            }
            Ok(None) => {
                tracing::warn!(
                    target: "chaos.services.target_selector",
                    instance_id = %instance_id,
                    "Instance not visible to compute API, skipping"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    target: "chaos.services.target_selector",
                    instance_id = %instance_id,
                    error = %e,
                    "Tag check failed, skipping"
                );
                false
            }
        }
    }

    /// Point-in-time details of the chosen instance. `None` on any failure.
    async fn enrichment(&self, instance_id: &str) -> Option<InstanceDetails> {
        match observed(
            "ec2",
            "describe_instances",
            self.compute.describe_instance(instance_id),
        )
        .await
        {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(
                    target: "chaos.services.target_selector",
                    instance_id = %instance_id,
                    error = %e,
                    "Enrichment lookup failed, returning core selection only"
                );
                None
            }
        }
    }
}

fn build_response(
    group_name: &str,
    chosen: &GroupInstance,
    details: Option<&InstanceDetails>,
    pool_size: usize,
) -> SelectTargetResponse {
    let or_na = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    SelectTargetResponse {
        instance_id: chosen.instance_id.clone(),
        availability_zone: chosen.availability_zone.clone(),
        health_status: chosen.health_status.clone(),
        lifecycle_state: chosen.lifecycle_state.clone(),
        private_ip_address: or_na(details.and_then(|d| d.private_ip_address.clone())),
        instance_type: or_na(details.and_then(|d| d.instance_type.clone())),
        launch_time: or_na(details.and_then(|d| d.launch_time).map(|t| t.to_rfc3339())),
        details_available: details.is_some(),
        total_healthy_instances: pool_size,
        auto_scaling_group_name: group_name.to_string(),
        message: format!(
            "Selected instance {} from {pool_size} eligible instances",
            chosen.instance_id
        ),
    }
}

/// Uniform index in `0..len` using rejection sampling over 64-bit draws.
fn uniform_index(rng: &dyn SecureRandom, len: usize) -> Result<usize, ChaosError> {
    let bound = u64::try_from(len)
        .ok()
        .filter(|b| *b > 0)
        .ok_or_else(|| ChaosError::Internal(format!("Invalid selection pool size: {len}")))?;

    // Draws below 2^64 mod bound would bias the low indices.
    let threshold = bound.wrapping_neg() % bound;

    loop {
        let mut random_bytes = [0u8; 8];
        rng.fill(&mut random_bytes)
            .map_err(|_| ChaosError::Internal("CSPRNG failure during selection".to_string()))?;

        let draw = u64::from_le_bytes(random_bytes);
        if draw >= threshold {
            return usize::try_from(draw % bound)
                .map_err(|_| ChaosError::Internal("Selection index overflow".to_string()));
        }
    }
}
