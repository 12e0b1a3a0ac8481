//! Failure injection.
//!
//! Terminates a single instance after a live safety check. The chaos tag is
//! read from the compute API in the same request that issues the termination;
//! nothing supplied by the caller can bypass it.

use crate::errors::{ChaosError, DomainErrorCode};
use crate::models::{InjectFailureRequest, InjectFailureResponse, InjectionAction, NOT_AVAILABLE};
use crate::observability::metrics::record_failure_injection;
use crate::providers::{observed, ComputeFleet};
use chrono::Utc;
use common::types::InstanceDetails;
use std::sync::Arc;
use tracing::instrument;

/// Terminates opted-in instances.
pub struct FailureInjector {
    compute: Arc<dyn ComputeFleet>,
    chaos_tag_key: String,
}

impl FailureInjector {
    pub fn new(compute: Arc<dyn ComputeFleet>, chaos_tag_key: impl Into<String>) -> Self {
        Self {
            compute,
            chaos_tag_key: chaos_tag_key.into(),
        }
    }

    /// Inject a failure into one instance.
    ///
    /// Returns `skipped` if the instance is already terminated or on its way
    /// there, `validated` on a dry run and `terminated` once the termination
    /// request has been accepted.
    ///
    /// # Errors
    ///
    /// - `ChaosError::Validation` - instance id missing
    /// - `ChaosError::Domain(InstanceNotFound)` - instance not visible
    /// - `ChaosError::Domain(NotChaosTarget)` - safety tag missing or not true
    /// - `ChaosError::Provider` - lookup or termination failed
    #[instrument(skip_all, fields(instance_id = ?request.instance_id, dry_run = request.dry_run))]
    pub async fn inject(
        &self,
        request: &InjectFailureRequest,
    ) -> Result<InjectFailureResponse, ChaosError> {
        let result = self.inject_inner(request).await;

        let outcome = match &result {
            Ok(response) => response.action.as_str(),
            Err(e) if e.domain_code() == Some(DomainErrorCode::NotChaosTarget) => "refused",
            Err(_) => "error",
        };
        record_failure_injection(outcome);

        result
    }

    async fn inject_inner(
        &self,
        request: &InjectFailureRequest,
    ) -> Result<InjectFailureResponse, ChaosError> {
        request
            .validate()
            .map_err(|e| ChaosError::Validation(e.to_string()))?;
        let instance_id = request
            .instance_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();

        // Fresh lookup: serves both the safety gate and the state check.
        let details = observed(
            "ec2",
            "describe_instances",
            self.compute.describe_instance(instance_id),
        )
        .await?
        .ok_or_else(|| {
            ChaosError::domain(
                DomainErrorCode::InstanceNotFound,
                format!("Instance {instance_id} not found or not accessible"),
            )
        })?;

        if !details.is_chaos_target(&self.chaos_tag_key) {
            tracing::warn!(
                target: "chaos.services.failure_injector",
                instance_id = %instance_id,
                tag = %self.chaos_tag_key,
                "Instance is not tagged as chaos target, refusing"
            );
            return Err(ChaosError::domain(
                DomainErrorCode::NotChaosTarget,
                format!(
                    "Instance {instance_id} is not tagged as {}=true. Refusing to terminate for safety reasons.",
                    self.chaos_tag_key
                ),
            ));
        }

        let current_state = details
            .state
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        tracing::debug!(
            target: "chaos.services.failure_injector",
            instance_id = %instance_id,
            state = %current_state,
            "Safety check passed"
        );

        if details.is_terminating() {
            tracing::info!(
                target: "chaos.services.failure_injector",
                instance_id = %instance_id,
                state = %current_state,
                "Instance already terminating, skipping"
            );
            return Ok(InjectFailureResponse {
                instance_id: instance_id.to_string(),
                action: InjectionAction::Skipped,
                dry_run: None,
                previous_state: current_state.clone(),
                message: format!("Instance {instance_id} is already {current_state}"),
                current_state,
                availability_zone: None,
                instance_type: None,
                private_ip_address: None,
                instance_details: None,
                chaos_experiment: None,
                timestamp: Utc::now(),
            });
        }

        if request.dry_run {
            tracing::info!(
                target: "chaos.services.failure_injector",
                instance_id = %instance_id,
                "Dry run: instance is eligible for termination"
            );
            return Ok(InjectFailureResponse {
                instance_id: instance_id.to_string(),
                action: InjectionAction::Validated,
                dry_run: Some(true),
                previous_state: current_state.clone(),
                current_state,
                availability_zone: None,
                instance_type: None,
                private_ip_address: None,
                message: format!(
                    "Validation successful. Instance {instance_id} is eligible for termination"
                ),
                instance_details: Some(details),
                chaos_experiment: None,
                timestamp: Utc::now(),
            });
        }

        self.terminate(instance_id, current_state, details).await
    }

    async fn terminate(
        &self,
        instance_id: &str,
        previous_state: String,
        details: InstanceDetails,
    ) -> Result<InjectFailureResponse, ChaosError> {
        tracing::warn!(
            target: "chaos.services.failure_injector",
            instance_id = %instance_id,
            previous_state = %previous_state,
            "TERMINATING INSTANCE"
        );

        let change = observed(
            "ec2",
            "terminate_instances",
            self.compute.terminate_instance(instance_id),
        )
        .await?;

        tracing::info!(
            target: "chaos.services.failure_injector",
            instance_id = %instance_id,
            previous = %change.previous_state,
            current = %change.current_state,
            "Termination initiated"
        );

        let or_na = |value: Option<String>| Some(value.unwrap_or_else(|| NOT_AVAILABLE.to_string()));

        Ok(InjectFailureResponse {
            instance_id: instance_id.to_string(),
            action: InjectionAction::Terminated,
            dry_run: None,
            previous_state,
            current_state: change.current_state,
            availability_zone: or_na(details.availability_zone),
            instance_type: or_na(details.instance_type),
            private_ip_address: or_na(details.private_ip_address),
            instance_details: None,
            chaos_experiment: Some(true),
            message: format!("Successfully initiated termination of instance {instance_id}"),
            timestamp: Utc::now(),
        })
    }
}
