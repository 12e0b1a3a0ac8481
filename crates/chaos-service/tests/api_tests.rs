//! HTTP API integration tests.
//!
//! Spawns the real router on an ephemeral port with fake providers and drives
//! it over HTTP.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use chaos_service::providers::mock::{MockComputeFleet, MockLoadBalancing, MockMetricsSource};
use chaos_test_utils::{
    datapoint, group, healthy_member, tagged_instance, targets, untagged_instance, MockProviders,
    TestChaosServer, LOAD_BALANCER_ARN, TARGET_GROUP_ARN,
};
use common::error::ProviderError;
use serde_json::json;
use std::collections::HashMap;

fn web_fleet() -> MockComputeFleet {
    MockComputeFleet::new()
        .with_group(group(
            "web-asg",
            vec![healthy_member("i-0aaa"), healthy_member("i-0bbb")],
        ))
        .with_instance(tagged_instance("i-0aaa"))
        .with_instance(untagged_instance("i-0bbb"))
}

// ============================================================================
// Operational endpoints
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::default()).await?;

    let response = server
        .client()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::default()).await?;

    let (status, body) = server.get_json("/ready").await?;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ready");
    assert!(body.get("error").is_none());
    assert_eq!(server.mocks().compute.describe_group_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::default()).await?;

    let response = server
        .client()
        .get(format!("{}/metrics", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    Ok(())
}

// ============================================================================
// Target selection
// ============================================================================

#[tokio::test]
async fn test_select_target_returns_only_tagged_instance() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::with_compute(web_fleet())).await?;

    let (status, body) = server
        .post_json(
            "/api/v1/targets/select",
            &json!({"autoScalingGroupName": "web-asg"}),
        )
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["instanceId"], "i-0aaa");
    assert_eq!(body["totalHealthyInstances"], 1);
    assert_eq!(body["autoScalingGroupName"], "web-asg");
    assert_eq!(body["instanceType"], "t3.micro");
    assert_eq!(body["launchTime"], "2024-01-15T10:30:00+00:00");
    assert_eq!(
        body["message"],
        "Selected instance i-0aaa from 1 eligible instances"
    );
    Ok(())
}

#[tokio::test]
async fn test_select_target_missing_group_name() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::default()).await?;

    let (status, body) = server.post_json("/api/v1/targets/select", &json!({})).await?;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(
        body["message"],
        "Missing required parameter: autoScalingGroupName"
    );
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_select_target_no_eligible_is_domain_error() -> Result<()> {
    let fleet = MockComputeFleet::new()
        .with_group(group("web-asg", vec![healthy_member("i-0bbb")]))
        .with_instance(untagged_instance("i-0bbb"));
    let server = TestChaosServer::spawn(MockProviders::with_compute(fleet)).await?;

    let (status, body) = server
        .post_json(
            "/api/v1/targets/select",
            &json!({"autoScalingGroupName": "web-asg"}),
        )
        .await?;

    assert_eq!(status, 409);
    assert_eq!(body["error"], "DomainError");
    assert_eq!(body["code"], "NoEligibleTargets");
    assert_eq!(server.mocks().compute.terminate_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_select_target_provider_error_passes_code_through() -> Result<()> {
    let fleet = MockComputeFleet::new().with_group_error(ProviderError::new(
        "ValidationError",
        "Auto Scaling group name is invalid",
    ));
    let server = TestChaosServer::spawn(MockProviders::with_compute(fleet)).await?;

    let (status, body) = server
        .post_json(
            "/api/v1/targets/select",
            &json!({"autoScalingGroupName": "web-asg"}),
        )
        .await?;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "AWSError");
    assert_eq!(body["errorCode"], "ValidationError");
    assert_eq!(
        body["message"],
        "AWS API error: Auto Scaling group name is invalid"
    );
    Ok(())
}

// ============================================================================
// Failure injection
// ============================================================================

#[tokio::test]
async fn test_inject_failure_terminates_tagged_instance() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::with_compute(web_fleet())).await?;

    let (status, body) = server
        .post_json("/api/v1/failures/inject", &json!({"instanceId": "i-0aaa"}))
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["action"], "terminated");
    assert_eq!(body["previousState"], "running");
    assert_eq!(body["currentState"], "shutting-down");
    assert_eq!(body["availabilityZone"], "us-east-1a");
    assert_eq!(body["chaosExperiment"], true);
    assert!(body.get("instanceDetails").is_none());
    assert_eq!(
        server.mocks().compute.terminated().await,
        vec!["i-0aaa".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_inject_failure_refuses_untagged_instance() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::with_compute(web_fleet())).await?;

    let (status, body) = server
        .post_json("/api/v1/failures/inject", &json!({"instanceId": "i-0bbb"}))
        .await?;

    assert_eq!(status, 409);
    assert_eq!(body["code"], "NotChaosTarget");
    assert_eq!(
        body["message"],
        "Instance i-0bbb is not tagged as ChaosTarget=true. Refusing to terminate for safety reasons."
    );
    assert_eq!(server.mocks().compute.terminate_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_inject_failure_dry_run() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::with_compute(web_fleet())).await?;

    let (status, body) = server
        .post_json(
            "/api/v1/failures/inject",
            &json!({"instanceId": "i-0aaa", "dryRun": true}),
        )
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["action"], "validated");
    assert_eq!(body["dryRun"], true);
    assert_eq!(body["instanceDetails"]["instanceId"], "i-0aaa");
    assert_eq!(body["instanceDetails"]["tags"][0]["key"], "ChaosTarget");
    assert_eq!(server.mocks().compute.terminate_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_inject_failure_twice_is_skipped() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::with_compute(web_fleet())).await?;
    let body = json!({"instanceId": "i-0aaa"});

    let (_, first) = server.post_json("/api/v1/failures/inject", &body).await?;
    let (status, second) = server.post_json("/api/v1/failures/inject", &body).await?;

    assert_eq!(first["action"], "terminated");
    assert_eq!(status, 200);
    assert_eq!(second["action"], "skipped");
    assert_eq!(server.mocks().compute.terminate_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_inject_failure_unknown_instance() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::with_compute(web_fleet())).await?;

    let (status, body) = server
        .post_json("/api/v1/failures/inject", &json!({"instanceId": "i-0zzz"}))
        .await?;

    assert_eq!(status, 404);
    assert_eq!(body["code"], "InstanceNotFound");
    Ok(())
}

#[tokio::test]
async fn test_inject_failure_respects_configured_tag_key() -> Result<()> {
    let server = TestChaosServer::spawn_with_vars(
        MockProviders::with_compute(web_fleet()),
        HashMap::from([("CHAOS_TAG_KEY".to_string(), "chaos:opt-in".to_string())]),
    )
    .await?;

    let (status, _) = server
        .post_json("/api/v1/failures/inject", &json!({"instanceId": "i-0aaa"}))
        .await?;

    assert_eq!(status, 409);
    assert_eq!(server.mocks().compute.terminate_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::with_compute(web_fleet())).await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/failures/inject", server.url()))
        .header("content-type", "application/json")
        .body("{\"instanceId\": ")
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(server.mocks().compute.terminate_calls(), 0);
    Ok(())
}

// ============================================================================
// Health validation
// ============================================================================

#[tokio::test]
async fn test_validate_health_with_metrics() -> Result<()> {
    let mocks = MockProviders::new(
        MockComputeFleet::new(),
        MockLoadBalancing::new().with_target_group(TARGET_GROUP_ARN, targets(3, 0)),
        MockMetricsSource::new()
            .with_datapoints("HealthyHostCount", vec![datapoint(3.0, 1)])
            .with_datapoints("HTTPCode_Target_5XX_Count", vec![datapoint(0.0, 1)])
            .with_datapoints("TargetResponseTime", vec![datapoint(0.045, 1)]),
    );
    let server = TestChaosServer::spawn(mocks).await?;

    let (status, body) = server
        .post_json(
            "/api/v1/health/validate",
            &json!({
                "targetGroupArn": TARGET_GROUP_ARN,
                "loadBalancerArn": LOAD_BALANCER_ARN,
                "expectedHealthyHosts": 2,
                "checkType": "post"
            }),
        )
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["healthStatus"], "PASS");
    assert_eq!(body["checkType"], "post");
    assert_eq!(body["metrics"]["targetHealth"]["healthy"], 3);
    assert_eq!(body["metrics"]["healthyHostCount"]["available"], true);
    assert_eq!(body["metrics"]["requestCount"]["available"], false);
    assert_eq!(body["evaluation"].as_array().unwrap().len(), 4);
    assert_eq!(
        body["summary"],
        "System is HEALTHY: 3 targets healthy, all checks passed"
    );
    Ok(())
}

#[tokio::test]
async fn test_validate_health_unhealthy_is_still_200() -> Result<()> {
    let mocks = MockProviders::new(
        MockComputeFleet::new(),
        MockLoadBalancing::new().with_target_group(TARGET_GROUP_ARN, targets(1, 2)),
        MockMetricsSource::new(),
    );
    let server = TestChaosServer::spawn(mocks).await?;

    let (status, body) = server
        .post_json(
            "/api/v1/health/validate",
            &json!({"targetGroupArn": TARGET_GROUP_ARN}),
        )
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["healthy"], false);
    assert_eq!(body["healthStatus"], "FAIL");
    assert_eq!(body["checkType"], "unknown");
    assert_eq!(
        body["summary"],
        "System is UNHEALTHY: Insufficient healthy targets: 1/2, 2 unhealthy targets detected"
    );
    Ok(())
}

#[tokio::test]
async fn test_validate_health_missing_target_group() -> Result<()> {
    let server = TestChaosServer::spawn(MockProviders::default()).await?;

    let (status, body) = server
        .post_json("/api/v1/health/validate", &json!({"checkType": "pre"}))
        .await?;

    assert_eq!(status, 400);
    assert_eq!(
        body["message"],
        "Missing required parameter: targetGroupArn"
    );
    Ok(())
}

// ============================================================================
// System health
// ============================================================================

#[tokio::test]
async fn test_system_health_snapshot() -> Result<()> {
    let mocks = MockProviders::new(
        MockComputeFleet::new().with_group(group(
            "web-asg",
            vec![healthy_member("i-1"), healthy_member("i-2")],
        )),
        MockLoadBalancing::new()
            .with_target_group(TARGET_GROUP_ARN, targets(2, 0))
            .with_load_balancer(LOAD_BALANCER_ARN, "active"),
        MockMetricsSource::new(),
    );
    let server = TestChaosServer::spawn_with_vars(
        mocks,
        HashMap::from([
            ("TARGET_ASG_NAME".to_string(), "web-asg".to_string()),
            ("TARGET_GROUP_ARN".to_string(), TARGET_GROUP_ARN.to_string()),
            ("LOAD_BALANCER_ARN".to_string(), LOAD_BALANCER_ARN.to_string()),
        ]),
    )
    .await?;

    let (status, body) = server.get_json("/api/v1/system/health").await?;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["targetInstanceCount"], 2);
    assert_eq!(body["healthyInstances"], 2);
    assert_eq!(body["loadBalancerStatus"], "active");
    assert!(body["lastChecked"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_system_health_provider_failure_is_critical() -> Result<()> {
    let fleet = MockComputeFleet::new()
        .with_group_error(ProviderError::new("Throttling", "Rate exceeded"));
    let server = TestChaosServer::spawn(MockProviders::with_compute(fleet)).await?;

    let (status, body) = server.get_json("/api/v1/system/health").await?;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "critical");
    assert_eq!(body["loadBalancerStatus"], "error");
    Ok(())
}
