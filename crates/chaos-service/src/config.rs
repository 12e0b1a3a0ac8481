//! Chaos Service configuration.
//!
//! Configuration is loaded from environment variables. Account ids inside
//! configured ARNs are redacted in Debug output.

use common::arn::{ArnError, ResourceArn};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default tag key marking an instance as an opted-in chaos target.
pub const DEFAULT_CHAOS_TAG_KEY: &str = "ChaosTarget";

/// Default scaling group reported on by the system health snapshot.
pub const DEFAULT_TARGET_ASG_NAME: &str = "chaos-target-asg";

/// Default minimum number of healthy targets.
pub const DEFAULT_EXPECTED_HEALTHY_HOSTS: u32 = 2;

/// Default maximum acceptable count of target 5XX responses in the window.
pub const DEFAULT_MAX_5XX_ERRORS: u32 = 10;

/// Default maximum acceptable average response time in milliseconds.
pub const DEFAULT_MAX_RESPONSE_TIME_MS: u32 = 2000;

/// Default metric lookback window (5 minutes).
pub const DEFAULT_METRIC_LOOKBACK_SECONDS: u32 = 300;

/// Default metric period (1 minute granularity).
pub const DEFAULT_METRIC_PERIOD_SECONDS: u32 = 60;

/// Pass/fail thresholds used by the health validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
    /// Healthy-target count used when a request does not specify one.
    pub default_expected_healthy_hosts: u32,
    /// Maximum target 5XX responses before the verdict fails.
    pub max_5xx_errors: u32,
    /// Maximum average response time before a warning is raised.
    pub max_response_time_ms: u32,
    /// Trailing window queried for metrics.
    pub metric_lookback_seconds: u32,
    /// Metric aggregation period.
    pub metric_period_seconds: u32,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            default_expected_healthy_hosts: DEFAULT_EXPECTED_HEALTHY_HOSTS,
            max_5xx_errors: DEFAULT_MAX_5XX_ERRORS,
            max_response_time_ms: DEFAULT_MAX_RESPONSE_TIME_MS,
            metric_lookback_seconds: DEFAULT_METRIC_LOOKBACK_SECONDS,
            metric_period_seconds: DEFAULT_METRIC_PERIOD_SECONDS,
        }
    }
}

/// Chaos Service configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// AWS region the provider clients talk to (default: "us-east-1").
    pub region: String,

    /// Tag key that opts an instance into chaos experiments.
    pub chaos_tag_key: String,

    /// Scaling group reported on by `GET /api/v1/system/health`.
    pub target_asg_name: String,

    /// Target group reported on by `GET /api/v1/system/health`.
    pub target_group_arn: Option<ResourceArn>,

    /// Load balancer reported on by `GET /api/v1/system/health`.
    pub load_balancer_arn: Option<ResourceArn>,

    /// Health validation thresholds.
    pub thresholds: HealthThresholds,

    /// Seconds to wait for in-flight requests after a shutdown signal.
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts account ids.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("region", &self.region)
            .field("chaos_tag_key", &self.chaos_tag_key)
            .field("target_asg_name", &self.target_asg_name)
            .field(
                "target_group_arn",
                &self.target_group_arn.as_ref().map(ResourceArn::redacted),
            )
            .field(
                "load_balancer_arn",
                &self.load_balancer_arn.as_ref().map(ResourceArn::redacted),
            )
            .field("thresholds", &self.thresholds)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Invalid ARN in {var}: {source}")]
    InvalidArn {
        var: &'static str,
        #[source]
        source: ArnError,
    },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let region = non_empty(vars, "AWS_REGION", DEFAULT_REGION)?;
        let chaos_tag_key = non_empty(vars, "CHAOS_TAG_KEY", DEFAULT_CHAOS_TAG_KEY)?;
        let target_asg_name = non_empty(vars, "TARGET_ASG_NAME", DEFAULT_TARGET_ASG_NAME)?;

        let target_group_arn = optional_arn(vars, "TARGET_GROUP_ARN")?;
        let load_balancer_arn = optional_arn(vars, "LOAD_BALANCER_ARN")?;

        let default_expected_healthy_hosts = parse_u32(
            vars,
            "DEFAULT_EXPECTED_HEALTHY_HOSTS",
            DEFAULT_EXPECTED_HEALTHY_HOSTS,
        )?;
        if default_expected_healthy_hosts == 0 {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_EXPECTED_HEALTHY_HOSTS must be at least 1".to_string(),
            ));
        }

        let max_5xx_errors = parse_u32(vars, "MAX_5XX_ERRORS", DEFAULT_MAX_5XX_ERRORS)?;

        let max_response_time_ms =
            parse_u32(vars, "MAX_RESPONSE_TIME_MS", DEFAULT_MAX_RESPONSE_TIME_MS)?;
        if max_response_time_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_RESPONSE_TIME_MS must be greater than 0".to_string(),
            ));
        }

        let metric_period_seconds =
            parse_u32(vars, "METRIC_PERIOD_SECONDS", DEFAULT_METRIC_PERIOD_SECONDS)?;
        if metric_period_seconds == 0 || metric_period_seconds % 60 != 0 {
            return Err(ConfigError::InvalidValue(format!(
                "METRIC_PERIOD_SECONDS must be a positive multiple of 60, got {}",
                metric_period_seconds
            )));
        }

        let metric_lookback_seconds = parse_u32(
            vars,
            "METRIC_LOOKBACK_SECONDS",
            DEFAULT_METRIC_LOOKBACK_SECONDS,
        )?;
        if metric_lookback_seconds < metric_period_seconds {
            return Err(ConfigError::InvalidValue(format!(
                "METRIC_LOOKBACK_SECONDS ({}) must be at least METRIC_PERIOD_SECONDS ({})",
                metric_lookback_seconds, metric_period_seconds
            )));
        }

        let drain_seconds = match vars.get("CHAOS_DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "CHAOS_DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?,
            None => 0,
        };

        Ok(Config {
            bind_address,
            region,
            chaos_tag_key,
            target_asg_name,
            target_group_arn,
            load_balancer_arn,
            thresholds: HealthThresholds {
                default_expected_healthy_hosts,
                max_5xx_errors,
                max_response_time_ms,
                metric_lookback_seconds,
                metric_period_seconds,
            },
            drain_seconds,
        })
    }
}

fn non_empty(
    vars: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match vars.get(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::InvalidValue(format!(
            "{} must not be empty",
            key
        ))),
        Some(value) => Ok(value.trim().to_string()),
        None => Ok(default.to_string()),
    }
}

fn optional_arn(
    vars: &HashMap<String, String>,
    key: &'static str,
) -> Result<Option<ResourceArn>, ConfigError> {
    match vars.get(key) {
        Some(value) if !value.trim().is_empty() => ResourceArn::parse(value)
            .map(Some)
            .map_err(|source| ConfigError::InvalidArn { var: key, source }),
        _ => Ok(None),
    }
}

fn parse_u32(vars: &HashMap<String, String>, key: &str, default: u32) -> Result<u32, ConfigError> {
    match vars.get(key) {
        Some(value_str) => value_str.trim().parse().map_err(|e| {
            ConfigError::InvalidValue(format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                key, value_str, e
            ))
        }),
        None => Ok(default),
    }
}
