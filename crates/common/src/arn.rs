//! Structured parsing of Amazon Resource Names.
//!
//! ARN layout:
//!
//! ```text
//! arn:<partition>:<service>:<region>:<account-id>:<resource>
//! ```
//!
//! The resource section may itself contain `:` or `/` separators, e.g.
//! `targetgroup/web/50dc6c495c0c9188` or `loadbalancer/app/web/50dc6c495c0c9188`.
//! Parsing is strict: every malformed input is rejected with an [`ArnError`]
//! instead of falling back to an arbitrary substring.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resource-type marker for ELBv2 target groups.
pub const TARGET_GROUP_MARKER: &str = "targetgroup";

/// Resource-type marker for application load balancers.
pub const APPLICATION_LOAD_BALANCER_MARKER: &str = "loadbalancer/app";

/// Errors produced while parsing an ARN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnError {
    #[error("ARN is empty")]
    Empty,

    #[error("ARN must start with 'arn:', got '{0}'")]
    MissingPrefix(String),

    #[error("ARN must have 6 colon-separated sections, got {0}")]
    TooFewSections(usize),

    #[error("ARN {0} section must not be empty")]
    EmptySection(&'static str),

    #[error("ARN resource '{resource}' is not of type '{expected}'")]
    ResourceTypeMismatch { resource: String, expected: String },

    #[error("ARN resource '{0}' has no name after its type marker")]
    MissingResourceName(String),
}

/// A parsed Amazon Resource Name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceArn {
    partition: String,
    service: String,
    region: String,
    account_id: String,
    resource: String,
}

impl ResourceArn {
    /// Parse an ARN string.
    ///
    /// # Errors
    ///
    /// Returns [`ArnError`] when the prefix is missing, fewer than six
    /// sections are present, or the partition, service or resource section is
    /// empty. Region and account may legitimately be empty (global resources).
    pub fn parse(input: &str) -> Result<Self, ArnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ArnError::Empty);
        }

        let mut sections = input.splitn(6, ':');
        let prefix = sections.next().unwrap_or_default();
        if prefix != "arn" {
            return Err(ArnError::MissingPrefix(input.to_string()));
        }

        let rest: Vec<&str> = sections.collect();
        let [partition, service, region, account_id, resource] = rest.as_slice() else {
            return Err(ArnError::TooFewSections(rest.len() + 1));
        };

        if partition.is_empty() {
            return Err(ArnError::EmptySection("partition"));
        }
        if service.is_empty() {
            return Err(ArnError::EmptySection("service"));
        }
        if resource.is_empty() {
            return Err(ArnError::EmptySection("resource"));
        }

        Ok(Self {
            partition: (*partition).to_string(),
            service: (*service).to_string(),
            region: (*region).to_string(),
            account_id: (*account_id).to_string(),
            resource: (*resource).to_string(),
        })
    }

    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// The full resource section (everything after the account id).
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Return the part of the resource section that follows `marker/`.
    ///
    /// For `targetgroup/web/50dc6c495c0c9188` and marker `targetgroup` this is
    /// `web/50dc6c495c0c9188`.
    ///
    /// # Errors
    ///
    /// - [`ArnError::ResourceTypeMismatch`] if the resource does not start with
    ///   `marker/`
    /// - [`ArnError::MissingResourceName`] if nothing follows the marker
    pub fn resource_name_after(&self, marker: &str) -> Result<&str, ArnError> {
        let name = self
            .resource
            .strip_prefix(marker)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ArnError::ResourceTypeMismatch {
                resource: self.resource.clone(),
                expected: marker.to_string(),
            })?;

        if name.is_empty() || name.split('/').any(str::is_empty) {
            return Err(ArnError::MissingResourceName(self.resource.clone()));
        }

        Ok(name)
    }

    /// Render the ARN with the account id masked, for logs and `Debug` output.
    #[must_use]
    pub fn redacted(&self) -> String {
        format!(
            "arn:{}:{}:{}:[REDACTED]:{}",
            self.partition, self.service, self.region, self.resource
        )
    }
}

impl FromStr for ResourceArn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// Short target-group name (`<name>/<id>`) used as a metric dimension.
///
/// # Errors
///
/// Returns [`ArnError`] if `arn` is malformed or is not a target group.
pub fn target_group_short_name(arn: &str) -> Result<String, ArnError> {
    ResourceArn::parse(arn)?
        .resource_name_after(TARGET_GROUP_MARKER)
        .map(str::to_string)
}

/// Short application load balancer name (`<name>/<id>`) used as a metric dimension.
///
/// # Errors
///
/// Returns [`ArnError`] if `arn` is malformed or is not an application load balancer.
pub fn load_balancer_short_name(arn: &str) -> Result<String, ArnError> {
    ResourceArn::parse(arn)?
        .resource_name_after(APPLICATION_LOAD_BALANCER_MARKER)
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const TG_ARN: &str =
        "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/web-tg/50dc6c495c0c9188";
    const LB_ARN: &str = "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/web-alb/50dc6c495c0c9188";

    #[test]
    fn test_parse_target_group_arn() {
        let arn = ResourceArn::parse(TG_ARN).unwrap();

        assert_eq!(arn.partition(), "aws");
        assert_eq!(arn.service(), "elasticloadbalancing");
        assert_eq!(arn.region(), "us-east-1");
        assert_eq!(arn.account_id(), "123456789012");
        assert_eq!(arn.resource(), "targetgroup/web-tg/50dc6c495c0c9188");
    }

    #[test]
    fn test_resource_with_colons_is_kept_whole() {
        let arn = ResourceArn::parse("arn:aws:logs:us-east-1:123456789012:log-group:/app:*").unwrap();
        assert_eq!(arn.resource(), "log-group:/app:*");
    }

    #[test]
    fn test_display_round_trips_input() {
        let arn: ResourceArn = TG_ARN.parse().unwrap();
        assert_eq!(arn.to_string(), TG_ARN);
    }

    #[test]
    fn test_target_group_short_name() {
        assert_eq!(
            target_group_short_name(TG_ARN).unwrap(),
            "web-tg/50dc6c495c0c9188"
        );
    }

    #[test]
    fn test_load_balancer_short_name() {
        assert_eq!(
            load_balancer_short_name(LB_ARN).unwrap(),
            "web-alb/50dc6c495c0c9188"
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(ResourceArn::parse("   "), Err(ArnError::Empty));
    }

    #[test]
    fn test_rejects_missing_prefix() {
        assert!(matches!(
            ResourceArn::parse("aws:elasticloadbalancing:us-east-1:1:targetgroup/x/y"),
            Err(ArnError::MissingPrefix(_))
        ));
    }

    #[test]
    fn test_rejects_too_few_sections() {
        assert_eq!(
            ResourceArn::parse("arn:aws:elasticloadbalancing:us-east-1"),
            Err(ArnError::TooFewSections(4))
        );
    }

    #[test]
    fn test_rejects_empty_resource() {
        assert_eq!(
            ResourceArn::parse("arn:aws:elasticloadbalancing:us-east-1:123456789012:"),
            Err(ArnError::EmptySection("resource"))
        );
    }

    #[test]
    fn test_wrong_resource_type_is_rejected() {
        // A load balancer ARN is not a target group
        assert!(matches!(
            target_group_short_name(LB_ARN),
            Err(ArnError::ResourceTypeMismatch { .. })
        ));

        // Network load balancers do not carry the application marker
        let nlb = "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/net/nlb/abc";
        assert!(matches!(
            load_balancer_short_name(nlb),
            Err(ArnError::ResourceTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_marker_must_be_followed_by_separator() {
        // "targetgroupx/..." must not be accepted as a target group
        let arn = "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroupx/web/abc";
        assert!(matches!(
            target_group_short_name(arn),
            Err(ArnError::ResourceTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_name() {
        let arn = "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/";
        assert!(matches!(
            target_group_short_name(arn),
            Err(ArnError::MissingResourceName(_))
        ));

        let arn = "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup//abc";
        assert!(matches!(
            target_group_short_name(arn),
            Err(ArnError::MissingResourceName(_))
        ));
    }

    #[test]
    fn test_redacted_hides_account() {
        let arn = ResourceArn::parse(TG_ARN).unwrap();
        let redacted = arn.redacted();

        assert!(redacted.contains("[REDACTED]"));
        assert!(!redacted.contains("123456789012"));
        assert!(redacted.ends_with("targetgroup/web-tg/50dc6c495c0c9188"));
    }
}
