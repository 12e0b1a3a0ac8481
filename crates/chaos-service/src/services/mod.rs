//! Service layer.
//!
//! One service per experiment step plus the system health snapshot. Services
//! hold their provider clients and settings; they keep no state between
//! requests.

pub mod failure_injector;
pub mod health_validator;
pub mod system_health;
pub mod target_selector;

pub use failure_injector::FailureInjector;
pub use health_validator::HealthValidator;
pub use system_health::SystemHealthService;
pub use target_selector::TargetSelector;
