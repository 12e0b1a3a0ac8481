//! # Chaos Test Utilities
//!
//! Shared test utilities for the Chaos Service.
//!
//! This crate provides:
//! - Server test harness (`TestChaosServer` for E2E tests over the fake providers)
//! - Fixture builders for instances, scaling groups, target health and datapoints
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chaos_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let mocks = MockProviders::default();
//!     let server = TestChaosServer::spawn(mocks).await?;
//!
//!     let response = reqwest::get(format!("{}/health", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod server_harness;

// Re-export commonly used items
pub use fixtures::*;
pub use server_harness::*;
