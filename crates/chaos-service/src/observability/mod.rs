//! Observability for the Chaos Service.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
