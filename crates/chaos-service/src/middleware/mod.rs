//! Middleware for the Chaos Service.
//!
//! # Components
//!
//! - `http_metrics` - Records metrics for every HTTP response

pub mod http_metrics;

pub use http_metrics::http_metrics_middleware;
