//! Chaos Service Library
//!
//! Core of the chaos toolkit: three stateless request handlers that run a
//! single chaos experiment step each.
//!
//! - Target selection: pick a random eligible instance from a scaling group
//! - Failure injection: terminate an opted-in instance after a live safety check
//! - Health validation: aggregate target health and load-balancer metrics into
//!   a pass/fail verdict
//!
//! Sequencing the three steps is left to an external workflow engine.
//!
//! # Architecture
//!
//! The service follows the Handler -> Service -> Provider pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> providers (traits)
//! ```
//!
//! Provider clients are injected as trait objects at construction, so every
//! safety check and provider-failure path can be exercised with the fakes in
//! [`providers::mock`].
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `models` - Request/response types
//! - `providers` - Compute, load-balancing and metrics capabilities
//! - `routes` - Axum router setup
//! - `services` - Target selection, failure injection, health validation

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod providers;
pub mod routes;
pub mod services;
