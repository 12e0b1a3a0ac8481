//! Common utilities and types shared across the chaos toolkit components.

#![warn(clippy::pedantic)]

/// Module for parsing fully-qualified cloud resource identifiers
pub mod arn;

/// Module for provider (cloud API) error types
pub mod error;

/// Module for cloud resource records read from the providers
pub mod types;
