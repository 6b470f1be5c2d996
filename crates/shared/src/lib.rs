//! Shared errors and configuration for Payflow.
//!
//! This crate provides the common surface used across all other crates:
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
