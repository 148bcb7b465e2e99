//! Core types and utilities for the EcoSort waste classification service.
//!
//! This crate provides the error taxonomy, domain types, configuration, and
//! metric records shared across the dataset, model, and server crates.

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use metrics::*;
pub use types::*;
