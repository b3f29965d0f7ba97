//! Core module - shared infrastructure for Baton
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AgentEntry, Config, HandoffConfig};
pub use error::{BatonError, FailureKind, Result};
pub use types::*;
