//! # Core Module
//!
//! Typed configuration shared by the factory, the pool and the orchestrator.
//!
//! ## Organization
//!
//! - **Config**: [`LifecycleConfig`] and its per-subsystem sections

pub mod config;

pub use config::{Config, ConfigError, LifecycleConfig};
