//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types used by placement
//! - Cooperative cancellation for async loads
//! - Logging utilities

pub mod math;
pub mod cancellation;
pub mod logging;

pub use cancellation::CancellationToken;
