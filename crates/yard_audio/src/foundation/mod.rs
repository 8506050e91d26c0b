//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types for placing sources in the yard
//! - Simulated time for driving playback without a device
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
