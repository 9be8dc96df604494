//! Centralized constants for srv-exporter.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod collector;
pub mod env;
pub mod metrics;
pub mod network;
