//! aria-core — Pure types, configuration, and errors.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod config;
pub mod error;
pub mod types;
