//! aria-lib — TTS server engine.
//!
//! Voice model registry, on-demand provisioning, Piper subprocess
//! invocation with guaranteed artifact cleanup, retention sweep, and the
//! HTTP API. Depends on aria-core for pure types and configuration.

pub mod provision;
pub mod server;
pub mod sweep;
pub mod synth;
pub mod voices;

// Re-export aria-core for convenience
pub use aria_core;
