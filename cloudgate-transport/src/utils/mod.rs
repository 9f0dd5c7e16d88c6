//! Utility modules.

/// Helpers that keep bodies and secrets out of logs.
pub mod log_sanitizer;
