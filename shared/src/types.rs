//! Common types for the shared crate

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Minutes to milliseconds
pub const MINUTE_MILLIS: i64 = 60_000;
