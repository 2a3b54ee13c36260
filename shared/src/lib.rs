//! Shared types for Till
//!
//! Domain models, the unified error system and small time helpers used by
//! the server and its tests.

pub mod error;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use types::Timestamp;
