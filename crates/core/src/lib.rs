//! Promptops Core Library
//!
//! This crate provides the foundational utilities shared by every promptops crate:
//! - Error handling (`AppError`, `ApiError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{ApiError, ApiErrorKind, AppError, AppResult};
