//! docqa core library
//!
//! Foundational utilities shared by every docqa crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging initialization
//! - Configuration loading (`AppConfig`, `QaSettings`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, QaSettings};
pub use error::{AppError, AppResult};
