//! ReviewFlow Common Library
//!
//! Shared code for the ReviewFlow workflow engine including:
//! - Database models and repository patterns
//! - Error types and handling
//! - Configuration management
//! - Caller/authorization context
//! - Notification client abstraction
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod notify;

// Re-export commonly used types
pub use auth::{CallerContext, Role};
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use notify::{NotificationEvent, Notifier};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of reviewer candidates returned by the matcher
pub const DEFAULT_MATCH_RESULTS: usize = 3;

/// Number of rating categories a completed review must carry
pub const RATING_CATEGORY_COUNT: usize = 5;
