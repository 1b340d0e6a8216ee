//! Core helpers: tracing setup, username rules, recipient dedup

pub mod names;
pub mod tracing;

pub use names::{UsernameError, dedup_preserving_order, validate_username};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
