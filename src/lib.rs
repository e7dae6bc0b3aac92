//! Rate-limit-aware retry executor for async operations.
//!
//! This crate wraps arbitrary async operations (typically remote API calls
//! made by a data-access layer) and transparently retries them when the
//! remote service signals rate limiting, while a circuit breaker protects
//! the system from retry storms.
//!
//! # Features
//!
//! - **429 detection**: classify rate-limit failures by HTTP status or
//!   well-known message fragments, behind a narrow trait so callers keep
//!   their own error types
//! - **Exponential backoff with jitter**: doubling delays, capped, with a
//!   configurable random fraction to avoid synchronized retry storms
//! - **Retry-After support**: server-suggested delays (seconds or HTTP
//!   date) override the computed backoff
//! - **Circuit breaker**: consecutive rate-limit exhaustion events open the
//!   circuit to fail fast, with a lazy time-based reset and a manual
//!   recovery hook
//! - **Cancellation**: an optional token cancels both the in-flight
//!   operation and backoff sleeps
//! - **Observability**: structured `tracing` events on retries and circuit
//!   transitions
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rate_guard::{RateLimitSignal, RetryConfig, RetryContext, RetryExecutor};
//!
//! // Your data-access layer's error type, adapted via the signal trait.
//! #[derive(Debug)]
//! struct ApiError {
//!     status: u16,
//!     message: String,
//! }
//! # impl std::fmt::Display for ApiError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//! #         write!(f, "{}", self.message)
//! #     }
//! # }
//! # impl std::error::Error for ApiError {}
//!
//! impl RateLimitSignal for ApiError {
//!     fn status_code(&self) -> Option<u16> {
//!         Some(self.status)
//!     }
//! }
//!
//! # async fn fetch_contacts() -> Result<Vec<String>, ApiError> { Ok(vec![]) }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = RetryExecutor::new(RetryConfig::default())?;
//!
//!     let contacts = executor
//!         .execute_with_context(
//!             || fetch_contacts(),
//!             RetryContext::new().resource("contacts").operation("list"),
//!         )
//!         .await?;
//!
//!     println!("fetched {} contacts", contacts.len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! The executor is a pass-through decision layer: non-rate-limit failures
//! surface unchanged on their first occurrence, while exhausted retries and
//! circuit-breaker rejections come back as dedicated [`RetryError`]
//! variants that still carry the last underlying error. See
//! [`RetryError::user_message`] for the end-user rendering of the
//! rate-limit outcomes.
//!
//! # Sharing an executor
//!
//! Circuit state is per executor instance and mutex-guarded, so one
//! instance can be shared across tasks behind an `Arc`; isolated instances
//! (for tests, or per remote dependency) do not affect each other. There is
//! no global singleton.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// Module declarations
pub mod config;
pub mod error;
pub mod executor;
pub mod signal;

// Re-export configuration types
pub use config::{ConfigError, RetryConfig, RetryConfigBuilder};

// Re-export error types
pub use error::{RetryError, RetryResult};

// Re-export the executor
pub use executor::{CircuitSnapshot, RetryContext, RetryExecutor};

// Re-export the classification interface
pub use signal::{is_rate_limit_error, parse_retry_after, RateLimitSignal};
