//! Configuration for the retry executor.
//!
//! This module provides the configuration type and builder that control
//! executor behavior:
//!
//! - Retry budget and exponential backoff shape
//! - Jitter randomization
//! - Retry-After header handling
//! - Circuit breaker threshold and cooldown

use std::time::Duration;

use rand::Rng;

pub mod error;

pub use error::ConfigError;

/// Configuration for retry and circuit breaker behavior.
///
/// All fields are immutable once the executor is constructed. Use
/// [`RetryConfig::builder`] to override individual fields; anything left
/// unset falls back to the defaults below.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use rate_guard::RetryConfig;
///
/// let config = RetryConfig::builder()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(250))
///     .build()
///     .expect("valid config");
///
/// assert_eq!(config.max_retries, 5);
/// // Unset fields keep their defaults.
/// assert_eq!(config.circuit_breaker_threshold, 5);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (total attempts = `max_retries` + 1).
    pub max_retries: u32,

    /// Backoff duration before the first retry.
    pub initial_delay: Duration,

    /// Maximum backoff duration between retries.
    pub max_delay: Duration,

    /// Fraction of the exponential delay added as randomness, in `[0, 1]`.
    pub jitter_factor: f64,

    /// Whether a server-provided `Retry-After` value overrides the computed backoff.
    pub respect_retry_after: bool,

    /// Consecutive rate-limit exhaustion events before the circuit opens.
    pub circuit_breaker_threshold: u32,

    /// Cooldown before an open circuit is allowed to close again.
    pub circuit_open_reset: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.2,
            respect_retry_after: true,
            circuit_breaker_threshold: 5,
            circuit_open_reset: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Validate field values and their combinations.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `initial_delay` or
    /// `circuit_open_reset` is zero, `max_delay` is below `initial_delay`,
    /// `jitter_factor` falls outside `[0, 1]`, or
    /// `circuit_breaker_threshold` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay.is_zero() {
            return Err(ConfigError::invalid("initial_delay must be greater than zero"));
        }
        if self.max_delay < self.initial_delay {
            return Err(ConfigError::invalid(
                "max_delay must be greater than or equal to initial_delay",
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::invalid("jitter_factor must be within [0, 1]"));
        }
        if self.circuit_breaker_threshold == 0 {
            return Err(ConfigError::invalid(
                "circuit_breaker_threshold must be greater than zero",
            ));
        }
        if self.circuit_open_reset.is_zero() {
            return Err(ConfigError::invalid(
                "circuit_open_reset must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Total number of attempts the executor may make, including the first.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculate the backoff delay for a given retry attempt.
    ///
    /// The delay grows as `initial_delay * 2^attempt`, capped at
    /// `max_delay`, with `jitter_factor * delay * uniform[0, 1)` added on
    /// top. With a `jitter_factor` of zero the result is deterministic:
    ///
    /// ```
    /// use std::time::Duration;
    /// use rate_guard::RetryConfig;
    ///
    /// let config = RetryConfig {
    ///     jitter_factor: 0.0,
    ///     ..RetryConfig::default()
    /// };
    /// assert_eq!(config.backoff_delay(0), Duration::from_millis(100));
    /// assert_eq!(config.backoff_delay(1), Duration::from_millis(200));
    /// ```
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential =
            self.initial_delay.as_millis() as f64 * 2f64.powi(attempt.min(1024) as i32);
        let capped = exponential.min(self.max_delay.as_millis() as f64);

        let jitter = capped * self.jitter_factor * rand::thread_rng().gen::<f64>();

        Duration::from_millis((capped + jitter) as u64)
    }
}

/// Builder for [`RetryConfig`].
///
/// Unset fields fall back to [`RetryConfig::default`]. [`build`](Self::build)
/// validates the assembled configuration.
#[derive(Debug, Clone, Default)]
pub struct RetryConfigBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    jitter_factor: Option<f64>,
    respect_retry_after: Option<bool>,
    circuit_breaker_threshold: Option<u32>,
    circuit_open_reset: Option<Duration>,
}

impl RetryConfigBuilder {
    /// Set the number of retries after the first attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the backoff duration before the first retry.
    pub fn initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = Some(initial_delay);
        self
    }

    /// Set the maximum backoff duration between retries.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Set the jitter fraction, in `[0, 1]`.
    pub fn jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = Some(jitter_factor);
        self
    }

    /// Set whether `Retry-After` values override the computed backoff.
    pub fn respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = Some(respect);
        self
    }

    /// Set the number of consecutive exhaustion events that opens the circuit.
    pub fn circuit_breaker_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker_threshold = Some(threshold);
        self
    }

    /// Set the cooldown before an open circuit may close again.
    pub fn circuit_open_reset(mut self, cooldown: Duration) -> Self {
        self.circuit_open_reset = Some(cooldown);
        self
    }

    /// Assemble and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] under the same conditions as
    /// [`RetryConfig::validate`].
    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        let defaults = RetryConfig::default();
        let config = RetryConfig {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            initial_delay: self.initial_delay.unwrap_or(defaults.initial_delay),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
            jitter_factor: self.jitter_factor.unwrap_or(defaults.jitter_factor),
            respect_retry_after: self
                .respect_retry_after
                .unwrap_or(defaults.respect_retry_after),
            circuit_breaker_threshold: self
                .circuit_breaker_threshold
                .unwrap_or(defaults.circuit_breaker_threshold),
            circuit_open_reset: self.circuit_open_reset.unwrap_or(defaults.circuit_open_reset),
        };
        config.validate()?;
        Ok(config)
    }
}
