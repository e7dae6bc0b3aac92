//! The rate-limit-aware retry executor.
//!
//! [`RetryExecutor`] wraps an arbitrary async operation and transparently
//! retries it when the remote service signals rate limiting, with
//! exponential backoff and optional `Retry-After` overrides. A built-in
//! circuit breaker tracks consecutive rate-limit exhaustion events across
//! calls and fails fast once a threshold is crossed, closing again after a
//! cooldown.
//!
//! The executor holds no global state: construct one per remote dependency
//! and share it across tasks behind an `Arc`. All circuit state is guarded
//! by a mutex with short critical sections that are never held across an
//! `.await`.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{ConfigError, RetryConfig};
use crate::error::{RetryError, RetryResult};
use crate::signal::{is_rate_limit_error, parse_retry_after, RateLimitSignal};

/// Informational labels attached to log events for a single call.
///
/// Purely observability; the labels never influence retry decisions.
#[derive(Debug, Clone, Default)]
pub struct RetryContext {
    /// The resource the operation touches (e.g. `"contacts"`).
    pub resource_name: Option<String>,
    /// The operation being performed (e.g. `"create"`).
    pub operation_name: Option<String>,
}

impl RetryContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the resource the operation touches.
    pub fn resource(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    /// Label the operation being performed.
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Read-only view of the circuit breaker, for monitoring and dashboards.
#[derive(Debug, Clone, Copy)]
pub struct CircuitSnapshot {
    /// Whether the circuit is currently open.
    pub is_open: bool,
    /// Consecutive rate-limit exhaustion events since the last success or reset.
    pub consecutive_failures: u32,
    /// When the most recent rate-limit failure was recorded.
    pub last_failure: Option<Instant>,
    /// Elapsed time since the most recent rate-limit failure.
    pub time_since_last_failure: Option<Duration>,
}

/// Mutable circuit state shared by every call on one executor.
///
/// Invariant: `is_open` is set only when `consecutive_failures` has reached
/// the configured threshold, and cleared only by the lazy cooldown check or
/// an explicit [`RetryExecutor::reset_circuit`].
#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    is_open: bool,
    last_failure: Option<Instant>,
}

/// Rate-limit-aware retry executor with a circuit breaker.
///
/// # Example
///
/// ```no_run
/// use rate_guard::{RetryConfig, RetryContext, RetryExecutor, RateLimitSignal};
///
/// # #[derive(Debug)]
/// # struct ApiError;
/// # impl std::fmt::Display for ApiError {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
/// #         write!(f, "api error")
/// #     }
/// # }
/// # impl std::error::Error for ApiError {}
/// # impl RateLimitSignal for ApiError {}
/// # async fn create_contact() -> Result<u64, ApiError> { Ok(1) }
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = RetryExecutor::new(RetryConfig::default())?;
///
/// let id = executor
///     .execute_with_context(
///         || create_contact(),
///         RetryContext::new().resource("contacts").operation("create"),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
    circuit: Mutex<CircuitState>,
}

impl RetryExecutor {
    /// Create an executor with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails
    /// [`RetryConfig::validate`].
    pub fn new(config: RetryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            circuit: Mutex::new(CircuitState::default()),
        })
    }

    /// Create an executor with the default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: RetryConfig::default(),
            circuit: Mutex::new(CircuitState::default()),
        }
    }

    /// The configuration this executor was constructed with.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation, retrying rate-limit failures.
    ///
    /// Returns the operation's success value unchanged, the operation's own
    /// error for non-rate-limit failures (no retry), or a wrapped error once
    /// the retry budget is exhausted or the circuit breaker intervenes.
    pub async fn execute_with_retry<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal,
    {
        self.execute_inner(operation, RetryContext::default(), None)
            .await
    }

    /// Like [`execute_with_retry`](Self::execute_with_retry), with labels
    /// attached to the log events this call emits.
    pub async fn execute_with_context<F, Fut, T, E>(
        &self,
        operation: F,
        context: RetryContext,
    ) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal,
    {
        self.execute_inner(operation, context, None).await
    }

    /// Like [`execute_with_context`](Self::execute_with_context), racing the
    /// operation and every backoff sleep against a cancellation token.
    ///
    /// Cancellation yields [`RetryError::Cancelled`], distinct from every
    /// other outcome. Callers that never cancel can use the token-free entry
    /// points and see identical behavior.
    pub async fn execute_cancellable<F, Fut, T, E>(
        &self,
        operation: F,
        context: RetryContext,
        cancel: &CancellationToken,
    ) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal,
    {
        self.execute_inner(operation, context, Some(cancel)).await
    }

    async fn execute_inner<F, Fut, T, E>(
        &self,
        mut operation: F,
        context: RetryContext,
        cancel: Option<&CancellationToken>,
    ) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal,
    {
        self.try_reset_circuit();

        // Fail fast while open. Checked once per call, not per attempt: a
        // sibling call tripping the breaker mid-flight affects this caller's
        // next call, not the loop already in progress.
        if self.circuit.lock().is_open {
            error!(
                resource = context.resource_name.as_deref(),
                operation = context.operation_name.as_deref(),
                "circuit breaker is open; rejecting call without attempting"
            );
            return Err(RetryError::CircuitOpen { source: None });
        }

        let total_attempts = self.config.total_attempts();
        let mut attempt: u32 = 0;

        loop {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(RetryError::Cancelled);
                }
            }

            let result = match cancel {
                Some(token) => tokio::select! {
                    result = operation() => result,
                    _ = token.cancelled() => return Err(RetryError::Cancelled),
                },
                None => operation().await,
            };

            let err = match result {
                Ok(value) => {
                    // A success always clears the streak, even mid-sequence.
                    self.circuit.lock().consecutive_failures = 0;
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !is_rate_limit_error(&err) {
                self.circuit.lock().consecutive_failures = 0;
                return Err(RetryError::Operation(err));
            }

            self.circuit.lock().last_failure = Some(Instant::now());

            if attempt >= self.config.max_retries {
                return Err(self.record_exhaustion(err, &context));
            }

            let mut delay = self.config.backoff_delay(attempt);
            if self.config.respect_retry_after {
                if let Some(hinted) = parse_retry_after(&err) {
                    delay = hinted;
                }
            }

            warn!(
                attempt = attempt + 1,
                total_attempts,
                delay_ms = delay.as_millis() as u64,
                resource = context.resource_name.as_deref(),
                operation = context.operation_name.as_deref(),
                error = %err,
                "rate limited; backing off before retry"
            );

            match cancel {
                Some(token) => tokio::select! {
                    _ = sleep(delay) => {}
                    _ = token.cancelled() => return Err(RetryError::Cancelled),
                },
                None => sleep(delay).await,
            }

            attempt += 1;
        }
    }

    /// Record that a call exhausted its retry budget on rate-limit errors,
    /// opening the circuit if the streak reaches the threshold. Opening
    /// preempts the max-retries error.
    fn record_exhaustion<E>(&self, err: E, context: &RetryContext) -> RetryError<E>
    where
        E: RateLimitSignal,
    {
        let mut circuit = self.circuit.lock();
        circuit.consecutive_failures += 1;
        circuit.last_failure = Some(Instant::now());

        if circuit.consecutive_failures >= self.config.circuit_breaker_threshold {
            circuit.is_open = true;
            error!(
                consecutive_failures = circuit.consecutive_failures,
                threshold = self.config.circuit_breaker_threshold,
                cooldown_ms = self.config.circuit_open_reset.as_millis() as u64,
                resource = context.resource_name.as_deref(),
                operation = context.operation_name.as_deref(),
                "circuit breaker opened after consecutive rate-limit exhaustions"
            );
            return RetryError::CircuitOpen { source: Some(err) };
        }

        RetryError::MaxRetriesExceeded {
            retries: self.config.max_retries,
            source: err,
        }
    }

    /// Close the circuit if the cooldown has elapsed since the last failure.
    ///
    /// Evaluated lazily at the start of every call rather than by a
    /// background timer. There is no half-open probe phase: once the
    /// cooldown elapses the breaker closes fully and the next call proceeds
    /// with its whole retry budget.
    fn try_reset_circuit(&self) {
        let mut circuit = self.circuit.lock();
        if !circuit.is_open {
            return;
        }
        let Some(last_failure) = circuit.last_failure else {
            return;
        };
        if last_failure.elapsed() > self.config.circuit_open_reset {
            circuit.is_open = false;
            circuit.consecutive_failures = 0;
            info!("circuit breaker closed after cooldown");
        }
    }

    /// Snapshot the circuit breaker state.
    pub fn circuit_state(&self) -> CircuitSnapshot {
        let circuit = self.circuit.lock();
        CircuitSnapshot {
            is_open: circuit.is_open,
            consecutive_failures: circuit.consecutive_failures,
            last_failure: circuit.last_failure,
            time_since_last_failure: circuit.last_failure.map(|at| at.elapsed()),
        }
    }

    /// Unconditionally close the circuit and clear the failure streak.
    ///
    /// Operational recovery hook, typically wired to an admin action.
    pub fn reset_circuit(&self) {
        let mut circuit = self.circuit.lock();
        circuit.is_open = false;
        circuit.consecutive_failures = 0;
        circuit.last_failure = None;
        info!("circuit breaker manually reset");
    }
}
