//! Error types for the retry executor.
//!
//! The executor is a pass-through decision layer over the caller's own error
//! type `E`: a failure either surfaces unchanged, or is wrapped to record
//! that the retry budget was exhausted or the circuit breaker intervened.
//!
//! # Taxonomy
//!
//! - [`RetryError::Operation`]: any failure not classified as a rate limit,
//!   surfaced on its first occurrence with no retry.
//! - [`RetryError::MaxRetriesExceeded`]: the operation kept failing with
//!   rate-limit errors until the retry budget ran out.
//! - [`RetryError::CircuitOpen`]: the breaker tripped during this call
//!   (carries the triggering error), or the call was rejected up front
//!   because the breaker was already open (no inner error).
//! - [`RetryError::Cancelled`]: the caller's cancellation token fired.
//!
//! # Examples
//!
//! ```
//! use rate_guard::RetryError;
//!
//! fn describe(error: &RetryError<std::io::Error>) -> &str {
//!     if error.is_rate_limit_exhaustion() {
//!         error.user_message().unwrap()
//!     } else {
//!         "operation failed"
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type alias for executor calls: the operation's success value, or
/// a [`RetryError`] wrapping the operation's error type.
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Error returned by [`RetryExecutor`](crate::RetryExecutor) calls.
///
/// Generic over the caller's error type `E`. No error is swallowed: every
/// failure path either passes `E` through unchanged or wraps the last
/// underlying error so callers can still inspect it.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// A failure the classifier did not recognize as a rate limit,
    /// surfaced unchanged with no retry attempted.
    #[error(transparent)]
    Operation(E),

    /// The operation kept failing with rate-limit errors until the retry
    /// budget was exhausted.
    #[error("rate limit error persisted after {retries} retries")]
    MaxRetriesExceeded {
        /// Number of retries that were attempted after the first try.
        retries: u32,
        /// The last underlying rate-limit error.
        #[source]
        source: E,
    },

    /// The circuit breaker is open.
    ///
    /// `source` is `Some` when the breaker tripped as a direct result of
    /// this call's failures, and `None` when the call was rejected before
    /// any attempt because the breaker was already open.
    #[error("rate limit circuit breaker is open; rejecting calls until the cooldown elapses")]
    CircuitOpen {
        /// The rate-limit error that tripped the breaker, if this call did.
        #[source]
        source: Option<E>,
    },

    /// The caller's cancellation token fired during the operation or a
    /// backoff sleep.
    #[error("operation cancelled")]
    Cancelled,
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The underlying operation error, if this outcome carries one.
    pub fn original_error(&self) -> Option<&E> {
        match self {
            RetryError::Operation(error) => Some(error),
            RetryError::MaxRetriesExceeded { source, .. } => Some(source),
            RetryError::CircuitOpen { source } => source.as_ref(),
            RetryError::Cancelled => None,
        }
    }

    /// Consume the error, returning the underlying operation error if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Operation(error) => Some(error),
            RetryError::MaxRetriesExceeded { source, .. } => Some(source),
            RetryError::CircuitOpen { source } => source,
            RetryError::Cancelled => None,
        }
    }

    /// True when the failure is a rate-limit outcome (exhausted retries or
    /// an intervening circuit breaker) rather than a passthrough or a
    /// cancellation.
    pub fn is_rate_limit_exhaustion(&self) -> bool {
        matches!(
            self,
            RetryError::MaxRetriesExceeded { .. } | RetryError::CircuitOpen { .. }
        )
    }

    /// A message suitable for end users, for the rate-limit outcomes.
    ///
    /// Passthrough errors keep whatever message the underlying operation
    /// produced, so this returns `None` for them (and for cancellation).
    pub fn user_message(&self) -> Option<&'static str> {
        if self.is_rate_limit_exhaustion() {
            Some("The system is temporarily overloaded. Please try again shortly.")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct StubError(&'static str);

    impl fmt::Display for StubError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for StubError {}

    #[test]
    fn test_operation_display_is_transparent() {
        let error: RetryError<StubError> = RetryError::Operation(StubError("boom"));
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_max_retries_message_states_retry_count() {
        let error: RetryError<StubError> = RetryError::MaxRetriesExceeded {
            retries: 2,
            source: StubError("throttled"),
        };
        assert_eq!(
            error.to_string(),
            "rate limit error persisted after 2 retries"
        );
    }

    #[test]
    fn test_circuit_open_message() {
        let error: RetryError<StubError> = RetryError::CircuitOpen { source: None };
        assert!(error.to_string().contains("circuit breaker is open"));
    }

    #[test]
    fn test_original_error() {
        let exhausted: RetryError<StubError> = RetryError::MaxRetriesExceeded {
            retries: 3,
            source: StubError("last"),
        };
        assert_eq!(exhausted.original_error(), Some(&StubError("last")));

        let tripped: RetryError<StubError> = RetryError::CircuitOpen {
            source: Some(StubError("tripped")),
        };
        assert_eq!(tripped.original_error(), Some(&StubError("tripped")));

        let rejected: RetryError<StubError> = RetryError::CircuitOpen { source: None };
        assert_eq!(rejected.original_error(), None);

        let cancelled: RetryError<StubError> = RetryError::Cancelled;
        assert_eq!(cancelled.original_error(), None);
    }

    #[test]
    fn test_into_inner() {
        let error: RetryError<StubError> = RetryError::Operation(StubError("raw"));
        assert_eq!(error.into_inner(), Some(StubError("raw")));
    }

    #[test]
    fn test_source_chain_preserved() {
        use std::error::Error as _;

        let error: RetryError<StubError> = RetryError::MaxRetriesExceeded {
            retries: 1,
            source: StubError("inner"),
        };
        let source = error.source().expect("source present");
        assert_eq!(source.to_string(), "inner");
    }

    #[test]
    fn test_user_message_only_for_rate_limit_outcomes() {
        let exhausted: RetryError<StubError> = RetryError::MaxRetriesExceeded {
            retries: 1,
            source: StubError("x"),
        };
        assert!(exhausted.user_message().is_some());
        assert!(exhausted.is_rate_limit_exhaustion());

        let rejected: RetryError<StubError> = RetryError::CircuitOpen { source: None };
        assert!(rejected.user_message().is_some());

        let passthrough: RetryError<StubError> = RetryError::Operation(StubError("x"));
        assert!(passthrough.user_message().is_none());
        assert!(!passthrough.is_rate_limit_exhaustion());

        let cancelled: RetryError<StubError> = RetryError::Cancelled;
        assert!(cancelled.user_message().is_none());
    }
}
