//! Rate-limit classification of caller errors.
//!
//! The executor never inspects the caller's error type directly; it sees it
//! only through the narrow [`RateLimitSignal`] interface. The substring
//! heuristics in [`is_rate_limit_error`] are intentionally preserved from the
//! service this crate replaces, so classification stays compatible with
//! providers that only surface a message string. Swapping in a stricter,
//! fully typed classification later only touches this module.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Case-sensitive message fragments that identify a rate-limit error when no
/// status code is available.
const RATE_LIMIT_MARKERS: [&str; 3] = ["429", "rate limit", "Too Many Requests"];

/// The narrow interface through which the executor classifies caller errors.
///
/// Both provided methods default to `None`, so an error type that carries
/// neither a status code nor headers can still participate via its `Display`
/// output alone.
///
/// # Example
///
/// ```
/// use rate_guard::RateLimitSignal;
///
/// #[derive(Debug)]
/// struct ApiError {
///     status: u16,
///     message: String,
/// }
///
/// impl std::fmt::Display for ApiError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", self.message)
///     }
/// }
///
/// impl std::error::Error for ApiError {}
///
/// impl RateLimitSignal for ApiError {
///     fn status_code(&self) -> Option<u16> {
///         Some(self.status)
///     }
/// }
/// ```
pub trait RateLimitSignal: std::error::Error + 'static {
    /// The HTTP status carried by this error, if any.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// The raw `Retry-After` header value carried by this error, if any.
    ///
    /// Implementations are responsible for the case-insensitive header-map
    /// lookup; the executor only parses whatever value is returned here.
    fn retry_after(&self) -> Option<String> {
        None
    }
}

/// Decide whether a failure is a rate-limit error worth retrying.
///
/// True when the error carries HTTP status 429, or when its message contains
/// one of the case-sensitive substrings `"429"`, `"rate limit"`, or
/// `"Too Many Requests"`. Anything else is left for outer policies; this
/// executor will not retry it.
pub fn is_rate_limit_error<E>(error: &E) -> bool
where
    E: RateLimitSignal,
{
    if error.status_code() == Some(429) {
        return true;
    }

    let message = error.to_string();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Extract a server-suggested retry delay from an error.
///
/// Two formats are accepted:
///
/// - an integer string, interpreted as seconds;
/// - an RFC 1123 HTTP date, yielding `max(0, date - now)`.
///
/// Any other value (negative integer, malformed date) yields `None` and the
/// executor falls back to its computed exponential backoff. Pure function of
/// the error; no side effects.
pub fn parse_retry_after<E>(error: &E) -> Option<Duration>
where
    E: RateLimitSignal,
{
    let raw = error.retry_after()?;
    let value = raw.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let remaining = date.signed_duration_since(Utc::now());
    // A date already in the past clamps to an immediate retry.
    Some(remaining.to_std().unwrap_or(Duration::ZERO))
}
