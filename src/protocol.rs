//! Correlation protocol wire constants.
//!
//! # Headers
//! - `X-R-Reply-Id`: on an initial downstream response, marks it deferred.
//!   On an inbound POST, marks the request as a completion call.
//! - `X-R-Reply-Timeout`: window before the synthetic 504 fires.
//! - `X-R-Reply-Status`: status code carried by a completion call.
//!
//! Timeout values use Go-style duration strings (`30s`, `1m30s`, `250ms`),
//! since that is what existing downstream services emit.

use std::time::Duration;

use thiserror::Error;

/// Default name of the reply-id header.
pub const X_REPLY_ID: &str = "x-r-reply-id";

/// Header carrying the timeout window of a deferred response.
pub const X_REPLY_TIMEOUT: &str = "x-r-reply-timeout";

/// Header carrying the status code of a completion call.
pub const X_REPLY_STATUS: &str = "x-r-reply-status";

/// Body of the synthetic timeout response.
pub const GATEWAY_TIMEOUT_BODY: &str = "Gateway Timeout";

/// Error parsing a timeout window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} out of range")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" | "μs" => Some(1e3),
        "ms" => Some(1e6),
        "s" => Some(1e9),
        "m" => Some(60e9),
        "h" => Some(3600e9),
        _ => None,
    }
}

/// Parse a Go-style duration string such as `30s`, `1m30s` or `1.5h`.
///
/// Signs are rejected: a negative window has no meaning here.
pub fn parse_timeout(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_string()))?;

        rest = &rest[number_len..];
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;
        total_nanos += value * scale;
        rest = &rest[unit_len..];
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(DurationError::Overflow(input.to_string()));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Render a duration in the format accepted by [`parse_timeout`].
pub fn format_timeout(duration: Duration) -> String {
    let millis = duration.as_millis();
    if duration.subsec_nanos() % 1_000_000 != 0 {
        format!("{}ns", duration.as_nanos())
    } else if millis % 1000 != 0 {
        format!("{}ms", millis)
    } else {
        format!("{}s", duration.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_timeout("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_timeout("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_timeout("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_timeout("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_timeout("15us"), Ok(Duration::from_micros(15)));
        assert_eq!(parse_timeout("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn parses_compound_and_fractional() {
        assert_eq!(parse_timeout("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_timeout("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_timeout("1h0m2s"), Ok(Duration::from_secs(3602)));
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(parse_timeout(""), Err(DurationError::Empty));
        assert!(matches!(parse_timeout("30"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(parse_timeout("-5s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_timeout("5d"), Err(DurationError::UnknownUnit { .. })));
        assert!(matches!(parse_timeout("1..5s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_timeout("abc"), Err(DurationError::Invalid(_))));
    }

    #[test]
    fn format_is_parseable() {
        for d in [
            Duration::from_secs(30),
            Duration::from_millis(1500),
            Duration::from_nanos(42),
        ] {
            assert_eq!(parse_timeout(&format_timeout(d)), Ok(d));
        }
        assert_eq!(format_timeout(Duration::from_secs(30)), "30s");
    }
}
