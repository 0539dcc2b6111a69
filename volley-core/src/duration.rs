//! Duration strings with explicit units (`250ms`, `1.5s`, `1h30m`).
//!
//! A bare number such as `42` is rejected: every component needs a unit. The
//! only exception is the literal `0`.

use serde::Serializer;
use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Error produced when a duration string cannot be parsed.
///
/// The messages are part of the public error payload, so they are kept stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("time: invalid duration {input:?}")]
    Invalid { input: String },

    #[error("time: missing unit in duration {input:?}")]
    MissingUnit { input: String },

    #[error("time: unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{00b5}s" | "\u{03bc}s" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(3600 * NANOS_PER_SECOND),
        _ => None,
    }
}

/// Split the leading run of ASCII digits off `s`.
fn leading_digits(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Parse a duration such as `300ms`, `2s`, `1.5m` or `1h15m30s`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let invalid = || DurationParseError::Invalid {
        input: input.to_string(),
    };

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        if !rest.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let (int_part, after_int) = leading_digits(rest);
        let whole: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        rest = after_int;

        let mut fraction = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let (digits, after_fraction) = leading_digits(after_dot);
            fraction = digits;
            rest = after_fraction;
        }
        if int_part.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_end = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        if unit_end == 0 {
            return Err(DurationParseError::MissingUnit {
                input: input.to_string(),
            });
        }
        let (unit, after_unit) = rest.split_at(unit_end);
        let scale = unit_nanos(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;
        rest = after_unit;

        let mut component = whole.checked_mul(scale).ok_or_else(invalid)?;
        if !fraction.is_empty() {
            // Only the digits that can still contribute at nanosecond resolution matter.
            let significant = &fraction[..fraction.len().min(18)];
            let numerator: u64 = significant.parse().map_err(|_| invalid())?;
            let denominator = 10u64.pow(significant.len() as u32);
            let partial = (numerator as u128 * scale as u128) / denominator as u128;
            component = component
                .checked_add(u64::try_from(partial).map_err(|_| invalid())?)
                .ok_or_else(invalid)?;
        }
        total = total.checked_add(component).ok_or_else(invalid)?;
    }

    Ok(Duration::from_nanos(total))
}

/// Render a duration in the same unit notation [`parse_duration`] accepts.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}us", trim_fraction(nanos as f64 / 1_000.0));
    }
    if nanos < NANOS_PER_SECOND as u128 {
        return format!("{}ms", trim_fraction(nanos as f64 / 1_000_000.0));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = (total_secs % 60) as f64 + f64::from(duration.subsec_nanos()) / 1e9;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&format!("{}s", trim_fraction(seconds)));
    out
}

fn trim_fraction(value: f64) -> String {
    let rendered = format!("{:.9}", value);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Serde helper that writes an optional duration in unit notation.
pub mod serde_unit_duration_option {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("20ms").unwrap(), Duration::from_millis(20));
        assert_eq!(parse_duration("15us").unwrap(), Duration::from_micros(15));
        assert_eq!(parse_duration("15µs").unwrap(), Duration::from_micros(15));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
        assert_eq!(parse_duration("3m").unwrap(), Duration::from_secs(180));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::from_millis(500));
        assert_eq!(
            parse_duration("1m0.25s").unwrap(),
            Duration::from_millis(60_250)
        );
    }

    #[test]
    fn test_missing_unit() {
        let err = parse_duration("42").unwrap_err();
        assert_eq!(err.to_string(), "time: missing unit in duration \"42\"");

        let err = parse_duration("1s42").unwrap_err();
        assert_eq!(err.to_string(), "time: missing unit in duration \"1s42\"");
    }

    #[test]
    fn test_unknown_unit_and_invalid() {
        let err = parse_duration("3y").unwrap_err();
        assert_eq!(err.to_string(), "time: unknown unit \"y\" in duration \"3y\"");

        assert_eq!(
            parse_duration("").unwrap_err().to_string(),
            "time: invalid duration \"\""
        );
        assert_eq!(
            parse_duration("abc").unwrap_err().to_string(),
            "time: invalid duration \"abc\""
        );
        assert_eq!(
            parse_duration(".s").unwrap_err().to_string(),
            "time: invalid duration \".s\""
        );
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(20)), "20ms");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn test_format_parses_back() {
        for raw in ["1h15m30s", "250ms", "42s", "3.25s"] {
            let parsed = parse_duration(raw).unwrap();
            assert_eq!(parse_duration(&format_duration(parsed)).unwrap(), parsed);
        }
    }
}
