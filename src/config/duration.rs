use std::time::Duration;

use regex::Regex;

use crate::errors::{JournalistError, JournalistResult};

const COMPONENT: &str = r"(\d+\.?\d*|\.\d+)(ns|us|µs|ms|s|m|h)";

/// Parse a duration such as `90s`, `72h` or `1h30m`.
///
/// Negative and zero durations parse to `Duration::ZERO`, which callers treat
/// as "disabled".
pub fn parse_duration(field: &str, value: &str) -> JournalistResult<Duration> {
    let invalid = || JournalistError::InvalidDuration {
        field: field.to_string(),
        value: value.to_string(),
    };

    let raw = value.trim();
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if body == "0" {
        return Ok(Duration::ZERO);
    }

    let regex = Regex::new(COMPONENT).map_err(|e| JournalistError::Config(e.to_string()))?;
    let mut consumed = 0;
    let mut nanos = 0f64;

    for caps in regex.captures_iter(body) {
        let (Some(whole), Some(number), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            return Err(invalid());
        };
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let number: f64 = number.as_str().parse().map_err(|_| invalid())?;
        let scale = match unit.as_str() {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        nanos += number * scale;
    }

    if consumed == 0 || consumed != body.len() || !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    if negative {
        return Ok(Duration::ZERO);
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Like [`parse_duration`], with `default` used for a blank value
pub fn parse_duration_or(field: &str, value: &str, default: Duration) -> JournalistResult<Duration> {
    if value.trim().is_empty() {
        Ok(default)
    } else {
        parse_duration(field, value)
    }
}
