//! TTL parsing and formatting.
//!
//! Accepts compact duration strings such as `90s`, `30m`, `1h`, `1h30m` or
//! `2d`. Units may be combined in any order but each component needs one.

use std::time::Duration;

use crate::error::{CoreError, Result};

/// Parse a compact duration string.
pub fn parse_ttl(input: &str) -> Result<Duration> {
    let s = input.trim();
    let invalid = |reason: &str| CoreError::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if s.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total_ms: u64 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(invalid("expected a number"));
        }
        let (number, tail) = rest.split_at(digits);
        let value: u64 = number.parse().map_err(|_| invalid("number too large"))?;

        let unit_len = tail.bytes().take_while(u8::is_ascii_alphabetic).count();
        let (unit, tail) = tail.split_at(unit_len);
        let factor_ms: u64 = match unit {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60 * 1_000,
            "h" => 60 * 60 * 1_000,
            "d" => 24 * 60 * 60 * 1_000,
            "" => return Err(invalid("missing unit (use ms, s, m, h or d)")),
            other => return Err(invalid(&format!("unknown unit '{other}'"))),
        };

        total_ms = value
            .checked_mul(factor_ms)
            .and_then(|v| total_ms.checked_add(v))
            .ok_or_else(|| invalid("duration too large"))?;
        rest = tail;
    }

    if total_ms == 0 {
        return Err(invalid("duration must be positive"));
    }

    Ok(Duration::from_millis(total_ms))
}

/// Format a duration in the same compact notation, e.g. `1h30m`.
pub fn format_ttl(ttl: Duration) -> String {
    let mut secs = ttl.as_secs();
    let millis = ttl.subsec_millis();

    if secs == 0 {
        return format!("{millis}ms");
    }

    let mut out = String::new();
    for (unit, size) in [("h", 3600), ("m", 60), ("s", 1)] {
        let n = secs / size;
        if n > 0 {
            out.push_str(&format!("{n}{unit}"));
            secs %= size;
        }
    }
    if millis > 0 {
        out.push_str(&format!("{millis}ms"));
    }
    out
}
