//! Text parsers for scalar types that do not come with a `FromStr` that
//! matches configuration conventions.

use std::time::Duration;

use crate::hooks::HookRegistry;

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid boolean '{s}'")),
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. Every number needs a
/// unit except a bare `0`. Negative durations are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let invalid = |why: &str| format!("invalid duration '{s}': {why}");

    let body = s.strip_prefix('+').unwrap_or(s);
    if body.starts_with('-') {
        return Err(invalid("negative durations are not supported"));
    }
    if body == "0" {
        return Ok(Duration::ZERO);
    }
    if body.is_empty() {
        return Err(invalid("empty"));
    }

    let mut total: u128 = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| invalid("missing unit"))?;
        let (number, tail) = rest.split_at(num_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            "" => return Err(invalid("missing unit")),
            other => return Err(invalid(&format!("unknown unit '{other}'"))),
        };

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("missing number"));
        }
        if frac.contains('.') {
            return Err(invalid("malformed number"));
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("number too large"))?
        };

        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("overflow"))?;
        // Digits beyond nanosecond precision cannot change the result.
        let mut div: u128 = 1;
        let mut frac_value: u128 = 0;
        for digit in frac.bytes().take(18) {
            frac_value = frac_value * 10 + u128::from(digit - b'0');
            div *= 10;
        }
        nanos += frac_value * scale / div;

        total = total
            .checked_add(nanos)
            .ok_or_else(|| invalid("overflow"))?;
        rest = next;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid("overflow"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

#[cfg(feature = "chrono")]
mod temporal {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    /// RFC 3339, normalized to UTC.
    pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
    }

    /// `2024-01-02T03:04:05` or `2024-01-02 03:04:05`, optional fraction.
    pub fn parse_naive_datetime(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
    }
}

#[cfg(feature = "chrono")]
pub use temporal::{parse_date, parse_datetime, parse_naive_datetime};

/// Seed the converters every registry starts with.
pub(crate) fn register_builtins(hooks: &mut HookRegistry) {
    hooks.register_converter::<Duration, _, _>(parse_duration);

    #[cfg(feature = "chrono")]
    {
        hooks.register_converter::<chrono::DateTime<chrono::Utc>, _, _>(parse_datetime);
        hooks.register_converter::<chrono::NaiveDate, _, _>(parse_date);
        hooks.register_converter::<chrono::NaiveDateTime, _, _>(parse_naive_datetime);
    }
}
