//! The cast engine: conversions between any two scalar kinds.

use crate::decimal;
use crate::error::{RangeFlags, Result, ValueError};
use crate::kind::Kind;
use crate::value::Value;
use crate::varlen::VarlenPool;

fn range_err(value: impl std::fmt::Display, from: Kind, to: Kind, negative: bool) -> ValueError {
    ValueError::NumericOutOfRange {
        value: value.to_string(),
        from,
        to,
        flags: RangeFlags::from_sign(negative),
    }
}

fn mismatch(from: Kind, to: Kind) -> ValueError {
    ValueError::TypeMismatch { from, to }
}

/// Cast `value` to `to`, allocating any Varchar result from `pool`.
///
/// NULL propagates: casting a NULL value of any kind produces a NULL of
/// the destination kind, without a range check.
pub fn cast(value: &Value, to: Kind, pool: &dyn VarlenPool) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::null_of(to));
    }
    if value.kind() == to {
        return Ok(value.clone());
    }

    match to {
        Kind::TinyInt => cast_to_i8(value),
        Kind::SmallInt => cast_to_i16(value),
        Kind::Integer => cast_to_i32(value),
        Kind::BigInt => cast_to_i64(value),
        Kind::Timestamp => cast_to_timestamp(value),
        Kind::Double => cast_to_double(value),
        Kind::Decimal => cast_to_decimal(value),
        Kind::Boolean => cast_to_boolean(value),
        Kind::Varchar => cast_to_varchar(value, pool),
        Kind::Address => cast_to_address(value),
        Kind::Varbinary | Kind::Array | Kind::Null | Kind::Invalid => {
            Err(mismatch(value.kind(), to))
        }
    }
}

fn as_source_i64(value: &Value) -> Result<i64> {
    match value.kind() {
        Kind::TinyInt => Ok(i64::from(value.as_i8())),
        Kind::SmallInt => Ok(i64::from(value.as_i16())),
        Kind::Integer => Ok(i64::from(value.as_i32())),
        Kind::BigInt | Kind::Timestamp => Ok(value.as_i64()),
        Kind::Address => Ok(value.as_address() as i64),
        Kind::Boolean => Ok(i64::from(value.as_bool())),
        _ => Err(mismatch(value.kind(), Kind::BigInt)),
    }
}

fn cast_to_i8(value: &Value) -> Result<Value> {
    match value.kind() {
        Kind::Double => {
            let truncated = value.as_f64().trunc();
            if truncated < f64::from(i8::MIN) || truncated > f64::from(i8::MAX) {
                return Err(range_err(value.as_f64(), Kind::Double, Kind::TinyInt, truncated < 0.0));
            }
            Ok(Value::from_i8(truncated as i8))
        }
        Kind::Decimal => {
            let whole = decimal::to_i64(value.as_decimal_scaled())?;
            i8::try_from(whole)
                .map(Value::from_i8)
                .map_err(|_| range_err(whole, Kind::Decimal, Kind::TinyInt, whole < 0))
        }
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::TinyInt))?;
            text.trim()
                .parse::<i8>()
                .map(Value::from_i8)
                .map_err(|_| ValueError::InvalidFormat { kind: Kind::TinyInt, text: text.into_owned() })
        }
        _ => {
            let wide = as_source_i64(value)?;
            i8::try_from(wide)
                .map(Value::from_i8)
                .map_err(|_| range_err(wide, value.kind(), Kind::TinyInt, wide < 0))
        }
    }
}

fn cast_to_i16(value: &Value) -> Result<Value> {
    match value.kind() {
        Kind::Double => {
            let truncated = value.as_f64().trunc();
            if truncated < f64::from(i16::MIN) || truncated > f64::from(i16::MAX) {
                return Err(range_err(value.as_f64(), Kind::Double, Kind::SmallInt, truncated < 0.0));
            }
            Ok(Value::from_i16(truncated as i16))
        }
        Kind::Decimal => {
            let whole = decimal::to_i64(value.as_decimal_scaled())?;
            i16::try_from(whole)
                .map(Value::from_i16)
                .map_err(|_| range_err(whole, Kind::Decimal, Kind::SmallInt, whole < 0))
        }
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::SmallInt))?;
            text.trim()
                .parse::<i16>()
                .map(Value::from_i16)
                .map_err(|_| ValueError::InvalidFormat { kind: Kind::SmallInt, text: text.into_owned() })
        }
        _ => {
            let wide = as_source_i64(value)?;
            i16::try_from(wide)
                .map(Value::from_i16)
                .map_err(|_| range_err(wide, value.kind(), Kind::SmallInt, wide < 0))
        }
    }
}

fn cast_to_i32(value: &Value) -> Result<Value> {
    match value.kind() {
        Kind::Double => {
            let truncated = value.as_f64().trunc();
            if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
                return Err(range_err(value.as_f64(), Kind::Double, Kind::Integer, truncated < 0.0));
            }
            Ok(Value::from_i32(truncated as i32))
        }
        Kind::Decimal => {
            let whole = decimal::to_i64(value.as_decimal_scaled())?;
            i32::try_from(whole)
                .map(Value::from_i32)
                .map_err(|_| range_err(whole, Kind::Decimal, Kind::Integer, whole < 0))
        }
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::Integer))?;
            text.trim()
                .parse::<i32>()
                .map(Value::from_i32)
                .map_err(|_| ValueError::InvalidFormat { kind: Kind::Integer, text: text.into_owned() })
        }
        _ => {
            let wide = as_source_i64(value)?;
            i32::try_from(wide)
                .map(Value::from_i32)
                .map_err(|_| range_err(wide, value.kind(), Kind::Integer, wide < 0))
        }
    }
}

fn cast_to_i64(value: &Value) -> Result<Value> {
    match value.kind() {
        Kind::Double => {
            let truncated = value.as_f64().trunc();
            if truncated < -9_223_372_036_854_775_808.0 || truncated >= 9_223_372_036_854_775_808.0 {
                return Err(range_err(value.as_f64(), Kind::Double, Kind::BigInt, truncated < 0.0));
            }
            Ok(Value::from_i64(truncated as i64))
        }
        Kind::Decimal => decimal::to_i64(value.as_decimal_scaled()).map(Value::from_i64),
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::BigInt))?;
            text.trim()
                .parse::<i64>()
                .map(Value::from_i64)
                .map_err(|_| ValueError::InvalidFormat { kind: Kind::BigInt, text: text.into_owned() })
        }
        _ => as_source_i64(value).map(Value::from_i64),
    }
}

fn cast_to_timestamp(value: &Value) -> Result<Value> {
    match value.kind() {
        Kind::BigInt => Ok(Value::from_timestamp(value.as_i64())),
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::Timestamp))?;
            parse_timestamp_text(&text)
        }
        #[cfg(feature = "nonstandard-timestamp-casts")]
        Kind::Double | Kind::Decimal => {
            // Gated: treats the numeric value as whole microseconds.
            // Non-standard because most SQL dialects forbid an implicit
            // Double/Decimal -> Timestamp cast; enabled only for
            // compatibility shims that need it.
            let micros = cast_to_i64(value)?.as_i64();
            Ok(Value::from_timestamp(micros))
        }
        #[cfg(not(feature = "nonstandard-timestamp-casts"))]
        Kind::Double | Kind::Decimal => Err(ValueError::UnsupportedOperation(format!(
            "{} -> TIMESTAMP cast requires the nonstandard-timestamp-casts feature",
            value.kind()
        ))),
        other if other.is_integer_family() => {
            Ok(Value::from_timestamp(as_source_i64(value)?))
        }
        _ => Err(mismatch(value.kind(), Kind::Timestamp)),
    }
}

fn parse_timestamp_text(text: &str) -> Result<Value> {
    use chrono::NaiveDateTime;
    let trimmed = text.trim();
    let parsed = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| ValueError::InvalidFormat { kind: Kind::Timestamp, text: text.to_owned() })?;
    let micros = parsed.and_utc().timestamp_micros();
    Ok(Value::from_timestamp(micros))
}

fn cast_to_double(value: &Value) -> Result<Value> {
    let raw = match value.kind() {
        Kind::Decimal => decimal::to_f64(value.as_decimal_scaled()),
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::Double))?;
            text.trim()
                .parse::<f64>()
                .map_err(|_| ValueError::InvalidFormat { kind: Kind::Double, text: text.into_owned() })?
        }
        Kind::Boolean => f64::from(value.as_bool() as u8),
        other if other.is_integer_family() => as_source_i64(value)? as f64,
        _ => return Err(mismatch(value.kind(), Kind::Double)),
    };
    if raw.is_nan() || raw.is_infinite() {
        return Err(ValueError::InvalidFormat {
            kind: Kind::Double,
            text: raw.to_string(),
        });
    }
    Ok(Value::from_f64(raw))
}

fn cast_to_decimal(value: &Value) -> Result<Value> {
    let scaled = match value.kind() {
        Kind::Double => decimal::from_f64(value.as_f64())?,
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::Decimal))?;
            decimal::parse(text.trim())?
        }
        other if other.is_integer_family() => decimal::from_i64(as_source_i64(value)?)?,
        _ => return Err(mismatch(value.kind(), Kind::Decimal)),
    };
    Ok(Value::from_decimal_scaled(scaled))
}

fn cast_to_boolean(value: &Value) -> Result<Value> {
    match value.kind() {
        Kind::Varchar => {
            let text = value.as_str().ok_or_else(|| mismatch(Kind::Varchar, Kind::Boolean))?;
            match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => Ok(Value::true_v()),
                "false" | "f" | "0" | "no" => Ok(Value::false_v()),
                _ => Err(ValueError::InvalidFormat { kind: Kind::Boolean, text: text.into_owned() }),
            }
        }
        other if other.is_integer_family() => Ok(Value::from_bool(as_source_i64(value)? != 0)),
        Kind::Double => Ok(Value::from_bool(value.as_f64() != 0.0)),
        Kind::Decimal => Ok(Value::from_bool(value.as_decimal_scaled() != 0)),
        _ => Err(mismatch(value.kind(), Kind::Boolean)),
    }
}

fn cast_to_address(value: &Value) -> Result<Value> {
    match value.kind() {
        other if other.is_integer_family() => Ok(Value::from_address(as_source_i64(value)? as u64)),
        _ => Err(mismatch(value.kind(), Kind::Address)),
    }
}

/// Format `value` as a Varchar for casting, using calendar text for
/// Timestamp, `E`-notation for Double when its magnitude calls for it,
/// and trailing-zero-trimmed decimal text for Decimal (see
/// `decimal::format`).
fn cast_to_varchar(value: &Value, pool: &dyn VarlenPool) -> Result<Value> {
    if value.kind() == Kind::Varbinary {
        // "reinterpret bytes": the Varbinary's raw bytes become the
        // Varchar's raw bytes, no re-encoding and no UTF-8 validation
        // (invariant 4 defers that to whoever reads the result as `str`).
        let bytes = value.as_bytes().ok_or_else(|| mismatch(Kind::Varbinary, Kind::Varchar))?;
        return Ok(Value::owned_string(&bytes, pool));
    }
    let text = scalar_text(value)?;
    Ok(Value::owned_string(text.as_bytes(), pool))
}

/// Render a non-NULL scalar (any kind the `Varchar` cast column of §4.E's
/// matrix covers) to text, without allocating from a pool. Shared between
/// [`cast_to_varchar`] and `Value`'s `Display` impl, which has no pool to
/// allocate from.
pub(crate) fn scalar_text(value: &Value) -> Result<String> {
    Ok(match value.kind() {
        Kind::TinyInt => value.as_i8().to_string(),
        Kind::SmallInt => value.as_i16().to_string(),
        Kind::Integer => value.as_i32().to_string(),
        Kind::BigInt => value.as_i64().to_string(),
        Kind::Address => value.as_address().to_string(),
        Kind::Double => format_double(value.as_f64()),
        Kind::Decimal => decimal::format(value.as_decimal_scaled()),
        Kind::Boolean => value.as_bool().to_string(),
        Kind::Timestamp => format_timestamp(value.as_i64()),
        _ => return Err(mismatch(value.kind(), Kind::Varchar)),
    })
}

/// `Double -> Varchar`: always capital-`E` scientific notation (§4.E),
/// never plain decimal. Rust's `{:E}` already produces the shortest
/// round-trippable mantissa (no trailing zeros) and a sign-free exponent
/// with no leading zero, matching the spec's minimal-form requirement
/// exactly; zero is the literal sentinel `"0E0"` rather than whatever
/// `{:E}` would render for it.
fn format_double(v: f64) -> String {
    if v == 0.0 {
        return "0E0".to_owned();
    }
    format!("{v:E}")
}

fn format_timestamp(micros: i64) -> String {
    use chrono::DateTime;
    match DateTime::from_timestamp_micros(micros) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => micros.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varlen::TempPool;

    #[test]
    fn widen_then_narrow_round_trips_in_range() {
        let pool = TempPool::new();
        let v = Value::from_i8(42);
        let widened = cast(&v, Kind::BigInt, &pool).unwrap();
        assert_eq!(widened.as_i64(), 42);
        let narrowed = cast(&widened, Kind::TinyInt, &pool).unwrap();
        assert_eq!(narrowed.as_i8(), 42);
    }

    #[test]
    fn narrowing_overflow_is_rejected() {
        let pool = TempPool::new();
        let v = Value::from_i32(1000);
        assert!(matches!(
            cast(&v, Kind::TinyInt, &pool),
            Err(ValueError::NumericOutOfRange { .. })
        ));
    }

    #[test]
    fn double_truncates_toward_zero() {
        let pool = TempPool::new();
        let v = Value::from_f64(-3.9);
        let casted = cast(&v, Kind::Integer, &pool).unwrap();
        assert_eq!(casted.as_i32(), -3);
    }

    #[test]
    fn decimal_to_varchar_trims_trailing_zeros() {
        let pool = TempPool::new();
        let v = Value::decimal_from_str("2.500000000000").unwrap();
        let text = cast(&v, Kind::Varchar, &pool).unwrap();
        assert_eq!(text.as_str().unwrap(), "2.5");
    }

    #[test]
    fn null_cast_propagates_as_null_of_destination_kind() {
        let pool = TempPool::new();
        let v = Value::null_of(Kind::Integer);
        let casted = cast(&v, Kind::Double, &pool).unwrap();
        assert!(casted.is_null());
        assert_eq!(casted.kind(), Kind::Double);
    }

    #[test]
    fn varchar_to_integer_parses_trimmed_text() {
        let pool = TempPool::new();
        let s = Value::temp_string(b"  123  ", &pool);
        let casted = cast(&s, Kind::Integer, &pool).unwrap();
        assert_eq!(casted.as_i32(), 123);
    }

    #[test]
    fn varchar_to_integer_rejects_garbage() {
        let pool = TempPool::new();
        let s = Value::temp_string(b"abc", &pool);
        assert!(matches!(
            cast(&s, Kind::Integer, &pool),
            Err(ValueError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn boolean_textual_forms() {
        let pool = TempPool::new();
        let s = Value::temp_string(b"yes", &pool);
        assert!(cast(&s, Kind::Boolean, &pool).unwrap().is_true());
        let s = Value::temp_string(b"0", &pool);
        assert!(cast(&s, Kind::Boolean, &pool).unwrap().is_false());
    }

    #[test]
    #[cfg(not(feature = "nonstandard-timestamp-casts"))]
    fn double_to_timestamp_is_gated_off_by_default() {
        let pool = TempPool::new();
        let v = Value::from_f64(1.0);
        assert!(matches!(
            cast(&v, Kind::Timestamp, &pool),
            Err(ValueError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn double_to_varchar_always_uses_e_notation() {
        let pool = TempPool::new();
        assert_eq!(cast(&Value::from_f64(0.0), Kind::Varchar, &pool).unwrap().as_str().unwrap(), "0E0");
        assert_eq!(cast(&Value::from_f64(150.0), Kind::Varchar, &pool).unwrap().as_str().unwrap(), "1.5E2");
        assert_eq!(cast(&Value::from_f64(100.0), Kind::Varchar, &pool).unwrap().as_str().unwrap(), "1E2");
        assert_eq!(cast(&Value::from_f64(0.0001), Kind::Varchar, &pool).unwrap().as_str().unwrap(), "1E-4");
        assert_eq!(cast(&Value::from_f64(-2.5), Kind::Varchar, &pool).unwrap().as_str().unwrap(), "-2.5E0");
    }

    #[test]
    fn timestamp_formats_to_calendar_text() {
        let pool = TempPool::new();
        // 2021-01-01T00:00:00Z
        let v = Value::from_timestamp(1_609_459_200_000_000);
        let text = cast(&v, Kind::Varchar, &pool).unwrap();
        assert_eq!(text.as_str().unwrap(), "2021-01-01 00:00:00.000000");
    }
}
