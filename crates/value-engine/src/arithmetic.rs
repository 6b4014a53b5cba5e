//! Checked arithmetic over promoted Values.
//!
//! Integer operations use Rust's checked arithmetic and reject overflow
//! outright (no wraparound), including the asymmetric two's-complement
//! case where `i64::MIN` negated or multiplied by `-1` would otherwise
//! silently wrap. Double operations reject results outside the finite
//! `f64` range (`(-DBL_MAX, DBL_MAX)`), so a Double arithmetic op never
//! silently produces `Inf`; it returns [`ValueError::NumericOutOfRange`]
//! instead, matching the cast engine's own Double range check.

use crate::decimal;
use crate::error::{RangeFlags, Result, ValueError};
use crate::kind::Kind;
use crate::value::Value;

/// `f64::MAX`, named to match the range-check idiom used throughout this
/// module (`value > DBL_MAX || value < -DBL_MAX`).
const DBL_MAX: f64 = f64::MAX;

/// The four basic arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// Apply `op` to `lhs` and `rhs`, promoting to a common kind first. NULL
/// propagates: if either operand is NULL the result is a NULL of the
/// promoted kind.
pub fn apply(op: Op, lhs: &Value, rhs: &Value) -> Result<Value> {
    let result_kind = lhs.kind().promote(rhs.kind());
    if result_kind == Kind::Invalid {
        return Err(ValueError::TypeMismatch {
            from: lhs.kind(),
            to: rhs.kind(),
        });
    }
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::null_of(result_kind));
    }

    match result_kind {
        Kind::BigInt => apply_bigint(op, as_bigint(lhs), as_bigint(rhs)),
        Kind::Double => apply_double(op, as_double(lhs), as_double(rhs)),
        Kind::Decimal => apply_decimal(op, as_decimal(lhs)?, as_decimal(rhs)?),
        _ => unreachable!("promote() only yields BigInt/Double/Decimal/Invalid"),
    }
}

fn apply_bigint(op: Op, a: i64, b: i64) -> Result<Value> {
    let out_of_range = |negative: bool| ValueError::NumericOutOfRange {
        value: format!("{a} {op:?} {b}"),
        from: Kind::BigInt,
        to: Kind::BigInt,
        flags: RangeFlags::from_sign(negative),
    };

    let result = match op {
        Op::Add => a.checked_add(b).ok_or_else(|| out_of_range(b < 0)),
        Op::Sub => a.checked_sub(b).ok_or_else(|| out_of_range(b > 0)),
        // checked_mul already treats i64::MIN * -1 as overflow. The spec
        // additionally treats a *result* of i64::MIN as overflow in
        // multiplication specifically, since i64::MIN doubles as the
        // BigInt NULL sentinel (value.rs::sentinel::BIGINT) — without this,
        // a legitimate product that happens to equal i64::MIN would read
        // back as NULL through `Value::from_i64`.
        Op::Mul => a
            .checked_mul(b)
            .filter(|&r| r != i64::MIN)
            .ok_or_else(|| out_of_range((a < 0) != (b < 0))),
        Op::Div => {
            if b == 0 {
                return Err(ValueError::DivisionByZero);
            }
            a.checked_div(b).ok_or_else(|| out_of_range(true))
        }
    }?;
    Ok(Value::from_i64(result))
}

fn apply_double(op: Op, a: f64, b: f64) -> Result<Value> {
    let result = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div => {
            if b == 0.0 {
                return Err(ValueError::DivisionByZero);
            }
            a / b
        }
    };
    if result.is_nan() || result > DBL_MAX || result < -DBL_MAX {
        return Err(ValueError::NumericOutOfRange {
            value: format!("{a} {op:?} {b}"),
            from: Kind::Double,
            to: Kind::Double,
            flags: RangeFlags::from_sign(result.is_sign_negative()),
        });
    }
    Ok(Value::from_f64(result))
}

fn apply_decimal(op: Op, a: i128, b: i128) -> Result<Value> {
    let scaled = match op {
        Op::Add => decimal::add(a, b)?,
        Op::Sub => decimal::sub(a, b)?,
        Op::Mul => decimal::mul(a, b)?,
        Op::Div => decimal::div(a, b)?,
    };
    Ok(Value::from_decimal_scaled(scaled))
}

fn as_bigint(v: &Value) -> i64 {
    match v.kind() {
        Kind::TinyInt => i64::from(v.as_i8()),
        Kind::SmallInt => i64::from(v.as_i16()),
        Kind::Integer => i64::from(v.as_i32()),
        Kind::BigInt | Kind::Timestamp => v.as_i64(),
        Kind::Address => v.as_address() as i64,
        _ => 0,
    }
}

fn as_double(v: &Value) -> f64 {
    if v.kind() == Kind::Double {
        v.as_f64()
    } else {
        as_bigint(v) as f64
    }
}

fn as_decimal(v: &Value) -> Result<i128> {
    match v.kind() {
        Kind::Decimal => Ok(v.as_decimal_scaled()),
        Kind::Double => decimal::from_f64(v.as_f64()),
        _ if v.kind().is_integer_family() => decimal::from_i64(as_bigint(v)),
        _ => Err(ValueError::TypeMismatch {
            from: v.kind(),
            to: Kind::Decimal,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_overflow_is_rejected() {
        let a = Value::from_i64(i64::MAX);
        let b = Value::from_i64(1);
        assert!(matches!(
            apply(Op::Add, &a, &b),
            Err(ValueError::NumericOutOfRange { .. })
        ));
    }

    #[test]
    fn i64_min_times_minus_one_overflows() {
        let a = Value::from_i64(i64::MIN);
        let b = Value::from_i64(-1);
        assert!(matches!(
            apply(Op::Mul, &a, &b),
            Err(ValueError::NumericOutOfRange { .. })
        ));
    }

    #[test]
    fn multiplication_result_equal_to_null_sentinel_overflows() {
        // i64::MIN as a genuine product must still be rejected: it is
        // indistinguishable from the BigInt NULL sentinel once stored.
        let a = Value::from_i64(i64::MIN / 2);
        let b = Value::from_i64(2);
        assert!(matches!(
            apply(Op::Mul, &a, &b),
            Err(ValueError::NumericOutOfRange { .. })
        ));
    }

    #[test]
    fn integer_division_by_zero() {
        let a = Value::from_i32(5);
        let b = Value::from_i32(0);
        assert!(matches!(apply(Op::Div, &a, &b), Err(ValueError::DivisionByZero)));
    }

    #[test]
    fn double_division_by_zero() {
        let a = Value::from_f64(1.0);
        let b = Value::from_f64(0.0);
        assert!(matches!(apply(Op::Div, &a, &b), Err(ValueError::DivisionByZero)));
    }

    #[test]
    fn double_result_beyond_dbl_max_is_rejected() {
        let a = Value::from_f64(f64::MAX);
        let b = Value::from_f64(f64::MAX);
        assert!(matches!(
            apply(Op::Mul, &a, &b),
            Err(ValueError::NumericOutOfRange { .. })
        ));
    }

    #[test]
    fn null_propagates_through_arithmetic() {
        let a = Value::null_of(Kind::Integer);
        let b = Value::from_i32(5);
        let result = apply(Op::Add, &a, &b).unwrap();
        assert!(result.is_null());
        assert_eq!(result.kind(), Kind::BigInt);
    }

    #[test]
    fn decimal_arithmetic_delegates_to_decimal_module() {
        let a = Value::decimal_from_str("1.5").unwrap();
        let b = Value::decimal_from_str("2.5").unwrap();
        let result = apply(Op::Add, &a, &b).unwrap();
        assert_eq!(result.as_decimal_scaled(), decimal::parse("4").unwrap());
    }

    #[test]
    fn mismatched_non_numeric_kinds_reject() {
        use crate::varlen::TempPool;
        let pool = TempPool::new();
        let s = Value::temp_string(b"x", &pool);
        let n = Value::from_i32(1);
        assert!(matches!(apply(Op::Add, &s, &n), Err(ValueError::TypeMismatch { .. })));
    }
}
