//! Value comparison, including the NULL-aware and non-null variants.
//!
//! Floating point comparison deliberately departs from IEEE-754: NaN
//! compares equal to itself and less than every other Double, giving a
//! total order suitable for sorting and indexing rather than the partial
//! order the hardware gives `f64`.

use std::cmp::Ordering;

use crate::kind::Kind;
use crate::value::Value;

/// Three-valued result of a NULL-aware comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// Neither side is NULL; carries the usual ordering.
    Value(Ordering),
    /// At least one side is NULL. SQL NULL comparisons are unknown, but
    /// for internal total-ordering purposes (sort keys, index probes)
    /// NULL sorts before every non-NULL value of the same kind, and
    /// NULL equals NULL.
    Null,
}

/// Compare two Values with NULL awareness. Returns [`NullOrdering::Null`]
/// if either side is NULL.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> NullOrdering {
    match (a.is_null(), b.is_null()) {
        (true, true) => NullOrdering::Null,
        (true, false) => NullOrdering::Null,
        (false, true) => NullOrdering::Null,
        (false, false) => NullOrdering::Value(compare_without_null(a, b)),
    }
}

/// Compare two non-NULL Values, promoting across numeric kinds once per
/// the promotion table. Behavior is unspecified (but total and
/// deterministic) if either input is NULL; callers that care about NULL
/// semantics should use [`compare`] instead.
#[must_use]
pub fn compare_without_null(a: &Value, b: &Value) -> Ordering {
    if a.kind() == b.kind() {
        return compare_same_kind(a, b);
    }

    // Double x Decimal is a special case of the promotion table: per the
    // comparison engine's own rule (distinct from the general type
    // promotion table, which would send this pair to Decimal), the
    // Decimal side is converted down to f64 and the comparison runs in
    // floating point rather than widening the Double up to 128-bit scaled
    // integer.
    if matches!(
        (a.kind(), b.kind()),
        (Kind::Double, Kind::Decimal) | (Kind::Decimal, Kind::Double)
    ) {
        return compare_double(as_double_lossy(a), as_double_lossy(b));
    }

    // Varchar x Varbinary is permitted for equality checks (§4.F): both
    // are byte runs, so this is the same `memcmp`-on-shorter-prefix rule
    // the same-kind branch below uses, just across the two object kinds
    // rather than within one. Neither promotes to the other in the type
    // descriptor's promotion table, so this must be handled before falling
    // through to `promote`, which would otherwise call the pair `Invalid`.
    if matches!(
        (a.kind(), b.kind()),
        (Kind::Varchar, Kind::Varbinary) | (Kind::Varbinary, Kind::Varchar)
    ) {
        let a_bytes = a.as_bytes().unwrap_or_default();
        let b_bytes = b.as_bytes().unwrap_or_default();
        return a_bytes.as_ref().cmp(b_bytes.as_ref());
    }

    match a.kind().promote(b.kind()) {
        Kind::Decimal => compare_decimal(&as_decimal(a), &as_decimal(b)),
        Kind::Double => compare_double(as_double(a), as_double(b)),
        Kind::BigInt => as_bigint(a).cmp(&as_bigint(b)),
        _ => {
            tracing::debug!(lhs = %a.kind(), rhs = %b.kind(), "comparing incomparable kinds");
            Ordering::Equal
        }
    }
}

/// Like [`as_double`] but additionally accepts Decimal, converting its
/// scaled 128-bit integer to `f64` (the Double x Decimal comparison path).
fn as_double_lossy(v: &Value) -> f64 {
    if v.kind() == Kind::Decimal {
        crate::decimal::to_f64(v.as_decimal_scaled())
    } else {
        as_double(v)
    }
}

fn compare_same_kind(a: &Value, b: &Value) -> Ordering {
    match a.kind() {
        Kind::TinyInt => a.as_i8().cmp(&b.as_i8()),
        Kind::SmallInt => a.as_i16().cmp(&b.as_i16()),
        Kind::Integer => a.as_i32().cmp(&b.as_i32()),
        Kind::BigInt | Kind::Timestamp => a.as_i64().cmp(&b.as_i64()),
        Kind::Address => a.as_address().cmp(&b.as_address()),
        Kind::Double => compare_double(a.as_f64(), b.as_f64()),
        Kind::Decimal => compare_decimal(&a.as_decimal_scaled(), &b.as_decimal_scaled()),
        Kind::Boolean => a.as_bool().cmp(&b.as_bool()),
        Kind::Varchar | Kind::Varbinary => {
            let a_bytes = a.as_bytes().unwrap_or_default();
            let b_bytes = b.as_bytes().unwrap_or_default();
            a_bytes.as_ref().cmp(b_bytes.as_ref())
        }
        Kind::Array => compare_arrays(a, b),
        Kind::Null | Kind::Invalid => Ordering::Equal,
    }
}

fn compare_arrays(a: &Value, b: &Value) -> Ordering {
    let (Some(ea), Some(eb)) = (a.array_elements(), b.array_elements()) else {
        return Ordering::Equal;
    };
    for (x, y) in ea.iter().zip(eb.iter()) {
        let ord = match compare(x, y) {
            NullOrdering::Value(o) => o,
            NullOrdering::Null => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ea.len().cmp(&eb.len())
}

/// Total order over `f64` that treats NaN as equal to itself and less
/// than every other value, instead of IEEE-754's "unordered".
#[must_use]
pub fn compare_double(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_decimal(a: &i128, b: &i128) -> Ordering {
    a.cmp(b)
}

fn as_decimal(v: &Value) -> i128 {
    match v.kind() {
        Kind::Decimal => v.as_decimal_scaled(),
        Kind::Double => crate::decimal::from_f64(v.as_f64()).unwrap_or(0),
        _ if v.kind().is_integer_family() => {
            crate::decimal::from_i64(as_bigint(v)).unwrap_or(0)
        }
        _ => 0,
    }
}

fn as_double(v: &Value) -> f64 {
    match v.kind() {
        Kind::Double => v.as_f64(),
        _ if v.kind().is_integer_family() => as_bigint(v) as f64,
        _ => f64::NAN,
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_equals_itself_and_is_least() {
        assert_eq!(compare_double(f64::NAN, f64::NAN), Ordering::Equal);
        assert_eq!(compare_double(f64::NAN, 0.0), Ordering::Less);
        assert_eq!(compare_double(0.0, f64::NAN), Ordering::Greater);
        assert_eq!(compare_double(f64::NAN, f64::NEG_INFINITY), Ordering::Less);
    }

    #[test]
    fn null_beats_any_comparison() {
        let null = Value::null_of(Kind::Integer);
        let five = Value::from_i32(5);
        assert_eq!(compare(&null, &five), NullOrdering::Null);
        assert_eq!(compare(&null, &null), NullOrdering::Null);
    }

    #[test]
    fn cross_kind_integer_promotion() {
        let a = Value::from_i8(5);
        let b = Value::from_i32(5);
        assert_eq!(compare_without_null(&a, &b), Ordering::Equal);
    }

    #[test]
    fn decimal_dominates_double_in_promotion() {
        let d = Value::decimal_from_str("2.5").unwrap();
        let f = Value::from_f64(2.5);
        assert_eq!(compare_without_null(&d, &f), Ordering::Equal);
    }

    #[test]
    fn varchar_compares_byte_lexically() {
        use crate::varlen::TempPool;
        let pool = TempPool::new();
        let a = Value::temp_string(b"abc", &pool);
        let b = Value::temp_string(b"abd", &pool);
        assert_eq!(compare_without_null(&a, &b), Ordering::Less);
    }

    #[test]
    fn varchar_and_varbinary_compare_across_kinds() {
        use crate::varlen::TempPool;
        let pool = TempPool::new();
        let text = Value::owned_string(b"abc", &pool);
        let same_bytes = Value::owned_binary(b"abc", &pool);
        let different = Value::owned_binary(b"xyz", &pool);
        assert_eq!(compare_without_null(&text, &same_bytes), Ordering::Equal);
        assert_ne!(compare_without_null(&text, &different), Ordering::Equal);
        assert_eq!(compare_without_null(&text, &different), Ordering::Less);
    }
}
