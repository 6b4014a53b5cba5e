//! Stable 128-bit hashing over the logical value of a `Value`.
//!
//! The hash must be stable across process runs and crate versions (it can
//! back a persisted or indexed hash bucket), so this is a local port of
//! `MurmurHash3_x64_128` rather than a dependency on `std`'s
//! `DefaultHasher` (unspecified, version-unstable) or an external crate
//! (none in the teacher's dependency stack).

use crate::kind::Kind;
use crate::value::Value;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// `MurmurHash3_x64_128`, truncated to the low 64 bits (`h1`) for a
/// single-word hash suitable as a map/set key; the full 128-bit pair is
/// exposed by [`murmur_hash3_x64_128`] for callers that want both words.
#[must_use]
pub fn murmur_hash3_x64_128_low(data: &[u8], seed: u64) -> u64 {
    murmur_hash3_x64_128(data, seed).0
}

/// `MurmurHash3_x64_128` over `data`, keyed with `seed`, returning the
/// `(h1, h2)` word pair.
#[must_use]
pub fn murmur_hash3_x64_128(data: &[u8], seed: u64) -> (u64, u64) {
    let mut h1 = seed;
    let mut h2 = seed;

    let nblocks = data.len() / 16;
    for i in 0..nblocks {
        let block = &data[i * 16..i * 16 + 16];
        let mut k1 = [0u8; 8];
        let mut k2 = [0u8; 8];
        k1.copy_from_slice(&block[0..8]);
        k2.copy_from_slice(&block[8..16]);
        let mut k1 = u64::from_le_bytes(k1);
        let mut k2 = u64::from_le_bytes(k2);

        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1.rotate_left(27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;
        h2 = h2.rotate_left(31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = &data[nblocks * 16..];
    let mut k1: u64 = 0;
    let mut k2: u64 = 0;
    let tail_len = tail.len();
    if tail_len > 8 {
        for (i, &b) in tail[8..].iter().enumerate() {
            k2 ^= u64::from(b) << (8 * i);
        }
        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;
    }
    if tail_len > 0 {
        for (i, &b) in tail[..tail_len.min(8)].iter().enumerate() {
            k1 ^= u64::from(b) << (8 * i);
        }
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= data.len() as u64;
    h2 ^= data.len() as u64;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    (h1, h2)
}

/// Hash the logical value of `v` with the canonical seed (`0`), over 8
/// raw bytes for fixed-width kinds or over the object's bytes for
/// Varchar/Varbinary. Arrays hash their elements in order, combined with
/// [`hash_combine`].
#[must_use]
pub fn hash_value(v: &Value) -> u64 {
    let mut seed = 0u64;
    hash_combine(&mut seed, v);
    seed
}

/// Fold `v`'s logical value into an existing hash accumulator, for
/// composite keys (e.g. a multi-column group-by key).
///
/// Numeric kinds (integer family, `Decimal`) are hashed through a common
/// Decimal-scaled `i128` representation rather than their own native
/// width, so that `compare(a, b) == Equal` implies equal hashes across
/// kinds for the integer-family x Decimal promotion pair — matching
/// §4.F's promotion rule that that pair compares as 128-bit scaled
/// integers. `Double` hashes through the same Decimal domain when its
/// value is exactly representable there (the common case), falling back
/// to its raw bit pattern only outside Decimal's range, where the
/// compare engine itself stops guaranteeing Decimal/Double cross-kind
/// equality (4.F converts Decimal to `f64` for that pair, not the
/// reverse, so a value too large for Decimal is never decimal-equal to
/// anything in the first place). Strings/binaries hash over their bytes;
/// Arrays fold their elements in order.
pub fn hash_combine(seed: &mut u64, v: &Value) {
    let word = match v.kind() {
        Kind::Null | Kind::Invalid => 0,
        Kind::TinyInt => hash_numeric(crate::decimal::from_i64(i64::from(v.as_i8())), *seed),
        Kind::SmallInt => hash_numeric(crate::decimal::from_i64(i64::from(v.as_i16())), *seed),
        Kind::Integer => hash_numeric(crate::decimal::from_i64(i64::from(v.as_i32())), *seed),
        Kind::BigInt | Kind::Timestamp => hash_numeric(crate::decimal::from_i64(v.as_i64()), *seed),
        Kind::Address => hash_fixed(&v.as_address().to_le_bytes(), *seed),
        Kind::Double => {
            let scaled = crate::decimal::from_f64(v.as_f64());
            hash_numeric(scaled, *seed)
        }
        Kind::Decimal => hash_fixed(&v.as_decimal_scaled().to_le_bytes(), *seed),
        Kind::Boolean => hash_fixed(&[u8::from(v.as_bool())], *seed),
        Kind::Varchar | Kind::Varbinary => match v.as_bytes() {
            Some(bytes) => murmur_hash3_x64_128_low(&bytes, *seed),
            None => hash_fixed(&[0u8], *seed),
        },
        Kind::Array => {
            let mut acc = *seed;
            if let Some(elements) = v.array_elements() {
                for element in elements {
                    hash_combine(&mut acc, element);
                }
            }
            acc
        }
    };
    *seed = word;
}

/// Hash a value already converted to Decimal's scaled domain, falling
/// back to hashing the conversion failure's display text (still
/// deterministic, just not numerically comparable) when the source
/// can't be represented as a Decimal at all.
fn hash_numeric(scaled: crate::error::Result<i128>, seed: u64) -> u64 {
    match scaled {
        Ok(v) => hash_fixed(&v.to_le_bytes(), seed),
        Err(_) => hash_fixed(&[0xFFu8], seed),
    }
}

fn hash_fixed(bytes: &[u8], seed: u64) -> u64 {
    murmur_hash3_x64_128_low(bytes, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varlen::TempPool;

    #[test]
    fn equal_values_hash_equal() {
        let a = Value::from_i32(42);
        let b = Value::from_i64(42);
        // Different kinds but equal logical value should still hash
        // equal only when fed the same bytes; integers of different
        // widths are widened to i64 before hashing so they agree.
        assert_eq!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn different_values_usually_hash_different() {
        let a = Value::from_i32(1);
        let b = Value::from_i32(2);
        assert_ne!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn strings_hash_by_content() {
        let pool = TempPool::new();
        let a = Value::temp_string(b"hello", &pool);
        let b = Value::temp_string(b"hello", &pool);
        let c = Value::temp_string(b"world", &pool);
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_ne!(hash_value(&a), hash_value(&c));
    }

    #[test]
    fn murmur_is_deterministic_across_calls() {
        let h1 = murmur_hash3_x64_128(b"the quick brown fox", 0);
        let h2 = murmur_hash3_x64_128(b"the quick brown fox", 0);
        assert_eq!(h1, h2);
    }

    #[test]
    fn array_hash_combines_elements_in_order() {
        let mut a = Value::array_of(2, Kind::Integer);
        a.set_array_elements(vec![Value::from_i32(1), Value::from_i32(2)]);
        let mut b = Value::array_of(2, Kind::Integer);
        b.set_array_elements(vec![Value::from_i32(2), Value::from_i32(1)]);
        assert_ne!(hash_value(&a), hash_value(&b));
    }

    #[test]
    fn compare_equal_implies_hash_equal_across_kinds() {
        let d = Value::decimal_from_str("2.5").unwrap();
        let f = Value::from_f64(2.5);
        assert_eq!(crate::compare::compare_without_null(&d, &f), std::cmp::Ordering::Equal);
        assert_eq!(hash_value(&d), hash_value(&f));

        let i = Value::from_i32(7);
        let dec = Value::decimal_from_str("7").unwrap();
        assert_eq!(crate::compare::compare_without_null(&i, &dec), std::cmp::Ordering::Equal);
        assert_eq!(hash_value(&i), hash_value(&dec));
    }
}
