//! Reads and writes a single `Value` at a tuple storage offset.
//!
//! This module is the boundary between the value engine and the tuple
//! and table storage layer, which this crate does not implement (§1,
//! "out of scope"): storage only hands this module raw byte slices (for
//! fixed-width values and inlined objects) or an existing/absent
//! `VarlenHandle` (for out-of-line objects) and gets back a `Value`, or
//! the other way around for writes.
//!
//! `inlined` is expressed in the type of [`TupleStorage`] rather than as
//! a boolean flag threaded through every call, per design note 9's
//! preference for encoding borrow shape in the type system where the
//! language allows it.

use std::rc::Rc;

use crate::error::{Result, ValueError};
use crate::kind::Kind;
use crate::length_prefix::{self, PrefixValue};
use crate::like::code_point_count;
use crate::value::{sentinel, Value};
use crate::varlen::{VarlenHandle, VarlenPool};

/// Where a `Value`'s bytes live in tuple storage, for reads.
pub enum TupleStorage<'a> {
    /// A fixed-width kind's `kind.fixed_size()` bytes, in place.
    Fixed(&'a [u8]),
    /// A Varchar/Varbinary/Array inlined in the tuple: the whole tuple
    /// row buffer, plus the byte offset where this object's length
    /// prefix begins.
    InlineObject { tuple: Rc<[u8]>, offset: usize },
    /// A Varchar/Varbinary/Array stored out-of-line: the slot holds
    /// (or, if `None`, does not hold) a pool handle.
    OutlineObject(Option<VarlenHandle>),
}

/// The result of serializing a `Value` for storage, for writes.
pub enum SerializedTuple {
    /// Bytes to write verbatim at the target offset (fixed-width value,
    /// or an inlined object's prefix + payload + zero padding).
    Bytes(Vec<u8>),
    /// A handle the storage layer should record in the out-of-line
    /// pointer slot. `None` signals NULL (an absent handle).
    Handle(Option<VarlenHandle>),
}

fn size_mismatch(kind: Kind, got: usize) -> ValueError {
    ValueError::UnsupportedOperation(format!(
        "tuple storage: {kind} expects {} fixed bytes, got {got}",
        kind.fixed_size()
    ))
}

/// Read a `Value` of `kind` from `storage`.
pub fn init_from_tuple_storage(kind: Kind, storage: TupleStorage<'_>) -> Result<Value> {
    match storage {
        TupleStorage::Fixed(bytes) => read_fixed(kind, bytes),
        TupleStorage::InlineObject { tuple, offset } => read_inline_object(kind, &tuple, offset),
        TupleStorage::OutlineObject(handle) => read_outline_object(kind, handle.as_ref()),
    }
}

fn read_fixed(kind: Kind, bytes: &[u8]) -> Result<Value> {
    let want = kind.fixed_size();
    if bytes.len() != want {
        return Err(size_mismatch(kind, bytes.len()));
    }
    Ok(match kind {
        Kind::TinyInt => Value::from_i8(bytes[0] as i8),
        Kind::SmallInt => Value::from_i16(i16::from_le_bytes(bytes.try_into().unwrap())),
        Kind::Integer => Value::from_i32(i32::from_le_bytes(bytes.try_into().unwrap())),
        Kind::BigInt => Value::from_i64(i64::from_le_bytes(bytes.try_into().unwrap())),
        Kind::Timestamp => Value::from_timestamp(i64::from_le_bytes(bytes.try_into().unwrap())),
        Kind::Double => Value::from_f64(f64::from_le_bytes(bytes.try_into().unwrap())),
        Kind::Decimal => Value::from_decimal_scaled(i128::from_le_bytes(bytes.try_into().unwrap())),
        Kind::Address => Value::from_address(u64::from_le_bytes(bytes.try_into().unwrap())),
        Kind::Boolean => match bytes[0] {
            0 => Value::false_v(),
            1 => Value::true_v(),
            _ => Value::null_of(Kind::Boolean),
        },
        Kind::Null | Kind::Invalid => Value::null(),
        _ => return Err(ValueError::TypeMismatch { from: kind, to: kind }),
    })
}

fn read_inline_object(kind: Kind, tuple: &Rc<[u8]>, offset: usize) -> Result<Value> {
    let (prefix, prefix_len) = length_prefix::decode(&tuple[offset..])?;
    let PrefixValue::Length(len) = prefix else {
        return Ok(Value::null_of(kind));
    };
    let start = offset + prefix_len as usize;
    make_borrowed(kind, Rc::clone(tuple), start, len)
}

fn read_outline_object(kind: Kind, handle: Option<&VarlenHandle>) -> Result<Value> {
    let Some(handle) = handle else {
        return Ok(Value::null_of(kind));
    };
    let payload = handle.bytes();
    let (prefix, prefix_len) = length_prefix::decode(&payload)?;
    let PrefixValue::Length(len) = prefix else {
        return Ok(Value::null_of(kind));
    };
    let bytes: Rc<[u8]> = Rc::from(&payload[prefix_len as usize..prefix_len as usize + len]);
    drop(payload);
    make_borrowed(kind, bytes, 0, len)
}

fn make_borrowed(kind: Kind, buf: Rc<[u8]>, start: usize, len: usize) -> Result<Value> {
    match kind {
        Kind::Varchar => Ok(Value::borrowed_string(buf, start, len)),
        Kind::Varbinary => Ok(Value::borrowed_binary(buf, start, len)),
        _ => Err(ValueError::TypeMismatch { from: kind, to: kind }),
    }
}

/// Serialize `value` (a fixed-width kind) into exactly `kind.fixed_size()`
/// bytes.
pub fn serialize_fixed(value: &Value) -> Result<Vec<u8>> {
    let kind = value.kind();
    Ok(match kind {
        Kind::TinyInt => vec![value.as_i8() as u8],
        Kind::SmallInt => value.as_i16().to_le_bytes().to_vec(),
        Kind::Integer => value.as_i32().to_le_bytes().to_vec(),
        Kind::BigInt => value.as_i64().to_le_bytes().to_vec(),
        Kind::Timestamp => value.as_i64().to_le_bytes().to_vec(),
        Kind::Double => value.as_f64().to_le_bytes().to_vec(),
        Kind::Decimal => value.as_decimal_scaled().to_le_bytes().to_vec(),
        Kind::Address => value.as_address().to_le_bytes().to_vec(),
        Kind::Boolean => {
            if value.is_null() {
                vec![0xFF]
            } else {
                vec![u8::from(value.as_bool())]
            }
        }
        Kind::Null | Kind::Invalid => Vec::new(),
        _ => {
            return Err(ValueError::TypeMismatch { from: kind, to: kind });
        }
    })
}

/// Serialize a Varchar/Varbinary `value`, producing either the inline
/// bytes to write in place or a handle to store out-of-line, per
/// `inlined`. `max_len` and `in_bytes` bound the object's size (§4.H):
/// `in_bytes = true` counts raw bytes, `false` counts UTF-8 code points.
/// Oversize is an error, never silent truncation.
pub fn serialize_to_tuple_storage(
    value: &Value,
    inlined: bool,
    max_len: usize,
    in_bytes: bool,
    pool: &dyn VarlenPool,
) -> Result<SerializedTuple> {
    let kind = value.kind();
    if value.is_null() {
        return Ok(if inlined {
            let mut out = Vec::new();
            length_prefix::encode(PrefixValue::Null, &mut out)?;
            pad_to(&mut out, max_len + 1);
            SerializedTuple::Bytes(out)
        } else {
            SerializedTuple::Handle(None)
        });
    }

    let bytes = value
        .as_bytes()
        .ok_or_else(|| ValueError::TypeMismatch { from: kind, to: kind })?;
    check_size(&bytes, kind, max_len, in_bytes)?;

    let mut prefix = Vec::new();
    let prefix_len = length_prefix::encode(PrefixValue::Length(bytes.len()), &mut prefix)?;

    if inlined {
        let mut out = prefix;
        out.extend_from_slice(&bytes);
        pad_to(&mut out, max_len + prefix_len as usize);
        Ok(SerializedTuple::Bytes(out))
    } else {
        let mut payload = prefix;
        payload.extend_from_slice(&bytes);
        let handle = pool.create(&payload, payload.len());
        Ok(SerializedTuple::Handle(Some(handle)))
    }
}

fn check_size(bytes: &[u8], kind: Kind, max_len: usize, in_bytes: bool) -> Result<()> {
    let (actual, unit) = if in_bytes {
        (bytes.len(), "bytes")
    } else {
        (code_point_count(bytes), "code points")
    };
    if actual > max_len {
        return Err(ValueError::ObjectTooLarge { actual, max: max_len, kind, unit });
    }
    Ok(())
}

fn pad_to(out: &mut Vec<u8>, total: usize) {
    if out.len() < total {
        out.resize(total, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varlen::TempPool;

    #[test]
    fn fixed_width_round_trips() {
        let v = Value::from_i32(-123);
        let bytes = serialize_fixed(&v).unwrap();
        let back = read_fixed(Kind::Integer, &bytes).unwrap();
        assert_eq!(back.as_i32(), -123);
    }

    #[test]
    fn sentinel_round_trips_as_null() {
        let v = Value::from_i64(sentinel::BIGINT);
        let bytes = serialize_fixed(&v).unwrap();
        assert_eq!(bytes, vec![0u8; 8]);
        let back = read_fixed(Kind::BigInt, &bytes).unwrap();
        assert!(back.is_null());
    }

    #[test]
    fn inline_object_round_trips() {
        let pool = TempPool::new();
        let s = Value::temp_string(b"héllo", &pool);
        let serialized = serialize_to_tuple_storage(&s, true, 20, true, &pool).unwrap();
        let SerializedTuple::Bytes(bytes) = serialized else { panic!("expected inline bytes") };

        let tuple: Rc<[u8]> = Rc::from(bytes.as_slice());
        let back = init_from_tuple_storage(
            Kind::Varchar,
            TupleStorage::InlineObject { tuple, offset: 0 },
        )
        .unwrap();
        assert_eq!(back.as_str().unwrap(), "héllo");
    }

    #[test]
    fn outline_object_round_trips() {
        let pool = TempPool::new();
        let s = Value::temp_string(b"out of line", &pool);
        let serialized = serialize_to_tuple_storage(&s, false, 100, true, &pool).unwrap();
        let SerializedTuple::Handle(Some(handle)) = serialized else {
            panic!("expected a handle")
        };
        let back =
            init_from_tuple_storage(Kind::Varchar, TupleStorage::OutlineObject(Some(handle)))
                .unwrap();
        assert_eq!(back.as_str().unwrap(), "out of line");
    }

    #[test]
    fn null_handle_is_null_value() {
        let back =
            init_from_tuple_storage(Kind::Varchar, TupleStorage::OutlineObject(None)).unwrap();
        assert!(back.is_null());
    }

    #[test]
    fn oversize_object_in_bytes_is_rejected() {
        let pool = TempPool::new();
        let s = Value::temp_string(b"0123456789", &pool);
        let err = serialize_to_tuple_storage(&s, true, 5, true, &pool).unwrap_err();
        assert!(matches!(err, ValueError::ObjectTooLarge { actual: 10, max: 5, .. }));
    }

    #[test]
    fn multibyte_value_measured_in_code_points_not_bytes() {
        // "héllo" is 6 bytes, 5 code points.
        let pool = TempPool::new();
        let s = Value::temp_string("héllo".as_bytes(), &pool);
        assert!(serialize_to_tuple_storage(&s, true, 5, false, &pool).is_ok());
        assert!(serialize_to_tuple_storage(&s, true, 5, true, &pool).is_err());
    }

    #[test]
    fn length_prefix_boundary_63_vs_64_bytes() {
        let pool = TempPool::new();
        let short = Value::temp_string(&[b'a'; 63], &pool);
        let serialized = serialize_to_tuple_storage(&short, true, 100, true, &pool).unwrap();
        let SerializedTuple::Bytes(bytes) = serialized else { panic!() };
        assert_eq!(bytes[0], 0x3F);

        let long = Value::temp_string(&[b'a'; 64], &pool);
        let serialized = serialize_to_tuple_storage(&long, true, 100, true, &pool).unwrap();
        let SerializedTuple::Bytes(bytes) = serialized else { panic!() };
        assert_eq!(&bytes[..4], &[0x80, 0x00, 0x00, 0x40]);
    }
}
