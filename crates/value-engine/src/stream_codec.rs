//! Typed byte-stream (de)serialization: the parameter/wire format used
//! for query parameters and result rows, and the export format used for
//! bulk record output.
//!
//! Built on `bytes::{Buf, BufMut}`, the way the teacher's
//! `tds-protocol::codec` and `mssql-types::{decode, encode}` modules
//! read and write typed primitives, rather than hand-rolled byte
//! indexing.

use bytes::{Buf, BufMut};

use crate::error::{Result, ValueError};
use crate::kind::Kind;
use crate::value::Value;
use crate::varlen::VarlenPool;

/// `length = -1` marks a NULL Varchar/Varbinary in the wire format.
const NULL_LENGTH: i32 = -1;
/// Array NULL is signaled by this element count, extending the same
/// convention the wire format uses for NULL objects (not specified by
/// name in the source spec, which does not describe a NULL array wire
/// encoding; documented in DESIGN.md).
const NULL_ARRAY_COUNT: i16 = -1;

fn truncated(what: &str) -> ValueError {
    ValueError::UnsupportedOperation(format!("stream codec: truncated reading {what}"))
}

/// Write a single parameter: a Kind tag byte, then the typed value.
pub fn write_param(buf: &mut impl BufMut, value: &Value) -> Result<()> {
    buf.put_u8(value.kind() as u8);
    write_typed(buf, value.kind(), value)
}

/// Read a single parameter: a Kind tag byte, then the typed value.
pub fn read_param(buf: &mut impl Buf) -> Result<Value> {
    if !buf.has_remaining() {
        return Err(truncated("parameter kind tag"));
    }
    let tag = buf.get_u8();
    let kind = Kind::from_tag(tag)
        .ok_or_else(|| ValueError::UnsupportedOperation(format!("unknown kind tag {tag}")))?;
    read_typed(buf, kind)
}

/// Write `value`'s payload (no Kind tag) for the given `kind`, as used
/// both for a top-level parameter (after [`write_param`]'s tag byte) and
/// for each element of an Array.
pub fn write_typed(buf: &mut impl BufMut, kind: Kind, value: &Value) -> Result<()> {
    match kind {
        Kind::TinyInt => Ok(buf.put_i8(value.as_i8())),
        Kind::SmallInt => Ok(buf.put_i16(value.as_i16())),
        Kind::Integer => Ok(buf.put_i32(value.as_i32())),
        Kind::BigInt | Kind::Timestamp => Ok(buf.put_i64(value.as_i64())),
        Kind::Address => Ok(buf.put_u64(value.as_address())),
        Kind::Double => Ok(buf.put_f64(value.as_f64())),
        Kind::Decimal => Ok(buf.put_slice(&value.as_decimal_scaled().to_be_bytes())),
        Kind::Boolean => Ok(buf.put_u8(match (value.is_null(), value.as_bool()) {
            (true, _) => 0xFF,
            (false, true) => 1,
            (false, false) => 0,
        })),
        Kind::Varchar | Kind::Varbinary => write_object(buf, value),
        Kind::Array => write_array(buf, value),
        Kind::Null | Kind::Invalid => Ok(()),
    }
}

/// Read a `kind`-typed value (no Kind tag consumed).
pub fn read_typed(buf: &mut impl Buf, kind: Kind) -> Result<Value> {
    Ok(match kind {
        Kind::TinyInt => {
            require(buf, 1, "TINYINT")?;
            Value::from_i8(buf.get_i8())
        }
        Kind::SmallInt => {
            require(buf, 2, "SMALLINT")?;
            Value::from_i16(buf.get_i16())
        }
        Kind::Integer => {
            require(buf, 4, "INTEGER")?;
            Value::from_i32(buf.get_i32())
        }
        Kind::BigInt => {
            require(buf, 8, "BIGINT")?;
            Value::from_i64(buf.get_i64())
        }
        Kind::Timestamp => {
            require(buf, 8, "TIMESTAMP")?;
            Value::from_timestamp(buf.get_i64())
        }
        Kind::Address => {
            require(buf, 8, "ADDRESS")?;
            Value::from_address(buf.get_u64())
        }
        Kind::Double => {
            require(buf, 8, "DOUBLE")?;
            Value::from_f64(buf.get_f64())
        }
        Kind::Decimal => {
            require(buf, 16, "DECIMAL")?;
            let mut raw = [0u8; 16];
            buf.copy_to_slice(&mut raw);
            Value::from_decimal_scaled(i128::from_be_bytes(raw))
        }
        Kind::Boolean => {
            require(buf, 1, "BOOLEAN")?;
            match buf.get_u8() {
                0 => Value::false_v(),
                1 => Value::true_v(),
                _ => Value::null_of(Kind::Boolean),
            }
        }
        Kind::Varchar | Kind::Varbinary => read_object(buf, kind)?,
        Kind::Array => read_array(buf)?,
        Kind::Null | Kind::Invalid => Value::null(),
    })
}

fn require(buf: &impl Buf, n: usize, what: &str) -> Result<()> {
    if buf.remaining() < n {
        return Err(truncated(what));
    }
    Ok(())
}

fn write_object(buf: &mut impl BufMut, value: &Value) -> Result<()> {
    if value.is_null() {
        buf.put_i32(NULL_LENGTH);
        return Ok(());
    }
    let bytes = value
        .as_bytes()
        .ok_or_else(|| ValueError::TypeMismatch { from: value.kind(), to: value.kind() })?;
    let len = i32::try_from(bytes.len()).map_err(|_| ValueError::ObjectTooLarge {
        actual: bytes.len(),
        max: i32::MAX as usize,
        kind: value.kind(),
        unit: "bytes",
    })?;
    buf.put_i32(len);
    buf.put_slice(&bytes);
    Ok(())
}

fn read_object(buf: &mut impl Buf, kind: Kind) -> Result<Value> {
    require(buf, 4, "object length")?;
    let len = buf.get_i32();
    if len == NULL_LENGTH {
        return Ok(Value::null_of(kind));
    }
    let len = usize::try_from(len)
        .map_err(|_| ValueError::UnsupportedOperation(format!("negative object length {len}")))?;
    require(buf, len, "object payload")?;
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    Ok(match kind {
        Kind::Varchar => Value::borrowed_string(std::rc::Rc::from(bytes.as_slice()), 0, len),
        Kind::Varbinary => Value::borrowed_binary(std::rc::Rc::from(bytes.as_slice()), 0, len),
        _ => return Err(ValueError::TypeMismatch { from: kind, to: kind }),
    })
}

fn write_array(buf: &mut impl BufMut, value: &Value) -> Result<()> {
    let Some(element_kind) = value.array_element_kind() else {
        buf.put_u8(Kind::Invalid as u8);
        buf.put_i16(NULL_ARRAY_COUNT);
        return Ok(());
    };
    let elements = value.array_elements().unwrap_or(&[]);
    buf.put_u8(element_kind as u8);
    let count = i16::try_from(elements.len()).map_err(|_| {
        ValueError::UnsupportedOperation(format!("array of {} elements exceeds i16", elements.len()))
    })?;
    buf.put_i16(count);
    for element in elements {
        write_typed(buf, element_kind, element)?;
    }
    Ok(())
}

fn read_array(buf: &mut impl Buf) -> Result<Value> {
    require(buf, 1, "array element kind")?;
    let tag = buf.get_u8();
    let element_kind = Kind::from_tag(tag)
        .ok_or_else(|| ValueError::UnsupportedOperation(format!("unknown array element kind tag {tag}")))?;
    require(buf, 2, "array count")?;
    let count = buf.get_i16();
    if count == NULL_ARRAY_COUNT {
        return Ok(Value::null_of(Kind::Array));
    }
    let count = usize::try_from(count)
        .map_err(|_| ValueError::UnsupportedOperation(format!("negative array count {count}")))?;
    let mut array = Value::array_of(count, element_kind);
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(read_typed(buf, element_kind)?);
    }
    array.set_array_elements(elements);
    Ok(array)
}

/// Write `value` in export form: like [`write_typed`] but with no Kind
/// tag, no NULL signaling (the caller's bitmap carries nullness — this
/// function must not be called for a NULL `value`), and Decimal prefixed
/// by `(scale = 12, byte_count = 16)` with its limbs in network byte
/// order (this crate's wire form already writes Decimal big-endian, so
/// the payload itself is identical to the wire form; only the two
/// leading bytes differ).
pub fn write_export(buf: &mut impl BufMut, value: &Value) -> Result<()> {
    if value.is_null() {
        return Err(ValueError::UnsupportedOperation(
            "write_export called on a NULL value; caller's bitmap must exclude it".to_owned(),
        ));
    }
    if value.kind() == Kind::Decimal {
        buf.put_u8(12);
        buf.put_u8(16);
        buf.put_slice(&value.as_decimal_scaled().to_be_bytes());
        return Ok(());
    }
    write_typed(buf, value.kind(), value)
}
