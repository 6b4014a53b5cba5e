//! The `Value` container: a tagged cell that can hold any scalar `Kind`.

use std::rc::Rc;

use crate::decimal;
use crate::kind::Kind;
use crate::varlen::VarlenHandle;

/// NULL sentinel for each fixed-width numeric kind (data model §3).
pub mod sentinel {
    /// `i8` NULL sentinel.
    pub const TINYINT: i8 = i8::MIN;
    /// `i16` NULL sentinel.
    pub const SMALLINT: i16 = i16::MIN;
    /// `i32` NULL sentinel.
    pub const INTEGER: i32 = i32::MIN;
    /// `i64` NULL sentinel (also used for `BigInt`/`Timestamp`/`Address`).
    pub const BIGINT: i64 = i64::MIN;
    /// `f64` NULL sentinel threshold: any value at or below this is NULL.
    pub const DOUBLE_MAX: f64 = -1.797_693_134_862_315_7e+308;
}

/// The object payload of a Varchar/Varbinary/Array `Value`.
///
/// This is the Rust-native encoding of choice (a) from the design notes:
/// borrowed and owned variable-length bytes are distinct enum arms rather
/// than one dynamically-flagged representation, so the borrow checker
/// enforces that a `Borrowed` payload cannot outlive the tuple it points
/// into.
#[derive(Debug, Clone)]
pub enum Payload {
    /// NULL object.
    Null,
    /// Bytes borrowed from tuple storage: the whole tuple buffer, a start
    /// offset into it, and a cached byte-length (invariant 1: must match
    /// the stored length prefix). Keeping the offset separate from the
    /// buffer lets a borrowed `Value` point anywhere inside a shared
    /// tuple row without copying — `Rc<[u8]>` alone has no sub-slicing
    /// operation that preserves zero-copy sharing.
    Borrowed(Rc<[u8]>, usize, usize),
    /// Bytes owned via a shared pool handle.
    Owned(VarlenHandle, usize),
}

impl Payload {
    fn len(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Borrowed(_, _, len) => *len,
            Self::Owned(_, len) => *len,
        }
    }

    fn as_bytes(&self) -> Option<std::borrow::Cow<'_, [u8]>> {
        match self {
            Self::Null => None,
            Self::Borrowed(buf, start, len) => {
                Some(std::borrow::Cow::Borrowed(&buf[*start..*start + *len]))
            }
            Self::Owned(handle, len) => {
                Some(std::borrow::Cow::Owned(handle.bytes()[..*len].to_vec()))
            }
        }
    }
}

/// An element-homogeneous array record, boxed behind `Value::Array`.
#[derive(Debug, Clone)]
pub struct ArrayRecord {
    /// The kind every element shares.
    pub element_kind: Kind,
    /// The array's elements. Length is fixed at allocation time.
    pub elements: Vec<Value>,
}

/// A single SQL scalar of any supported `Kind`.
///
/// Internally this is a discriminated union over the numeric payload
/// (stored in a native Rust type rather than a raw 16-byte cell — the
/// crate does not use `unsafe`, so there is nothing to gain from
/// reinterpreting bytes in memory; the 16-byte cell from the
/// specification is instead the *wire shape* produced by
/// `tuple_codec`/`stream_codec`) and the object payload above.
#[derive(Debug, Clone)]
pub struct Value {
    kind: Kind,
    data: Data,
}

#[derive(Debug, Clone)]
enum Data {
    Fixed(FixedData),
    Object(Payload),
    Array(Option<Rc<ArrayRecord>>),
}

#[derive(Debug, Clone, Copy)]
enum FixedData {
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Timestamp(i64),
    Double(f64),
    Decimal(i128),
    Boolean(Option<bool>),
    Address(u64),
}

impl Value {
    /// This `Value`'s kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// An untyped NULL.
    #[must_use]
    pub fn null() -> Self {
        Self {
            kind: Kind::Null,
            data: Data::Fixed(FixedData::BigInt(sentinel::BIGINT)),
        }
    }

    /// A typed NULL of the given kind.
    #[must_use]
    pub fn null_of(kind: Kind) -> Self {
        match kind {
            Kind::TinyInt => Self::from_i8(sentinel::TINYINT),
            Kind::SmallInt => Self::from_i16(sentinel::SMALLINT),
            Kind::Integer => Self::from_i32(sentinel::INTEGER),
            Kind::BigInt => Self::from_i64(sentinel::BIGINT),
            Kind::Timestamp => Self::from_timestamp(sentinel::BIGINT),
            Kind::Address => Self {
                kind: Kind::Address,
                data: Data::Fixed(FixedData::Address(sentinel::BIGINT as u64)),
            },
            Kind::Double => Self::from_f64(sentinel::DOUBLE_MAX),
            Kind::Decimal => Self {
                kind: Kind::Decimal,
                data: Data::Fixed(FixedData::Decimal(decimal::NULL_SENTINEL)),
            },
            Kind::Boolean => Self {
                kind: Kind::Boolean,
                data: Data::Fixed(FixedData::Boolean(None)),
            },
            Kind::Varchar | Kind::Varbinary => Self {
                kind,
                data: Data::Object(Payload::Null),
            },
            Kind::Array => Self {
                kind: Kind::Array,
                data: Data::Array(None),
            },
            Kind::Null | Kind::Invalid => Self::null(),
        }
    }

    /// `true`.
    #[must_use]
    pub fn true_v() -> Self {
        Self {
            kind: Kind::Boolean,
            data: Data::Fixed(FixedData::Boolean(Some(true))),
        }
    }

    /// `false`.
    #[must_use]
    pub fn false_v() -> Self {
        Self {
            kind: Kind::Boolean,
            data: Data::Fixed(FixedData::Boolean(Some(false))),
        }
    }

    /// Construct a `TinyInt` Value. A raw value equal to the sentinel is
    /// indistinguishable from (and treated as) NULL, matching the tuple
    /// round-trip invariant.
    #[must_use]
    pub fn from_i8(v: i8) -> Self {
        Self { kind: Kind::TinyInt, data: Data::Fixed(FixedData::TinyInt(v)) }
    }

    /// Construct a `SmallInt` Value.
    #[must_use]
    pub fn from_i16(v: i16) -> Self {
        Self { kind: Kind::SmallInt, data: Data::Fixed(FixedData::SmallInt(v)) }
    }

    /// Construct an `Integer` Value.
    #[must_use]
    pub fn from_i32(v: i32) -> Self {
        Self { kind: Kind::Integer, data: Data::Fixed(FixedData::Integer(v)) }
    }

    /// Construct a `BigInt` Value.
    #[must_use]
    pub fn from_i64(v: i64) -> Self {
        Self { kind: Kind::BigInt, data: Data::Fixed(FixedData::BigInt(v)) }
    }

    /// Construct a `Timestamp` Value from microseconds since the epoch.
    #[must_use]
    pub fn from_timestamp(micros: i64) -> Self {
        Self { kind: Kind::Timestamp, data: Data::Fixed(FixedData::Timestamp(micros)) }
    }

    /// Construct a `Double` Value.
    #[must_use]
    pub fn from_f64(v: f64) -> Self {
        Self { kind: Kind::Double, data: Data::Fixed(FixedData::Double(v)) }
    }

    /// Construct a `Boolean` Value.
    #[must_use]
    pub fn from_bool(v: bool) -> Self {
        if v { Self::true_v() } else { Self::false_v() }
    }

    /// Construct an `Address` Value (a plain `u64`, no pointer semantics).
    #[must_use]
    pub fn from_address(v: u64) -> Self {
        Self { kind: Kind::Address, data: Data::Fixed(FixedData::Address(v)) }
    }

    /// Construct a `Decimal` Value directly from a pre-scaled `i128`
    /// (i.e. `value * 10^12`), as produced by `decimal::parse`.
    #[must_use]
    pub fn from_decimal_scaled(scaled: i128) -> Self {
        Self { kind: Kind::Decimal, data: Data::Fixed(FixedData::Decimal(scaled)) }
    }

    /// Parse a decimal literal into a Decimal Value.
    pub fn decimal_from_str(text: &str) -> crate::error::Result<Self> {
        Ok(Self::from_decimal_scaled(decimal::parse(text)?))
    }

    /// Construct a Varchar Value that owns a pool-allocated copy of
    /// `bytes`, allocated from `pool` (the crate's `TempPool` if
    /// constructed via [`Value::temp_string`]).
    #[must_use]
    pub fn owned_string(bytes: &[u8], pool: &dyn crate::varlen::VarlenPool) -> Self {
        Self::owned_object(Kind::Varchar, bytes, pool)
    }

    /// Construct a Varbinary Value that owns a pool-allocated copy of
    /// `bytes`.
    #[must_use]
    pub fn owned_binary(bytes: &[u8], pool: &dyn crate::varlen::VarlenPool) -> Self {
        Self::owned_object(Kind::Varbinary, bytes, pool)
    }

    fn owned_object(kind: Kind, bytes: &[u8], pool: &dyn crate::varlen::VarlenPool) -> Self {
        let handle = pool.create(bytes, bytes.len());
        Self {
            kind,
            data: Data::Object(Payload::Owned(handle, bytes.len())),
        }
    }

    /// Construct a Varchar Value allocated from the shared temp pool.
    #[must_use]
    pub fn temp_string(bytes: &[u8], temp_pool: &crate::varlen::TempPool) -> Self {
        Self::owned_string(bytes, temp_pool)
    }

    /// Construct a Varbinary Value allocated from the shared temp pool.
    #[must_use]
    pub fn temp_binary(bytes: &[u8], temp_pool: &crate::varlen::TempPool) -> Self {
        Self::owned_binary(bytes, temp_pool)
    }

    /// Construct a Varchar Value that borrows bytes from tuple storage
    /// (the `source_inlined = true` case from the data model), starting
    /// at `start` within the shared buffer. The borrow's lifetime is
    /// encoded by `Rc<[u8]>` ownership of the tuple slice, not by a Rust
    /// lifetime parameter, to keep `Value: 'static` for ergonomic use in
    /// executor pipelines; callers are responsible for not mutating the
    /// backing tuple while a borrowed `Value` is alive (documented
    /// convention, per design note 9).
    #[must_use]
    pub fn borrowed_string(bytes: Rc<[u8]>, start: usize, len: usize) -> Self {
        Self { kind: Kind::Varchar, data: Data::Object(Payload::Borrowed(bytes, start, len)) }
    }

    /// Construct a Varbinary Value that borrows bytes from tuple storage.
    #[must_use]
    pub fn borrowed_binary(bytes: Rc<[u8]>, start: usize, len: usize) -> Self {
        Self { kind: Kind::Varbinary, data: Data::Object(Payload::Borrowed(bytes, start, len)) }
    }

    /// Allocate a fixed-length, all-NULL Array of the given element kind.
    #[must_use]
    pub fn array_of(len: usize, element_kind: Kind) -> Self {
        let elements = (0..len).map(|_| Self::null_of(element_kind)).collect();
        Self {
            kind: Kind::Array,
            data: Data::Array(Some(Rc::new(ArrayRecord { element_kind, elements }))),
        }
    }

    /// Overwrite this Array's elements. Only valid for `Kind::Array`; the
    /// length was fixed at allocation and must match.
    ///
    /// # Panics
    /// Panics if `self` is not an `Array`, or if `values.len()` does not
    /// match the array's allocated length.
    pub fn set_array_elements(&mut self, values: Vec<Value>) {
        let Data::Array(slot) = &mut self.data else {
            panic!("set_array_elements called on non-Array Value");
        };
        let Some(record) = slot else {
            panic!("set_array_elements called on a NULL array");
        };
        assert_eq!(
            record.elements.len(),
            values.len(),
            "array length is fixed at allocation"
        );
        let element_kind = record.element_kind;
        *slot = Some(Rc::new(ArrayRecord { element_kind, elements: values }));
    }

    /// The array's elements, or `None` if this isn't a non-NULL Array.
    #[must_use]
    pub fn array_elements(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Array(Some(record)) => Some(&record.elements),
            _ => None,
        }
    }

    /// The array's element kind, or `None` if this isn't a non-NULL Array.
    #[must_use]
    pub fn array_element_kind(&self) -> Option<Kind> {
        match &self.data {
            Data::Array(Some(record)) => Some(record.element_kind),
            _ => None,
        }
    }

    /// Mark this Value as NULL of its current kind. After this call
    /// `is_null()` is true and every type-specific getter returns the
    /// kind's NULL sentinel (data model invariant 5).
    pub fn set_null(&mut self) {
        *self = Self::null_of(self.kind);
    }

    /// Whether this Value is NULL, by sentinel or by explicit tag.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match (&self.kind, &self.data) {
            (Kind::Null, _) => true,
            (_, Data::Fixed(FixedData::TinyInt(v))) => *v == sentinel::TINYINT,
            (_, Data::Fixed(FixedData::SmallInt(v))) => *v == sentinel::SMALLINT,
            (_, Data::Fixed(FixedData::Integer(v))) => *v == sentinel::INTEGER,
            (_, Data::Fixed(FixedData::BigInt(v))) => *v == sentinel::BIGINT,
            (_, Data::Fixed(FixedData::Timestamp(v))) => *v == sentinel::BIGINT,
            (_, Data::Fixed(FixedData::Address(v))) => *v == sentinel::BIGINT as u64,
            (_, Data::Fixed(FixedData::Double(v))) => *v <= sentinel::DOUBLE_MAX,
            (_, Data::Fixed(FixedData::Decimal(v))) => *v == decimal::NULL_SENTINEL,
            (_, Data::Fixed(FixedData::Boolean(v))) => v.is_none(),
            (_, Data::Object(Payload::Null)) => true,
            (_, Data::Object(_)) => false,
            (_, Data::Array(slot)) => slot.is_none(),
        }
    }

    /// Whether this is a non-NULL `Double` holding NaN.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(&self.data, Data::Fixed(FixedData::Double(v)) if v.is_nan())
    }

    /// Whether this is a non-NULL `Boolean` holding `true`.
    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(&self.data, Data::Fixed(FixedData::Boolean(Some(true))))
    }

    /// Whether this is a non-NULL `Boolean` holding `false`.
    #[must_use]
    pub fn is_false(&self) -> bool {
        matches!(&self.data, Data::Fixed(FixedData::Boolean(Some(false))))
    }

    /// Whether this is a non-NULL numeric zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        if self.is_null() {
            return false;
        }
        match &self.data {
            Data::Fixed(FixedData::TinyInt(v)) => *v == 0,
            Data::Fixed(FixedData::SmallInt(v)) => *v == 0,
            Data::Fixed(FixedData::Integer(v)) => *v == 0,
            Data::Fixed(FixedData::BigInt(v)) | Data::Fixed(FixedData::Timestamp(v)) => *v == 0,
            Data::Fixed(FixedData::Double(v)) => *v == 0.0,
            Data::Fixed(FixedData::Decimal(v)) => *v == 0,
            _ => false,
        }
    }

    // --- typed accessors, each returning the kind's NULL sentinel when
    // the Value is NULL (invariant 5) ----------------------------------

    /// `i8` value, or the TinyInt NULL sentinel.
    #[must_use]
    pub fn as_i8(&self) -> i8 {
        match &self.data {
            Data::Fixed(FixedData::TinyInt(v)) => *v,
            _ => sentinel::TINYINT,
        }
    }

    /// `i16` value, or the SmallInt NULL sentinel.
    #[must_use]
    pub fn as_i16(&self) -> i16 {
        match &self.data {
            Data::Fixed(FixedData::SmallInt(v)) => *v,
            _ => sentinel::SMALLINT,
        }
    }

    /// `i32` value, or the Integer NULL sentinel.
    #[must_use]
    pub fn as_i32(&self) -> i32 {
        match &self.data {
            Data::Fixed(FixedData::Integer(v)) => *v,
            _ => sentinel::INTEGER,
        }
    }

    /// `i64` value for `BigInt`/`Timestamp`, or the BigInt NULL sentinel.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match &self.data {
            Data::Fixed(FixedData::BigInt(v)) | Data::Fixed(FixedData::Timestamp(v)) => *v,
            _ => sentinel::BIGINT,
        }
    }

    /// `u64` Address value, or the Address NULL sentinel.
    #[must_use]
    pub fn as_address(&self) -> u64 {
        match &self.data {
            Data::Fixed(FixedData::Address(v)) => *v,
            _ => sentinel::BIGINT as u64,
        }
    }

    /// `f64` value, or the Double NULL sentinel.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match &self.data {
            Data::Fixed(FixedData::Double(v)) => *v,
            _ => sentinel::DOUBLE_MAX,
        }
    }

    /// Scaled `i128` Decimal value, or the Decimal NULL sentinel.
    #[must_use]
    pub fn as_decimal_scaled(&self) -> i128 {
        match &self.data {
            Data::Fixed(FixedData::Decimal(v)) => *v,
            _ => decimal::NULL_SENTINEL,
        }
    }

    /// `bool` value, or `false` if NULL (callers should check `is_null`
    /// first when the distinction matters).
    #[must_use]
    pub fn as_bool(&self) -> bool {
        matches!(&self.data, Data::Fixed(FixedData::Boolean(Some(true))))
    }

    /// Borrow the object payload's bytes, if non-NULL.
    #[must_use]
    pub fn as_bytes(&self) -> Option<std::borrow::Cow<'_, [u8]>> {
        match &self.data {
            Data::Object(payload) => payload.as_bytes(),
            _ => None,
        }
    }

    /// Borrow the object payload's bytes as `str`, if this is a non-NULL,
    /// valid-UTF-8 Varchar. Per invariant 4, the engine trusts UTF-8
    /// validity on entry and does not re-validate here.
    #[must_use]
    pub fn as_str(&self) -> Option<std::borrow::Cow<'_, str>> {
        match self.as_bytes()? {
            std::borrow::Cow::Borrowed(b) => std::str::from_utf8(b).ok().map(std::borrow::Cow::Borrowed),
            std::borrow::Cow::Owned(b) => String::from_utf8(b).ok().map(std::borrow::Cow::Owned),
        }
    }

    /// Cached object byte-length (invariant 1), or `None` for non-objects
    /// or NULL objects.
    #[must_use]
    pub fn object_len(&self) -> Option<usize> {
        match &self.data {
            Data::Object(payload @ (Payload::Borrowed(..) | Payload::Owned(..))) => {
                Some(payload.len())
            }
            _ => None,
        }
    }

    /// Release a shared Varlen handle this Value owns. A no-op for
    /// borrowed, fixed-width, or already-NULL Values (idempotent, per the
    /// pool contract).
    pub fn free(&self, pool: &dyn crate::varlen::VarlenPool) {
        if let Data::Object(Payload::Owned(handle, _)) = &self.data {
            pool.destroy(handle);
        }
    }
}

/// Renders through the same text form as the `Varchar` cast (§4.E's
/// format column), without needing a `VarlenPool` since `Display` only
/// ever produces a borrowed-for-the-call `String`, never a `Value`.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match &self.data {
            Data::Object(_) => match self.as_str() {
                Some(s) => f.write_str(&s),
                None => f.write_str("<binary>"),
            },
            Data::Array(Some(record)) => {
                f.write_str("[")?;
                for (i, element) in record.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
            _ => match crate::cast::scalar_text(self) {
                Ok(text) => f.write_str(&text),
                Err(_) => f.write_str("<invalid>"),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::compare::compare_without_null(self, other) == std::cmp::Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varlen::TempPool;

    #[test]
    fn set_null_yields_sentinel_for_every_kind() {
        for kind in [
            Kind::TinyInt,
            Kind::SmallInt,
            Kind::Integer,
            Kind::BigInt,
            Kind::Timestamp,
            Kind::Double,
            Kind::Decimal,
            Kind::Boolean,
            Kind::Varchar,
            Kind::Varbinary,
            Kind::Address,
        ] {
            let mut v = Value::null_of(kind);
            v.set_null();
            assert!(v.is_null(), "{kind} should be null after set_null");
        }
    }

    #[test]
    fn sentinels_round_trip_through_constructors() {
        assert!(Value::from_i8(sentinel::TINYINT).is_null());
        assert!(Value::from_i16(sentinel::SMALLINT).is_null());
        assert!(Value::from_i32(sentinel::INTEGER).is_null());
        assert!(Value::from_i64(sentinel::BIGINT).is_null());
        assert!(Value::from_f64(sentinel::DOUBLE_MAX).is_null());
        assert!(Value::from_f64(-f64::MAX).is_null());
        assert!(!Value::from_i32(0).is_null());
    }

    #[test]
    fn temp_string_round_trips_bytes() {
        let pool = TempPool::new();
        let v = Value::temp_string(b"hello", &pool);
        assert_eq!(v.as_str().unwrap(), "hello");
        assert_eq!(v.object_len(), Some(5));
    }

    #[test]
    fn shared_owned_payload_frees_once_idempotently() {
        let pool = TempPool::new();
        let v1 = Value::temp_string(b"shared", &pool);
        let v2 = v1.clone();
        v1.free(&pool);
        v2.free(&pool);
    }

    #[test]
    fn array_elements_fixed_length() {
        let mut arr = Value::array_of(3, Kind::Integer);
        arr.set_array_elements(vec![
            Value::from_i32(1),
            Value::from_i32(2),
            Value::from_i32(3),
        ]);
        assert_eq!(arr.array_elements().unwrap().len(), 3);
        assert_eq!(arr.array_element_kind(), Some(Kind::Integer));
    }

    #[test]
    #[should_panic(expected = "array length is fixed")]
    fn array_elements_reject_length_change() {
        let mut arr = Value::array_of(2, Kind::Integer);
        arr.set_array_elements(vec![Value::from_i32(1)]);
    }

    #[test]
    fn is_zero_false_for_null() {
        assert!(!Value::null_of(Kind::Integer).is_zero());
        assert!(Value::from_i32(0).is_zero());
    }

    #[test]
    fn display_renders_through_varchar_text_form() {
        assert_eq!(Value::from_i32(-7).to_string(), "-7");
        assert_eq!(Value::null_of(Kind::Integer).to_string(), "NULL");
        assert_eq!(Value::decimal_from_str("2.500000000000").unwrap().to_string(), "2.5");

        let pool = TempPool::new();
        assert_eq!(Value::temp_string(b"hi", &pool).to_string(), "hi");

        let mut arr = Value::array_of(2, Kind::Integer);
        arr.set_array_elements(vec![Value::from_i32(1), Value::from_i32(2)]);
        assert_eq!(arr.to_string(), "[1, 2]");
    }

    #[test]
    fn nan_is_nan_but_not_null() {
        let v = Value::from_f64(f64::NAN);
        assert!(v.is_nan());
        assert!(!v.is_null());
    }
}
