//! The scalar `Kind` enumeration and cross-kind promotion tables.

use std::fmt;

/// The closed set of scalar kinds the engine can hold in a `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    /// Uninitialized; never observed by well-behaved callers.
    Invalid = 0,
    /// Untyped NULL.
    Null = 1,
    /// `i8`.
    TinyInt = 2,
    /// `i16`.
    SmallInt = 3,
    /// `i32`.
    Integer = 4,
    /// `i64`.
    BigInt = 5,
    /// `i64` microseconds since the Unix epoch.
    Timestamp = 6,
    /// `f64`.
    Double = 7,
    /// 128-bit signed fixed-point, scale 12, precision 38.
    Decimal = 8,
    /// `bool`.
    Boolean = 9,
    /// UTF-8 text.
    Varchar = 10,
    /// Opaque bytes.
    Varbinary = 11,
    /// Pointer-width integer, used only as an executor escape hatch.
    Address = 12,
    /// Homogeneous sequence of `Value`, all of one element `Kind`.
    Array = 13,
}

impl Kind {
    /// Fixed tuple storage size in bytes for fixed-width kinds, or the
    /// pointer-sized footprint used for objects (the length-prefix and
    /// payload live separately; see `tuple_codec`).
    #[must_use]
    pub const fn fixed_size(self) -> usize {
        match self {
            Self::Invalid | Self::Null => 0,
            Self::TinyInt => 1,
            Self::SmallInt => 2,
            Self::Integer => 4,
            Self::BigInt | Self::Timestamp | Self::Double | Self::Address => 8,
            Self::Decimal => 16,
            Self::Boolean => 1,
            Self::Varchar | Self::Varbinary | Self::Array => 8,
        }
    }

    /// Whether this kind is stored as a pointer/handle to variable-length
    /// data rather than an inline fixed-width value.
    #[must_use]
    pub const fn is_object(self) -> bool {
        matches!(self, Self::Varchar | Self::Varbinary | Self::Array)
    }

    /// Whether this kind participates in integer promotion (i.e. is an
    /// integer-family kind, including `Timestamp`).
    #[must_use]
    pub const fn is_integer_family(self) -> bool {
        matches!(
            self,
            Self::TinyInt
                | Self::SmallInt
                | Self::Integer
                | Self::BigInt
                | Self::Timestamp
                | Self::Address
        )
    }

    /// Whether this kind is one of the numeric kinds (integer family,
    /// `Double`, or `Decimal`).
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.is_integer_family() || matches!(self, Self::Double | Self::Decimal)
    }

    /// Human-readable name, matching the casing used elsewhere in the
    /// crate's error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Null => "NULL",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Timestamp => "TIMESTAMP",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::Varchar => "VARCHAR",
            Self::Varbinary => "VARBINARY",
            Self::Address => "ADDRESS",
            Self::Array => "ARRAY",
        }
    }

    /// Decode a Kind tag byte as written by the stream codec (the
    /// enum's own `#[repr(u8)]` discriminant), or `None` for an unknown
    /// tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Invalid,
            1 => Self::Null,
            2 => Self::TinyInt,
            3 => Self::SmallInt,
            4 => Self::Integer,
            5 => Self::BigInt,
            6 => Self::Timestamp,
            7 => Self::Double,
            8 => Self::Decimal,
            9 => Self::Boolean,
            10 => Self::Varchar,
            11 => Self::Varbinary,
            12 => Self::Address,
            13 => Self::Array,
            _ => return None,
        })
    }

    /// Resolve the result kind of a binary operation between `self` and
    /// `other`, per the promotion rules in the type descriptor
    /// specification: `Decimal` dominates any other numeric/timestamp
    /// kind, then `Double`, then the integer family promotes to `BigInt`.
    /// Any other combination (objects, booleans, arrays, mismatched
    /// non-numeric kinds) is `Invalid`.
    #[must_use]
    pub fn promote(self, other: Self) -> Self {
        if self == Self::Decimal || other == Self::Decimal {
            let both_eligible = (self == Self::Decimal || self.is_numeric() || self == Self::Timestamp)
                && (other == Self::Decimal || other.is_numeric() || other == Self::Timestamp);
            return if both_eligible { Self::Decimal } else { Self::Invalid };
        }
        if self == Self::Double || other == Self::Double {
            let both_eligible = (self == Self::Double || self.is_integer_family())
                && (other == Self::Double || other.is_integer_family());
            return if both_eligible { Self::Double } else { Self::Invalid };
        }
        if self.is_integer_family() && other.is_integer_family() {
            return Self::BigInt;
        }
        Self::Invalid
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promote_prefers_decimal() {
        assert_eq!(Kind::Decimal.promote(Kind::Integer), Kind::Decimal);
        assert_eq!(Kind::BigInt.promote(Kind::Decimal), Kind::Decimal);
    }

    #[test]
    fn promote_prefers_double_over_integers() {
        assert_eq!(Kind::Double.promote(Kind::SmallInt), Kind::Double);
        assert_eq!(Kind::TinyInt.promote(Kind::Double), Kind::Double);
    }

    #[test]
    fn promote_integers_to_bigint() {
        assert_eq!(Kind::TinyInt.promote(Kind::Integer), Kind::BigInt);
        assert_eq!(Kind::Timestamp.promote(Kind::SmallInt), Kind::BigInt);
    }

    #[test]
    fn promote_rejects_non_numeric() {
        assert_eq!(Kind::Varchar.promote(Kind::Integer), Kind::Invalid);
        assert_eq!(Kind::Boolean.promote(Kind::Double), Kind::Invalid);
        assert_eq!(Kind::Array.promote(Kind::Array), Kind::Invalid);
    }

    #[test]
    fn fixed_size_matches_storage_width() {
        assert_eq!(Kind::TinyInt.fixed_size(), 1);
        assert_eq!(Kind::SmallInt.fixed_size(), 2);
        assert_eq!(Kind::Integer.fixed_size(), 4);
        assert_eq!(Kind::BigInt.fixed_size(), 8);
        assert_eq!(Kind::Decimal.fixed_size(), 16);
    }

    #[test]
    fn tag_round_trips_for_every_kind() {
        for kind in [
            Kind::Invalid,
            Kind::Null,
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
            Kind::Array,
        ] {
            assert_eq!(Kind::from_tag(kind as u8), Some(kind));
        }
        assert_eq!(Kind::from_tag(255), None);
    }

    #[test]
    fn is_object_only_for_varlen_kinds() {
        assert!(Kind::Varchar.is_object());
        assert!(Kind::Varbinary.is_object());
        assert!(Kind::Array.is_object());
        assert!(!Kind::BigInt.is_object());
    }
}
