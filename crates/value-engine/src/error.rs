//! Error types raised by the value engine.

use thiserror::Error;

use crate::kind::Kind;

/// Bitmask flags distinguishing why a numeric conversion or operation fell
/// out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFlags(u8);

impl RangeFlags {
    /// The value was too large for the destination.
    pub const OVERFLOW: Self = Self(0x01);
    /// The value was too small (too negative) for the destination.
    pub const UNDERFLOW: Self = Self(0x02);

    /// Whether the overflow bit is set.
    #[must_use]
    pub fn is_overflow(self) -> bool {
        self.0 & Self::OVERFLOW.0 != 0
    }

    /// Whether the underflow bit is set.
    #[must_use]
    pub fn is_underflow(self) -> bool {
        self.0 & Self::UNDERFLOW.0 != 0
    }

    /// Build the flag set implied by the sign of an out-of-range value.
    #[must_use]
    pub fn from_sign(negative: bool) -> Self {
        if negative { Self::UNDERFLOW } else { Self::OVERFLOW }
    }
}

impl std::fmt::Display for RangeFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.is_overflow(), self.is_underflow()) {
            (true, true) => write!(f, "overflow|underflow"),
            (true, false) => write!(f, "overflow"),
            (false, true) => write!(f, "underflow"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// Errors the value engine raises to callers.
///
/// Every variant here corresponds to one of the error kinds the core engine
/// is contractually allowed to surface; there is no catch-all "internal
/// error" variant because every failure path in this crate is a checked,
/// named condition.
#[derive(Debug, Error)]
pub enum ValueError {
    /// A binary operation or cast was attempted between kinds that don't
    /// promote to a common kind.
    #[error("type mismatch: cannot convert {from} to {to}")]
    TypeMismatch {
        /// Source kind.
        from: Kind,
        /// Destination kind.
        to: Kind,
    },

    /// A numeric value did not fit in the destination's range.
    #[error("numeric out of range converting {value} from {from} to {to} ({flags})")]
    NumericOutOfRange {
        /// Textual rendering of the offending value, for diagnostics.
        value: String,
        /// Source kind.
        from: Kind,
        /// Destination kind.
        to: Kind,
        /// Overflow/underflow flags.
        flags: RangeFlags,
    },

    /// A variable-length object exceeded the maximum length of its target
    /// column.
    #[error("object of {actual} {unit} too large for {kind} column with max {max} {unit}")]
    ObjectTooLarge {
        /// Actual size.
        actual: usize,
        /// Maximum allowed size.
        max: usize,
        /// Kind of the object.
        kind: Kind,
        /// Unit the size is measured in ("bytes" or "code points").
        unit: &'static str,
    },

    /// Division by zero in Decimal arithmetic.
    #[error("division by zero")]
    DivisionByZero,

    /// A textual representation could not be parsed into the requested
    /// kind.
    #[error("invalid {kind} format: {text:?}")]
    InvalidFormat {
        /// The kind being parsed into.
        kind: Kind,
        /// The offending text.
        text: String,
    },

    /// An operation is not supported, either in general or because it is
    /// gated behind a disabled feature.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, ValueError>;
