//! # value-engine
//!
//! The scalar value engine of a relational database: a uniform runtime
//! representation for every SQL scalar, plus the operations a query
//! executor needs against it.
//!
//! This crate covers, and only covers, the "hard part" fusing three
//! concerns:
//!
//! - a fixed-shape [`Value`] container that can hold inline scalars,
//!   inline pointers to tuple-embedded variable-length data, and
//!   out-of-line handles to pool-allocated variable-length data;
//! - SQL numeric semantics: cross-type promotion, overflow-checked
//!   64-bit integer arithmetic, 128-bit fixed-point [`Decimal`](decimal)
//!   arithmetic (scale 12, precision 38), IEEE-754 NaN/Inf handling, and
//!   the SQL NULL-aware comparison order;
//! - serialization contracts that stay bit-exact across tuple storage
//!   (`tuple_codec`), the wire/parameter format, and the export format
//!   (both in `stream_codec`).
//!
//! ## What this crate does not do
//!
//! It does not own tuple/table storage layout, the variable-length
//! memory pool's allocator internals (only [`varlen::VarlenPool`]'s
//! interface lives here), or binary stream I/O beyond typed primitive
//! reads/writes. It does not parse SQL, plan queries, manage
//! transactions, or implement collations beyond byte-wise comparison.
//!
//! ## Module map
//!
//! | Module | Role |
//! |---|---|
//! | [`kind`] | The `Kind` enumeration and cross-kind promotion tables |
//! | [`varlen`] | `VarlenHandle` and the `VarlenPool` allocator interface |
//! | [`value`] | The `Value` container |
//! | [`decimal`] | 128-bit scaled fixed-point decimal arithmetic |
//! | [`length_prefix`] | The 1-byte/4-byte variable-length object prefix codec |
//! | [`cast`] | Cross-kind conversion |
//! | [`compare`] | NULL-aware and non-null comparison, with the NaN total order |
//! | [`arithmetic`] | Overflow-checked arithmetic |
//! | [`tuple_codec`] | Reading/writing a `Value` at a tuple storage offset |
//! | [`stream_codec`] | Parameter (wire) and export-record (de)serialization |
//! | [`like`] | UTF-8-safe code point scanning and `LIKE` pattern matching |
//! | [`hash`] | Stable 128-bit hashing and incremental combining |
//! | [`error`] | The error kinds this crate raises |
//!
//! ## Feature flags
//!
//! - `nonstandard-timestamp-casts` (off by default): enables the
//!   `Double -> Timestamp` and `Decimal -> Timestamp` casts, which go
//!   through the integer cast rather than any calendar interpretation
//!   of the fractional part. Most SQL dialects forbid this implicit
//!   conversion; it exists only for compatibility shims that need it.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod arithmetic;
pub mod cast;
pub mod compare;
pub mod decimal;
pub mod error;
pub mod hash;
pub mod kind;
pub mod length_prefix;
pub mod like;
pub mod stream_codec;
pub mod tuple_codec;
pub mod value;
pub mod varlen;

pub use arithmetic::Op as ArithmeticOp;
pub use compare::NullOrdering;
pub use error::{RangeFlags, Result, ValueError};
pub use kind::Kind;
pub use value::Value;
pub use varlen::{TempPool, VarlenHandle, VarlenPool};
