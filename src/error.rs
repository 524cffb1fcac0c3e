//! The error taxonomy used throughout this crate.
//!
//! Build-time errors (bad widths, duplicate names, malformed enums) abort
//! construction of a [`crate::types::Type`] or [`crate::tree::Tree`] and are
//! reported at the call site. Runtime value errors (overflow, unknown
//! labels, malformed JSON or UTF-8) surface from a [`crate::view::BoundView`]
//! accessor and never leave the bound cell partially written.

use thiserror::Error;

/// Everything that can go wrong while building or using a layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A type was constructed with a width of zero bits (or, for arrays, a
    /// length of zero elements).
    #[error("invalid width: {0}")]
    InvalidWidth(String),

    /// A type's payload is internally inconsistent, e.g. a custom type whose
    /// declared width does not match what its codec actually reads or writes.
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// Two fields of the same struct share a name.
    #[error("duplicate field name: {0}")]
    DuplicateName(String),

    /// A field name ends in the reserved trailing marker (`_`).
    #[error("field name `{0}` ends in the reserved trailing marker")]
    ReservedName(String),

    /// A value written to a field does not fit in the field's width.
    #[error("value overflows field of width {width} bits: {detail}")]
    Overflow {
        /// The width, in bits, of the field that overflowed.
        width: u32,
        /// A human-readable description of what was being written.
        detail: String,
    },

    /// An enum label was used that is not present in the enum's forward map.
    #[error("unknown enum label: {0}")]
    UnknownLabel(String),

    /// A JSON document does not match the shape of the target type.
    #[error("JSON does not match schema: {0}")]
    SchemaMismatch(String),

    /// Malformed UTF-8 was encountered reading or writing a `utf8` field.
    #[error("invalid UTF-8 encoding: {0}")]
    InvalidEncoding(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;
