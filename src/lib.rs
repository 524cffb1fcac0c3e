//! `bitlayout` models arbitrary, bit-aligned binary interfaces: packet
//! headers, hardware register files, protocol fields: anything whose
//! fields don't line up on byte boundaries and whose layout you want to
//! describe once, at runtime, rather than hand-derive with shifts and masks
//! scattered across the codebase.
//!
//! You describe a layout as a [`types::Type`]: primitive integers, signed
//! integers, labeled enums, fixed-length UTF-8 windows, structs, arrays, and
//! caller-registered custom leaf types ([`registry::Registry`]). Building a
//! [`tree::Tree`] out of a `Type` fixes every field's absolute bit offset
//! once and for all. From there:
//!
//! - [`codec`] reads and writes a [`value::Value`] tree directly against a
//!   raw [`raw::Raw`] integer, the `(raw >> offset) & mask` kernel every
//!   other layer builds on.
//! - [`view::BoundView`] wraps a tree and a shared, mutably-writable raw
//!   cell, giving you `view.field("x").value()` / `.set_value(...)` /
//!   `.json()` navigation without re-threading the raw integer through every
//!   call.
//! - [`expr`] lifts field references into a symbolic [`expr::Expr`] tree
//!   (comparisons, arithmetic, bitwise operators) that [`expr::lower`]
//!   reduces to a shift-and-mask [`expr::Ir`] and [`expr::render`] prints as
//!   a portable, fully-parenthesized C-family expression string, for
//!   embedding a field's extraction logic into generated code.
//!
//! # Example
//! ```
//! use bitlayout::prelude::*;
//!
//! let status = EnumTable::new(vec![("dead", 0u128), ("pining", 1u128), ("resting", 2u128)]).unwrap();
//! let parrot = Type::struct_(vec![
//!     ("status", Type::uint_enum(2, status).unwrap()),
//!     ("rgb", Type::array(Type::uint(5).unwrap(), 3).unwrap()),
//! ])
//! .unwrap();
//! let tree = Tree::new(parrot);
//!
//! let view = BoundView::new(tree, Raw::from(0u32));
//! view.get("rgb[1]").unwrap().set_value(&Value::UInt(Raw::from(17u32))).unwrap();
//! assert_eq!(view.get("rgb[1]").unwrap().value().unwrap(), Value::UInt(Raw::from(17u32)));
//! assert_eq!(view.field("status").unwrap(), "dead");
//! ```
//!
//! # What this crate is not
//! `bitlayout` is not a zero-copy, compile-time, byte-aligned layout macro;
//! see [binary-layout](https://crates.io/crates/binary-layout) for that. Its
//! layouts are built and navigated at runtime, and a leaf's raw value is an
//! arbitrary-precision [`num_bigint::BigUint`] rather than a native integer,
//! because a bit-aligned field's width is not known until the layout is
//! assembled. This trades the native-width fast path for the ability to
//! describe arbitrary, non-byte-aligned, non-power-of-two field widths
//! without a combinatorial explosion of generated code paths; it remains a
//! documented opportunity to special-case narrow fields onto native integers
//! later without changing the public API.

pub mod codec;
pub mod error;
pub mod expr;
pub mod raw;
pub mod registry;
pub mod tree;
pub mod types;
pub mod value;
pub mod view;

/// Re-exports the pieces most programs assembling and walking a layout need,
/// so a caller typically needs only `use bitlayout::prelude::*;`.
pub mod prelude {
    pub use crate::codec::{decode, encode};
    pub use crate::error::{Error, Result};
    pub use crate::expr::{lower, render, BinOp, Expr, Ir, SymbolicField, UnOp};
    pub use crate::raw::Raw;
    pub use crate::registry::{CustomType, Registry};
    pub use crate::tree::{FieldNode, Selector, Tree};
    pub use crate::types::{EnumTable, StructField, Type, TypeKind};
    pub use crate::value::{json_to_value, value_to_json, Value};
    pub use crate::view::BoundView;
}
