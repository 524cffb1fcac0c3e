//! The type algebra: [`Type`] describes the width and decoding rule of a bit
//! range, without yet being placed at any offset. Types are immutable value
//! objects: building one either succeeds outright or returns a build-time
//! [`Error`]; there is no way to construct a `Type` that is internally
//! inconsistent.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::registry::{CustomType, Registry};

/// The reserved trailing marker. A struct field name may not end in this;
/// it is set aside for accessor-style names in surface DSLs layered on top
/// of this crate (`size_`, `raw_`, `value_`, ...).
pub const RESERVED_SUFFIX: char = '_';

/// A single declared field of a [`TypeKind::Struct`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    /// The field's name, unique within its struct and not reserved.
    pub name: String,
    /// The field's type.
    pub ty: Type,
}

/// The shape of a [`Type`]: what kind of value it decodes to and whatever
/// payload that requires (an enum table, a field list, an element type and
/// length, a byte length, or a registered custom codec).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// An unsigned integer of some bit width.
    UInt,
    /// A two's-complement signed integer of some bit width.
    SInt,
    /// An unsigned integer with a label/code enum table attached.
    Enum(EnumTable),
    /// An ordered, named product of fields, laid out contiguously.
    Struct(Vec<StructField>),
    /// A fixed-length, homogeneous sequence of elements.
    Array {
        /// The element type.
        elem: Box<Type>,
        /// The number of elements.
        length: u64,
    },
    /// A fixed-width byte window decoded as a UTF-8 string.
    Utf8 {
        /// The capacity of the window, in bytes.
        byte_len: u64,
    },
    /// A user-registered leaf type with its own encode/decode/jsonify rule.
    Custom(Arc<CustomType>),
}

#[derive(Debug, Clone, PartialEq)]
struct TypeInner {
    width: u64,
    kind: TypeKind,
}

/// A layout type: an immutable description of a bit range's width and
/// decoding rule. `Type`s are cheap to clone (an `Arc` bump) and may be
/// shared across any number of field trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Type(Arc<TypeInner>);

impl Type {
    /// The width of this type, in bits.
    pub fn width(&self) -> u64 {
        self.0.width
    }

    /// This type's kind and kind-specific payload.
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    fn new(width: u64, kind: TypeKind) -> Type {
        Type(Arc::new(TypeInner { width, kind }))
    }

    /// An unsigned integer of `width` bits. `width` must be nonzero.
    pub fn uint(width: u64) -> Result<Type> {
        check_width(width)?;
        Ok(Type::new(width, TypeKind::UInt))
    }

    /// A two's-complement signed integer of `width` bits. `width` must be nonzero.
    pub fn sint(width: u64) -> Result<Type> {
        check_width(width)?;
        Ok(Type::new(width, TypeKind::SInt))
    }

    /// An unsigned integer of `width` bits whose values are additionally
    /// interpreted through `table`. Every code in `table` must fit in
    /// `width` bits, or this fails with [`Error::InvalidType`].
    pub fn uint_enum(width: u64, table: EnumTable) -> Result<Type> {
        check_width(width)?;
        if width < 128 {
            let capacity = 1u128 << width;
            if let Some((_, &code)) = table.forward.iter().find(|(_, &code)| code >= capacity) {
                return Err(Error::InvalidType(format!(
                    "enum code {code} does not fit in {width} bits"
                )));
            }
        }
        Ok(Type::new(width, TypeKind::Enum(table)))
    }

    /// A UTF-8 string stored in a window of `byte_len` bytes (`width = 8 * byte_len`).
    pub fn utf8(byte_len: u64) -> Result<Type> {
        if byte_len == 0 {
            return Err(Error::InvalidWidth(
                "utf8 type must have a nonzero byte length".to_string(),
            ));
        }
        Ok(Type::new(byte_len * 8, TypeKind::Utf8 { byte_len }))
    }

    /// An ordered product of named fields, laid out contiguously starting at
    /// offset 0 with no implicit padding. Field names must be unique and
    /// must not end in [`RESERVED_SUFFIX`].
    pub fn struct_(fields: Vec<(impl Into<String>, Type)>) -> Result<Type> {
        let mut seen = HashMap::new();
        let mut declared = Vec::with_capacity(fields.len());
        let mut width = 0u64;
        for (name, ty) in fields {
            let name = name.into();
            if name.ends_with(RESERVED_SUFFIX) {
                return Err(Error::ReservedName(name));
            }
            if seen.insert(name.clone(), ()).is_some() {
                return Err(Error::DuplicateName(name));
            }
            width += ty.width();
            declared.push(StructField { name, ty });
        }
        Ok(Type::new(width, TypeKind::Struct(declared)))
    }

    /// A fixed-length, homogeneous array of `length` copies of `elem`.
    /// `length` must be nonzero.
    pub fn array(elem: Type, length: u64) -> Result<Type> {
        if length == 0 {
            return Err(Error::InvalidWidth(
                "array type must have a nonzero length".to_string(),
            ));
        }
        let width = elem
            .width()
            .checked_mul(length)
            .ok_or_else(|| Error::InvalidWidth("array width overflows".to_string()))?;
        Ok(Type::new(
            width,
            TypeKind::Array {
                elem: Box::new(elem),
                length,
            },
        ))
    }

    /// Instantiate a previously-[registered](Registry::register) custom type
    /// by name. The registry is only consulted here, at construction time:
    /// the resulting `Type` is self-contained and does not keep the
    /// registry alive.
    pub fn custom(registry: &Registry, name: &str) -> Result<Type> {
        let custom = registry
            .get(name)
            .ok_or_else(|| Error::InvalidType(format!("no custom type registered as `{name}`")))?;
        Ok(Type::new(custom.width, TypeKind::Custom(custom)))
    }
}

fn check_width(width: u64) -> Result<()> {
    if width == 0 {
        Err(Error::InvalidWidth(
            "type width must be nonzero".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// A forward (`label -> code`) and reverse (`code -> label`) mapping
/// attached to an unsigned integer [`Type`]. Both directions must be total
/// inverses on their supports: no two labels may share a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTable {
    forward: HashMap<String, u128>,
    reverse: HashMap<u128, String>,
}

impl EnumTable {
    /// Build an enum table from `(label, code)` pairs. Fails with
    /// [`Error::InvalidType`] if a label or a code repeats.
    pub fn new(entries: impl IntoIterator<Item = (impl Into<String>, u128)>) -> Result<EnumTable> {
        let mut forward = HashMap::new();
        let mut reverse = HashMap::new();
        for (label, code) in entries {
            let label = label.into();
            if forward.insert(label.clone(), code).is_some() {
                return Err(Error::InvalidType(format!(
                    "duplicate enum label `{label}`"
                )));
            }
            if let Some(previous) = reverse.insert(code, label.clone()) {
                return Err(Error::InvalidType(format!(
                    "enum code {code} is shared by `{previous}` and `{label}`"
                )));
            }
        }
        Ok(EnumTable { forward, reverse })
    }

    /// Look up the code for a label, if declared.
    pub fn code_for_label(&self, label: &str) -> Option<u128> {
        self.forward.get(label).copied()
    }

    /// Look up the label for a code, if declared.
    pub fn label_for_code(&self, code: u128) -> Option<&str> {
        self.reverse.get(&code).map(String::as_str)
    }

    /// Iterate over the table's `(label, code)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u128)> {
        self.forward.iter().map(|(label, &code)| (label.as_str(), code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_rejects_zero_width() {
        assert_eq!(
            Type::uint(0),
            Err(Error::InvalidWidth("type width must be nonzero".to_string()))
        );
    }

    #[test]
    fn struct_rejects_duplicate_and_reserved_names() {
        let dup = Type::struct_(vec![("a", Type::uint(1).unwrap()), ("a", Type::uint(1).unwrap())]);
        assert!(matches!(dup, Err(Error::DuplicateName(_))));

        let reserved = Type::struct_(vec![("raw_", Type::uint(1).unwrap())]);
        assert!(matches!(reserved, Err(Error::ReservedName(_))));
    }

    #[test]
    fn struct_width_is_sum_of_fields() {
        let t = Type::struct_(vec![
            ("a", Type::uint(5).unwrap()),
            ("b", Type::uint(13).unwrap()),
        ])
        .unwrap();
        assert_eq!(t.width(), 18);
    }

    #[test]
    fn array_width_is_length_times_elem() {
        let t = Type::array(Type::uint(6).unwrap(), 4).unwrap();
        assert_eq!(t.width(), 24);
    }

    #[test]
    fn array_rejects_zero_length() {
        assert!(matches!(
            Type::array(Type::uint(1).unwrap(), 0),
            Err(Error::InvalidWidth(_))
        ));
    }

    #[test]
    fn enum_table_rejects_duplicate_label_or_code() {
        assert!(EnumTable::new(vec![("a", 0u128), ("a", 1u128)]).is_err());
        assert!(EnumTable::new(vec![("a", 0u128), ("b", 0u128)]).is_err());
    }

    #[test]
    fn enum_type_rejects_out_of_range_code() {
        let table = EnumTable::new(vec![("dead", 0u128), ("big", 4u128)]).unwrap();
        assert!(matches!(
            Type::uint_enum(2, table),
            Err(Error::InvalidType(_))
        ));
    }
}
