//! The decoded structured value tree, and its mapping to and from JSON.
//!
//! [`Value`] is what a [`crate::view::BoundView::value`] read returns and a
//! [`crate::view::BoundView::set_value`] write consumes. It mirrors the
//! shape of a [`crate::types::Type`] one-to-one: a struct type decodes to
//! [`Value::Struct`], an array type to [`Value::Array`], and so on.

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use serde_json::{Map, Number, Value as Json};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{Type, TypeKind};

/// A decoded field value. Struct fields preserve declaration order (a
/// `Vec` of pairs, not a sorted map) so that JSON object keys round-trip in
/// the order they were declared.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An unsigned integer, as decoded from a [`TypeKind::UInt`] leaf.
    UInt(BigUint),
    /// A two's-complement signed integer, as decoded from a [`TypeKind::SInt`] leaf.
    SInt(BigInt),
    /// An enum leaf's code, with its label if the code is present in the
    /// enum's reverse map.
    Enum {
        /// The raw integer code.
        code: u128,
        /// The code's label, if it has one.
        label: Option<String>,
    },
    /// A struct's fields, in declaration order.
    Struct(Vec<(String, Value)>),
    /// An array's elements, in index order.
    Array(Vec<Value>),
    /// A UTF-8 string, as decoded from a [`TypeKind::Utf8`] leaf.
    Str(String),
    /// A custom leaf type's native value.
    Custom(Json),
}

/// Convert a decoded [`Value`] to its JSON wire form, per `ty`.
pub fn value_to_json(ty: &Type, value: &Value) -> Result<Json> {
    match (ty.kind(), value) {
        (TypeKind::UInt, Value::UInt(n)) => Ok(Json::Number(biguint_to_number(n))),
        (TypeKind::SInt, Value::SInt(n)) => Ok(Json::Number(bigint_to_number(n))),
        (TypeKind::Enum(table), Value::Enum { code, label }) => {
            let _ = table;
            match label {
                Some(label) => Ok(Json::String(label.clone())),
                None => Ok(Json::Number(Number::from(*code as u64))),
            }
        }
        (TypeKind::Struct(fields), Value::Struct(pairs)) => {
            let mut object = Map::new();
            for field in fields {
                let (_, v) = pairs
                    .iter()
                    .find(|(name, _)| name == &field.name)
                    .ok_or_else(|| {
                        Error::SchemaMismatch(format!("missing field `{}`", field.name))
                    })?;
                object.insert(field.name.clone(), value_to_json(&field.ty, v)?);
            }
            Ok(Json::Object(object))
        }
        (TypeKind::Array { elem, length }, Value::Array(items)) => {
            if items.len() as u64 != *length {
                return Err(Error::SchemaMismatch(format!(
                    "expected {length} array elements, got {}",
                    items.len()
                )));
            }
            Ok(Json::Array(
                items
                    .iter()
                    .map(|v| value_to_json(elem, v))
                    .collect::<Result<Vec<_>>>()?,
            ))
        }
        (TypeKind::Utf8 { .. }, Value::Str(s)) => Ok(Json::String(s.clone())),
        (TypeKind::Custom(custom), Value::Custom(native)) => (custom.jsonify)(native),
        _ => Err(Error::InvalidType(
            "value does not match the shape of its type".to_string(),
        )),
    }
}

/// Parse a JSON document into a [`Value`], per `ty`. Rejects unknown struct
/// keys and shape mismatches with [`Error::SchemaMismatch`].
pub fn json_to_value(ty: &Type, json: &Json) -> Result<Value> {
    match ty.kind() {
        TypeKind::UInt => {
            let n = json
                .as_str()
                .and_then(|s| BigUint::from_str(s).ok())
                .or_else(|| json.as_u64().map(BigUint::from))
                .or_else(|| match json {
                    Json::Number(num) => BigUint::from_str(&num.to_string()).ok(),
                    _ => None,
                })
                .ok_or_else(|| Error::SchemaMismatch("expected a non-negative integer".to_string()))?;
            Ok(Value::UInt(n))
        }
        TypeKind::SInt => {
            let n = json
                .as_str()
                .and_then(|s| BigInt::from_str(s).ok())
                .or_else(|| json.as_i64().map(BigInt::from))
                .or_else(|| match json {
                    Json::Number(num) => BigInt::from_str(&num.to_string()).ok(),
                    _ => None,
                })
                .ok_or_else(|| Error::SchemaMismatch("expected an integer".to_string()))?;
            Ok(Value::SInt(n))
        }
        TypeKind::Enum(table) => match json {
            Json::String(label) => {
                let code = table
                    .code_for_label(label)
                    .ok_or_else(|| Error::UnknownLabel(label.clone()))?;
                Ok(Value::Enum {
                    code,
                    label: Some(label.clone()),
                })
            }
            Json::Number(n) => {
                let code = n
                    .as_u64()
                    .map(|n| n as u128)
                    .ok_or_else(|| Error::SchemaMismatch("expected a non-negative code".to_string()))?;
                Ok(Value::Enum {
                    code,
                    label: table.label_for_code(code).map(str::to_string),
                })
            }
            _ => Err(Error::SchemaMismatch(
                "expected an enum label string or integer code".to_string(),
            )),
        },
        TypeKind::Struct(fields) => {
            let object = json
                .as_object()
                .ok_or_else(|| Error::SchemaMismatch("expected a JSON object".to_string()))?;
            let declared: std::collections::HashSet<&str> =
                fields.iter().map(|f| f.name.as_str()).collect();
            if let Some(unknown) = object.keys().find(|k| !declared.contains(k.as_str())) {
                return Err(Error::SchemaMismatch(format!("unknown key `{unknown}`")));
            }
            let mut pairs = Vec::with_capacity(fields.len());
            for field in fields {
                let member = object
                    .get(&field.name)
                    .ok_or_else(|| Error::SchemaMismatch(format!("missing field `{}`", field.name)))?;
                pairs.push((field.name.clone(), json_to_value(&field.ty, member)?));
            }
            Ok(Value::Struct(pairs))
        }
        TypeKind::Array { elem, length } => {
            let array = json
                .as_array()
                .ok_or_else(|| Error::SchemaMismatch("expected a JSON array".to_string()))?;
            if array.len() as u64 != *length {
                return Err(Error::SchemaMismatch(format!(
                    "expected {length} array elements, got {}",
                    array.len()
                )));
            }
            Ok(Value::Array(
                array
                    .iter()
                    .map(|v| json_to_value(elem, v))
                    .collect::<Result<Vec<_>>>()?,
            ))
        }
        TypeKind::Utf8 { .. } => {
            let s = json
                .as_str()
                .ok_or_else(|| Error::SchemaMismatch("expected a JSON string".to_string()))?;
            Ok(Value::Str(s.to_string()))
        }
        TypeKind::Custom(_) => Ok(Value::Custom(json.clone())),
    }
}

fn biguint_to_number(n: &BigUint) -> Number {
    n.to_u64()
        .map(Number::from)
        .unwrap_or_else(|| Number::from_str(&n.to_string()).expect("decimal digits always parse"))
}

fn bigint_to_number(n: &BigInt) -> Number {
    n.to_i64()
        .map(Number::from)
        .unwrap_or_else(|| Number::from_str(&n.to_string()).expect("decimal digits always parse"))
}
