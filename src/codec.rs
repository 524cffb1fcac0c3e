//! The codec kernel: projects a raw integer to and from a structured
//! [`Value`] tree. Every leaf read reduces to `(raw >> offset) & mask`; every
//! leaf write computes a fully validated replacement for the raw integer
//! before ever touching the caller's cell, so a failed write never leaves
//! the cell half-updated.

use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive, Zero};
use serde_json::Value as Json;

use crate::error::{Error, Result};
use crate::raw::{self, Raw};
use crate::tree::FieldNode;
use crate::types::TypeKind;
use crate::value::Value;

/// Decode the value of `node` out of the full interface `raw` integer.
pub fn decode(node: &FieldNode, raw: &Raw) -> Result<Value> {
    match node.kind() {
        TypeKind::UInt => Ok(Value::UInt(raw::shift_and(raw, node.offset(), node.width()))),
        TypeKind::SInt => Ok(Value::SInt(decode_signed(raw, node.offset(), node.width()))),
        TypeKind::Enum(table) => {
            let window = raw::shift_and(raw, node.offset(), node.width());
            let code = window.to_u128().unwrap_or(u128::MAX);
            let label = table.label_for_code(code).map(str::to_string);
            Ok(Value::Enum { code, label })
        }
        TypeKind::Struct(fields) => {
            let mut pairs = Vec::with_capacity(fields.len());
            for field in fields {
                let child = node.child(&field.name).expect("struct child must exist");
                pairs.push((field.name.clone(), decode(child, raw)?));
            }
            Ok(Value::Struct(pairs))
        }
        TypeKind::Array { length, .. } => {
            let mut items = Vec::with_capacity(*length as usize);
            for k in 0..*length as usize {
                let child = node.child_at(k).expect("array child must exist");
                items.push(decode(child, raw)?);
            }
            Ok(Value::Array(items))
        }
        TypeKind::Utf8 { byte_len } => Ok(Value::Str(decode_utf8(raw, node.offset(), *byte_len)?)),
        TypeKind::Custom(custom) => {
            let window = raw::shift_and(raw, node.offset(), node.width());
            Ok(Value::Custom((custom.decode)(&window)?))
        }
    }
}

/// Compute the new full interface raw integer that results from writing
/// `value` at `node`, without mutating `raw`. Callers commit the result
/// themselves; this makes every write transactional at the leaf-value
/// level, per the spec's failure semantics.
pub fn encode(node: &FieldNode, value: &Value, raw: &Raw) -> Result<Raw> {
    match (node.kind(), value) {
        (TypeKind::UInt, Value::UInt(n)) => write_leaf(node, n, raw),
        (TypeKind::SInt, Value::SInt(n)) => {
            let window = encode_signed(n, node.width())?;
            write_leaf(node, &window, raw)
        }
        (TypeKind::Enum(_), Value::Enum { code, .. }) => {
            write_leaf(node, &BigUint::from(*code), raw)
        }
        (TypeKind::Struct(fields), Value::Struct(pairs)) => {
            let mut cursor = raw.clone();
            for field in fields {
                let (_, v) = pairs
                    .iter()
                    .find(|(name, _)| name == &field.name)
                    .ok_or_else(|| Error::SchemaMismatch(format!("missing field `{}`", field.name)))?;
                let child = node.child(&field.name).expect("struct child must exist");
                cursor = encode(child, v, &cursor)?;
            }
            Ok(cursor)
        }
        (TypeKind::Array { length, .. }, Value::Array(items)) => {
            if items.len() as u64 != *length {
                return Err(Error::SchemaMismatch(format!(
                    "expected {length} array elements, got {}",
                    items.len()
                )));
            }
            let mut cursor = raw.clone();
            for (k, item) in items.iter().enumerate() {
                let child = node.child_at(k).expect("array child must exist");
                cursor = encode(child, item, &cursor)?;
            }
            Ok(cursor)
        }
        (TypeKind::Utf8 { byte_len }, Value::Str(s)) => encode_utf8(node, s, *byte_len, raw),
        (TypeKind::Custom(custom), Value::Custom(native)) => {
            let window = (custom.encode)(native)?;
            if window >= raw::capacity(node.width()) {
                return Err(Error::Overflow {
                    width: node.width() as u32,
                    detail: format!("custom type `{}` encoded a value too wide for its field", custom.name),
                });
            }
            write_leaf(node, &window, raw)
        }
        _ => Err(Error::InvalidType(
            "value does not match the shape of its field's type".to_string(),
        )),
    }
}

fn write_leaf(node: &FieldNode, new_value: &BigUint, raw: &Raw) -> Result<Raw> {
    if *new_value >= raw::capacity(node.width()) {
        return Err(Error::Overflow {
            width: node.width() as u32,
            detail: format!("value {new_value} does not fit in {} bits", node.width()),
        });
    }
    Ok(raw::set_window(raw, node.offset(), node.width(), new_value))
}

fn decode_signed(raw: &Raw, offset: u64, width: u64) -> BigInt {
    let window = raw::shift_and(raw, offset, width);
    let sign_bit = BigUint::from(1u32) << (width - 1) as usize;
    if window >= sign_bit {
        BigInt::from(window) - BigInt::from(raw::capacity(width))
    } else {
        BigInt::from(window)
    }
}

fn encode_signed(value: &BigInt, width: u64) -> Result<BigUint> {
    let capacity = BigInt::from(raw::capacity(width));
    let half = &capacity / 2;
    if *value < -&half || *value >= half {
        return Err(Error::Overflow {
            width: width as u32,
            detail: format!("signed value {value} does not fit in {width} bits"),
        });
    }
    let unsigned = if value.is_negative() {
        value + &capacity
    } else {
        value.clone()
    };
    Ok(unsigned.to_biguint().expect("normalized to be non-negative"))
}

/// Decode a UTF-8 window: `byte_len` bytes, big-endian (byte 0 at the
/// highest byte position), with the unused low-order bytes zero-padded when
/// the string is shorter than the window.
fn decode_utf8(raw: &Raw, offset: u64, byte_len: u64) -> Result<String> {
    let bytes = window_to_be_bytes(raw, offset, byte_len);
    let trimmed_len = bytes.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0);
    std::str::from_utf8(&bytes[..trimmed_len])
        .map(str::to_string)
        .map_err(|e| Error::InvalidEncoding(e.to_string()))
}

fn encode_utf8(node: &FieldNode, s: &str, byte_len: u64, raw: &Raw) -> Result<Raw> {
    let bytes = s.as_bytes();
    if bytes.len() as u64 > byte_len {
        return Err(Error::Overflow {
            width: node.width() as u32,
            detail: format!(
                "string of {} bytes does not fit in a {byte_len}-byte field",
                bytes.len()
            ),
        });
    }
    let mut window = BigUint::zero();
    for (i, &b) in bytes.iter().enumerate() {
        let shift = (byte_len as usize - 1 - i) * 8;
        window += BigUint::from(b) << shift;
    }
    write_leaf(node, &window, raw)
}

fn window_to_be_bytes(raw: &Raw, offset: u64, byte_len: u64) -> Vec<u8> {
    let window = raw::shift_and(raw, offset, byte_len * 8);
    let mut bytes = window.to_bytes_be();
    while (bytes.len() as u64) < byte_len {
        bytes.insert(0, 0);
    }
    bytes
}
