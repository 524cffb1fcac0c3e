//! The extension registry: a caller-owned table of user-registered leaf
//! types, each supplying its own `(width, encode, decode, jsonify)`
//! quadruple.
//!
//! This is deliberately a plain value (`Registry::new()`), not a process-wide
//! singleton, so that custom types stay testable in isolation: two callers
//! in the same process can register a type named `"ip4"` with completely
//! different behavior and never interfere with each other.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use serde_json::Value as Json;

use crate::error::{Error, Result};

/// A registered custom leaf type's codec. `encode`/`decode` convert between
/// the raw window and a "native" JSON value; `jsonify` additionally maps
/// that native value to the value actually emitted as a leaf's `json()`
/// form (by default these coincide, but a registrant may want the wire
/// representation to differ from the value `value()` hands back, e.g. to
/// rename keys or elide internal fields).
pub struct CustomType {
    /// The name this type was registered under.
    pub name: String,
    /// The fixed bit width of this type. `encode`/`decode` must agree with
    /// this width or [`Error::InvalidType`] is raised.
    pub width: u64,
    /// Converts a native value to the raw window it should occupy.
    pub encode: Arc<dyn Fn(&Json) -> Result<BigUint> + Send + Sync>,
    /// Converts a raw window back to a native value.
    pub decode: Arc<dyn Fn(&BigUint) -> Result<Json> + Send + Sync>,
    /// Converts a native value to its wire JSON form.
    pub jsonify: Arc<dyn Fn(&Json) -> Result<Json> + Send + Sync>,
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomType {
    /// Custom types compare equal by name and width: the encode/decode/
    /// jsonify closures carry no identity of their own (and two equivalent
    /// registrations in different `Registry` values should be
    /// interchangeable).
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.width == other.width
    }
}

/// A caller-owned table of registered custom leaf types. See the
/// [module docs](self) for why this isn't a global singleton.
#[derive(Clone, Default)]
pub struct Registry {
    types: HashMap<String, Arc<CustomType>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Register a new custom leaf type under `name`. `width` must be
    /// nonzero; `encode`/`decode` are responsible for honoring it (a custom
    /// type that reads or writes a different number of bits than it
    /// declares violates the fundamental round-trip law).
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        name: impl Into<String>,
        width: u64,
        encode: impl Fn(&Json) -> Result<BigUint> + Send + Sync + 'static,
        decode: impl Fn(&BigUint) -> Result<Json> + Send + Sync + 'static,
        jsonify: impl Fn(&Json) -> Result<Json> + Send + Sync + 'static,
    ) -> Result<()> {
        let name = name.into();
        if width == 0 {
            return Err(Error::InvalidWidth(format!(
                "custom type `{name}` must have a nonzero width"
            )));
        }
        self.types.insert(
            name.clone(),
            Arc::new(CustomType {
                name,
                width,
                encode: Arc::new(encode),
                decode: Arc::new(decode),
                jsonify: Arc::new(jsonify),
            }),
        );
        Ok(())
    }

    /// Look up a previously-registered custom type by name.
    pub fn get(&self, name: &str) -> Option<Arc<CustomType>> {
        self.types.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_and_instantiate() {
        let mut registry = Registry::new();
        registry
            .register(
                "half_u8",
                4,
                |j: &Json| Ok(BigUint::from(j.as_u64().unwrap_or(0) as u32)),
                |raw: &BigUint| Ok(json!(raw.to_string())),
                |native: &Json| Ok(native.clone()),
            )
            .unwrap();
        assert!(registry.get("half_u8").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn register_rejects_zero_width() {
        let mut registry = Registry::new();
        let result = registry.register(
            "bad",
            0,
            |_: &Json| Ok(BigUint::from(0u32)),
            |_: &BigUint| Ok(json!(null)),
            |v: &Json| Ok(v.clone()),
        );
        assert!(matches!(result, Err(Error::InvalidWidth(_))));
    }
}
