//! Bound field views: a navigable handle onto a field tree that is actually
//! bound to data, through a shared mutable raw cell.
//!
//! A [`BoundView`] is cheap to clone and cheap to derive children from:
//! every view (the root and all of its descendants) shares one
//! `Rc<RefCell<Raw>>`, so a write made through a child view is immediately
//! visible through a sibling view over the same underlying raw integer, and
//! through the view it was derived from. This is a single-threaded sharing
//! model by design: [`Raw`]'s canonical carrier, [`Rc`], is neither `Send`
//! nor `Sync`, matching the fact that nothing here needs to cross a thread.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value as Json;

use crate::codec;
use crate::error::Result;
use crate::raw::Raw;
use crate::tree::{parse_path, FieldNode, Selector, Tree};
use crate::value::{json_to_value, value_to_json, Value};

/// A view onto one field of an interface, bound to a shared raw cell.
///
/// Cloning a `BoundView` is cheap and produces an independent handle to the
/// *same* field of the *same* underlying data. It does not copy the data.
#[derive(Debug, Clone)]
pub struct BoundView {
    tree: Rc<Tree>,
    path: Vec<Selector>,
    cell: Rc<RefCell<Raw>>,
}

impl BoundView {
    /// A view onto the root of `tree`, bound to `raw`.
    pub fn new(tree: Rc<Tree>, raw: Raw) -> BoundView {
        BoundView {
            tree,
            path: Vec::new(),
            cell: Rc::new(RefCell::new(raw)),
        }
    }

    fn node(&self) -> &FieldNode {
        self.tree
            .resolve(&self.path)
            .expect("BoundView path always resolves against its own tree")
    }

    fn child(&self, selector: Selector) -> Option<BoundView> {
        self.node().select(&selector)?;
        let mut path = self.path.clone();
        path.push(selector);
        Some(BoundView {
            tree: self.tree.clone(),
            path,
            cell: self.cell.clone(),
        })
    }

    /// Navigate to a named struct child.
    pub fn field(&self, name: &str) -> Option<BoundView> {
        self.child(Selector::Name(name.to_string()))
    }

    /// Navigate to an indexed array (or struct) child.
    pub fn index(&self, i: usize) -> Option<BoundView> {
        self.child(Selector::Index(i))
    }

    /// Navigate a dotted/bracketed path such as `"parrot.rgb[2]"` from this view.
    pub fn get(&self, path: &str) -> Option<BoundView> {
        let mut view = self.clone();
        for selector in parse_path(path) {
            view = view.child(selector)?;
        }
        Some(view)
    }

    /// This field's absolute bit offset within the interface.
    pub fn offset(&self) -> u64 {
        self.node().offset()
    }

    /// This field's width in bits.
    pub fn size(&self) -> u64 {
        self.node().width()
    }

    /// The raw bit window this field occupies, as a plain unsigned integer
    /// (e.g. for an enum leaf this is the numeric code, ignoring its label).
    pub fn raw(&self) -> Raw {
        crate::raw::shift_and(&self.cell.borrow(), self.node().offset(), self.node().width())
    }

    /// Overwrite this field's raw bit window directly. Fails with
    /// [`crate::error::Error::Overflow`] (and leaves the cell untouched) if
    /// `new_raw` does not fit in the field's width.
    pub fn set_raw(&self, new_raw: Raw) -> Result<()> {
        let node = self.node();
        if new_raw >= crate::raw::capacity(node.width()) {
            return Err(crate::error::Error::Overflow {
                width: node.width() as u32,
                detail: format!("raw value {new_raw} does not fit in {} bits", node.width()),
            });
        }
        let updated = crate::raw::set_window(&self.cell.borrow(), node.offset(), node.width(), &new_raw);
        *self.cell.borrow_mut() = updated;
        Ok(())
    }

    /// Decode this field's structured value.
    pub fn value(&self) -> Result<Value> {
        codec::decode(self.node(), &self.cell.borrow())
    }

    /// Encode and write `value` into this field. The whole interface's raw
    /// integer is recomputed before anything is committed, so a failed write
    /// (e.g. from [`crate::error::Error::Overflow`] on a nested leaf) leaves
    /// the cell exactly as it was.
    pub fn set_value(&self, value: &Value) -> Result<()> {
        let updated = codec::encode(self.node(), value, &self.cell.borrow())?;
        *self.cell.borrow_mut() = updated;
        Ok(())
    }

    /// This field's value in its JSON wire form.
    pub fn json(&self) -> Result<Json> {
        value_to_json(self.node().ty(), &self.value()?)
    }

    /// Parse and write `json` into this field.
    pub fn set_json(&self, json: &Json) -> Result<()> {
        let value = json_to_value(self.node().ty(), json)?;
        self.set_value(&value)
    }
}

impl PartialEq<&str> for BoundView {
    /// Compares equal if this field is an enum whose current code has `rhs`
    /// as its label, or a UTF-8 field whose current string equals `rhs`.
    /// Any decode failure, or a field of another kind, compares unequal
    /// rather than panicking: this operator is for convenient one-line
    /// guards, not strict schema validation.
    fn eq(&self, rhs: &&str) -> bool {
        match self.value() {
            Ok(Value::Enum { label: Some(label), .. }) => label == *rhs,
            Ok(Value::Str(s)) => s == *rhs,
            _ => false,
        }
    }
}

impl PartialEq<u128> for BoundView {
    /// Compares equal if this field's raw window, read as an unsigned
    /// integer, equals `rhs` (for an enum leaf this compares the code, not
    /// the label, matching [`BoundView::raw`]'s semantics).
    fn eq(&self, rhs: &u128) -> bool {
        use num_traits::ToPrimitive;
        self.raw().to_u128() == Some(*rhs)
    }
}
