//! The field tree: a named, offset-annotated instantiation of a [`Type`].
//!
//! Building a [`Tree`] walks a `Type` pre-order and fixes every node's
//! absolute bit offset (measured from interface bit 0) once and for all.
//! The tree is built once per interface and is immutable thereafter; it is
//! the single source of truth that both [`crate::view::BoundView`] and
//! [`crate::expr`] navigate.

use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{Type, TypeKind};

/// A single node of a field tree: a name, a shared [`Type`], and the
/// absolute bit offset and width that type occupies within its interface.
#[derive(Debug)]
pub struct FieldNode {
    name: String,
    ty: Type,
    offset: u64,
    children: Children,
}

#[derive(Debug)]
enum Children {
    Leaf,
    Struct {
        nodes: Vec<FieldNode>,
        index_of: HashMap<String, usize>,
    },
    Array(Vec<FieldNode>),
}

impl FieldNode {
    fn build(name: String, ty: Type, offset: u64) -> FieldNode {
        let children = match ty.kind() {
            TypeKind::Struct(fields) => {
                let mut nodes = Vec::with_capacity(fields.len());
                let mut index_of = HashMap::with_capacity(fields.len());
                let mut cursor = offset;
                for field in fields {
                    index_of.insert(field.name.clone(), nodes.len());
                    nodes.push(FieldNode::build(field.name.clone(), field.ty.clone(), cursor));
                    cursor += field.ty.width();
                }
                Children::Struct { nodes, index_of }
            }
            TypeKind::Array { elem, length } => {
                let mut nodes = Vec::with_capacity(*length as usize);
                for k in 0..*length {
                    let child_offset = offset + k * elem.width();
                    nodes.push(FieldNode::build(format!("[{k}]"), (**elem).clone(), child_offset));
                }
                Children::Array(nodes)
            }
            _ => Children::Leaf,
        };
        FieldNode { name, ty, offset, children }
    }

    /// This node's own field name (empty for the interface root).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This node's type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// This node's kind, shorthand for `self.ty().kind()`.
    pub fn kind(&self) -> &TypeKind {
        self.ty.kind()
    }

    /// This node's absolute bit offset, measured from interface bit 0.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// This node's width in bits, shorthand for `self.ty().width()`.
    pub fn width(&self) -> u64 {
        self.ty.width()
    }

    /// Look up a struct child by name in O(1).
    pub fn child(&self, name: &str) -> Option<&FieldNode> {
        match &self.children {
            Children::Struct { nodes, index_of } => index_of.get(name).map(|&i| &nodes[i]),
            _ => None,
        }
    }

    /// Look up an array child by index.
    pub fn child_at(&self, index: usize) -> Option<&FieldNode> {
        match &self.children {
            Children::Array(nodes) => nodes.get(index),
            Children::Struct { nodes, .. } => nodes.get(index),
            Children::Leaf => None,
        }
    }

    /// The declared children of a struct or array node, in order. Empty for leaves.
    pub fn children(&self) -> &[FieldNode] {
        match &self.children {
            Children::Struct { nodes, .. } => nodes,
            Children::Array(nodes) => nodes,
            Children::Leaf => &[],
        }
    }

    /// Navigate a dotted/bracketed path such as `"a.b[3].c"` from this node.
    pub fn get(&self, path: &str) -> Option<&FieldNode> {
        let mut node = self;
        for selector in parse_path(path) {
            node = node.select(&selector)?;
        }
        Some(node)
    }
}

/// Parse a dotted/bracketed path such as `"a.b[3].c"` into the sequence of
/// [`Selector`]s that navigate it from a tree's root. Shared by
/// [`crate::view::BoundView::get`] and [`FieldNode::get`].
pub fn parse_path(path: &str) -> Vec<Selector> {
    let mut selectors = Vec::new();
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        let (name, indices) = parse_segment(segment);
        if !name.is_empty() {
            selectors.push(Selector::Name(name.to_string()));
        }
        for index in indices {
            selectors.push(Selector::Index(index));
        }
    }
    selectors
}

/// Split `"foo[1][2]"` into `("foo", [1, 2])`; `"[1]"` into `("", [1])`.
fn parse_segment(segment: &str) -> (&str, Vec<usize>) {
    let bracket = segment.find('[');
    let (name, rest) = match bracket {
        Some(pos) => segment.split_at(pos),
        None => (segment, ""),
    };
    let indices = rest
        .split('[')
        .filter_map(|chunk| chunk.strip_suffix(']'))
        .filter_map(|n| n.parse::<usize>().ok())
        .collect();
    (name, indices)
}

/// A field tree: the root [`FieldNode`] of an interface, with offset 0 and
/// the full width of its [`Type`].
#[derive(Debug)]
pub struct Tree {
    root: FieldNode,
}

impl Tree {
    /// Build a field tree out of `ty`, fixing every descendant's absolute offset.
    pub fn new(ty: Type) -> Rc<Tree> {
        Rc::new(Tree {
            root: FieldNode::build(String::new(), ty, 0),
        })
    }

    /// The tree's root node.
    pub fn root(&self) -> &FieldNode {
        &self.root
    }

    /// Navigate from the root through a sequence of [`Selector`]s.
    pub fn resolve(&self, path: &[Selector]) -> Option<&FieldNode> {
        let mut node = &self.root;
        for selector in path {
            node = node.select(selector)?;
        }
        Some(node)
    }
}

/// One step of navigation into a field tree: a named struct child or an
/// indexed array child. [`crate::view::BoundView`] and
/// [`crate::expr::SymbolicField`] both replay a `Vec<Selector>` against a
/// shared [`Tree`] rather than holding direct node references, so that many
/// views can cheaply share one tree without borrow-checker friction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Select a struct child by name.
    Name(String),
    /// Select an array (or struct) child by index.
    Index(usize),
}

impl FieldNode {
    /// Apply a single [`Selector`] to this node.
    pub fn select(&self, selector: &Selector) -> Option<&FieldNode> {
        match selector {
            Selector::Name(name) => self.child(name),
            Selector::Index(index) => self.child_at(*index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn struct_children_are_contiguous() {
        let ty = Type::struct_(vec![
            ("lo", Type::uint(7).unwrap()),
            ("mid", Type::uint(7).unwrap()),
            ("hi", Type::uint(7).unwrap()),
        ])
        .unwrap();
        let tree = Tree::new(ty);
        let root = tree.root();
        assert_eq!(root.width(), 21);
        assert_eq!(root.child("lo").unwrap().offset(), 0);
        assert_eq!(root.child("mid").unwrap().offset(), 7);
        assert_eq!(root.child("hi").unwrap().offset(), 14);
    }

    #[test]
    fn array_children_are_spaced_by_elem_width() {
        let ty = Type::array(Type::uint(6).unwrap(), 4).unwrap();
        let tree = Tree::new(ty);
        let root = tree.root();
        assert_eq!(root.child_at(0).unwrap().offset(), 0);
        assert_eq!(root.child_at(1).unwrap().offset(), 6);
        assert_eq!(root.child_at(2).unwrap().offset(), 12);
        assert_eq!(root.child_at(3).unwrap().offset(), 18);
    }

    #[test]
    fn nested_path_lookup() {
        let page = Type::array(Type::uint(6).unwrap(), 4).unwrap();
        let foo = Type::struct_(vec![("hdr", Type::uint(5).unwrap()), ("page", page)]).unwrap();
        let tree = Tree::new(foo);
        let node = tree.root().get("page[2]").unwrap();
        assert_eq!(node.offset(), 5 + 2 * 6);
    }
}
