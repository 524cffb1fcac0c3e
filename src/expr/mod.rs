//! The expression engine: lifts navigation and comparison over field
//! references into a pure [`Expr`] tree, which [`lower`] reduces to a
//! shift-and-mask [`Ir`] form, which [`render`] serializes to a portable
//! source string.
//!
//! The three stages form a one-way state machine, `Symbolic -> Lowered ->
//! Rendered`, but rather than model that as an explicit state enum this
//! crate models it the way a pure, mutation-free pipeline naturally looks in
//! Rust: three owned types (`Expr`, `Ir`, `String`) connected by two pure
//! functions.

mod ir;
mod render;

pub use ir::{lower, BinOp, Ir, UnOp};
pub use render::render;

use std::rc::Rc;

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::tree::{FieldNode, Selector, Tree};
use crate::types::TypeKind;

/// A symbolic expression over field references and constants. Built lazily
/// from operations on [`SymbolicField`]s; immutable once built.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A reference to a field, fully resolved to its tree node.
    Ref(SymbolicField),
    /// An integer or string literal.
    Const(Const),
    /// A binary operator applied to two subexpressions.
    Binop(BinOp, Box<Expr>, Box<Expr>),
    /// A unary operator applied to a subexpression.
    Unop(UnOp, Box<Expr>),
    /// Index access into an as-yet-unresolved base expression. In practice
    /// [`SymbolicField::index`] resolves this immediately against a live
    /// tree, so this variant is only reachable if an `Expr` is assembled by
    /// hand from a non-`Ref` base; [`lower`] reports that case as
    /// [`Error::InvalidType`].
    Index(Box<Expr>, usize),
    /// Member access into an as-yet-unresolved base expression. See
    /// [`Expr::Index`] for why this is rarely constructed directly.
    Member(Box<Expr>, String),
}

/// A literal embedded in an [`Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    /// An integer literal.
    Int(BigInt),
    /// A string literal, only meaningful when compared against an enum
    /// leaf, where it is resolved to the label's code at build time.
    Str(String),
}

impl From<i64> for Expr {
    fn from(v: i64) -> Expr {
        Expr::Const(Const::Int(BigInt::from(v)))
    }
}
impl From<BigInt> for Expr {
    fn from(v: BigInt) -> Expr {
        Expr::Const(Const::Int(v))
    }
}
impl From<&str> for Expr {
    fn from(v: &str) -> Expr {
        Expr::Const(Const::Str(v.to_string()))
    }
}
impl From<String> for Expr {
    fn from(v: String) -> Expr {
        Expr::Const(Const::Str(v))
    }
}

macro_rules! arith_op {
    ($trait:ident, $method:ident, $op:ident) => {
        impl<R: Into<Expr>> std::ops::$trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::Binop(BinOp::$op, Box::new(self), Box::new(rhs.into()))
            }
        }
    };
}
arith_op!(Add, add, Add);
arith_op!(Sub, sub, Sub);
arith_op!(Mul, mul, Mul);
arith_op!(Div, div, Div);
arith_op!(Rem, rem, Mod);
arith_op!(BitAnd, bitand, And);
arith_op!(BitOr, bitor, Or);
arith_op!(BitXor, bitxor, Xor);
arith_op!(Shl, shl, Shl);
arith_op!(Shr, shr, Shr);

impl std::ops::Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        Expr::Unop(UnOp::LogicalNot, Box::new(self))
    }
}

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Unop(UnOp::Neg, Box::new(self))
    }
}

impl Expr {
    /// Bitwise complement (`~self`). Rust has no `~` operator trait, so this
    /// is a named method rather than an operator overload.
    pub fn bit_not(self) -> Expr {
        Expr::Unop(UnOp::BitNot, Box::new(self))
    }

    /// `self == rhs`. Rust's `==` must return `bool`, so comparisons that
    /// build an `Expr` are named methods instead of `PartialEq`. If `self`
    /// is a reference to an enum leaf and `rhs` is a string constant, the
    /// label is resolved to its code right here, at build time: an unknown
    /// label fails immediately with [`Error::UnknownLabel`] rather than
    /// producing an expression that would fail later, at evaluation.
    pub fn eq(self, rhs: impl Into<Expr>) -> Result<Expr> {
        self.comparison(BinOp::Eq, rhs)
    }
    /// `self != rhs`. See [`Expr::eq`].
    pub fn ne(self, rhs: impl Into<Expr>) -> Result<Expr> {
        self.comparison(BinOp::Ne, rhs)
    }
    /// `self < rhs`.
    pub fn lt(self, rhs: impl Into<Expr>) -> Result<Expr> {
        self.comparison(BinOp::Lt, rhs)
    }
    /// `self <= rhs`.
    pub fn le(self, rhs: impl Into<Expr>) -> Result<Expr> {
        self.comparison(BinOp::Le, rhs)
    }
    /// `self > rhs`.
    pub fn gt(self, rhs: impl Into<Expr>) -> Result<Expr> {
        self.comparison(BinOp::Gt, rhs)
    }
    /// `self >= rhs`.
    pub fn ge(self, rhs: impl Into<Expr>) -> Result<Expr> {
        self.comparison(BinOp::Ge, rhs)
    }

    fn comparison(self, op: BinOp, rhs: impl Into<Expr>) -> Result<Expr> {
        let rhs = resolve_label_const(&self, rhs.into())?;
        Ok(Expr::Binop(op, Box::new(self), Box::new(rhs)))
    }

    /// Refine this expression by a struct member name. Only meaningful when
    /// `self` is [`Expr::Ref`] pointing at a struct; see
    /// [`SymbolicField::field`] for the version used in practice.
    pub fn member(self, name: impl Into<String>) -> Expr {
        let name = name.into();
        if let Expr::Ref(field) = &self {
            if let Some(child) = field.field(&name) {
                return Expr::Ref(child);
            }
        }
        Expr::Member(Box::new(self), name)
    }

    /// Refine this expression by an array index. Only meaningful when
    /// `self` is [`Expr::Ref`] pointing at an array; see
    /// [`SymbolicField::index`] for the version used in practice.
    pub fn index(self, i: usize) -> Expr {
        if let Expr::Ref(field) = &self {
            if let Some(child) = field.index(i) {
                return Expr::Ref(child);
            }
        }
        Expr::Index(Box::new(self), i)
    }
}

/// If `lhs` is a reference to an enum leaf and `rhs` is a string constant,
/// resolve the label to its code eagerly. Otherwise `rhs` passes through
/// unchanged.
fn resolve_label_const(lhs: &Expr, rhs: Expr) -> Result<Expr> {
    if let (Expr::Ref(field), Expr::Const(Const::Str(label))) = (lhs, &rhs) {
        if let TypeKind::Enum(table) = field.node().kind() {
            let code = table
                .code_for_label(label)
                .ok_or_else(|| Error::UnknownLabel(label.clone()))?;
            return Ok(Expr::Const(Const::Int(BigInt::from(code))));
        }
    }
    Ok(rhs)
}

/// A symbolic handle to a field: a live reference into a [`Tree`] that has
/// not (necessarily) been bound to any raw data. Building one never fails;
/// navigating through it (`field`/`index`) simply returns `None` for a path
/// that doesn't exist, exactly like [`crate::view::BoundView`].
#[derive(Debug, Clone)]
pub struct SymbolicField {
    tree: Rc<Tree>,
    path: Vec<Selector>,
}

impl SymbolicField {
    /// A symbolic handle to the root of `tree`.
    pub fn new(tree: Rc<Tree>) -> SymbolicField {
        SymbolicField { tree, path: Vec::new() }
    }

    /// This field's underlying tree node.
    pub fn node(&self) -> &FieldNode {
        self.tree
            .resolve(&self.path)
            .expect("SymbolicField path always resolves against its own tree")
    }

    /// Navigate to a named struct child.
    pub fn field(&self, name: &str) -> Option<SymbolicField> {
        self.node().child(name)?;
        let mut path = self.path.clone();
        path.push(Selector::Name(name.to_string()));
        Some(SymbolicField { tree: self.tree.clone(), path })
    }

    /// Navigate to an indexed array (or struct) child.
    pub fn index(&self, i: usize) -> Option<SymbolicField> {
        self.node().child_at(i)?;
        let mut path = self.path.clone();
        path.push(Selector::Index(i));
        Some(SymbolicField { tree: self.tree.clone(), path })
    }

    /// Navigate a dotted/bracketed path such as `"parrot.rgb[2]"` from this field.
    pub fn get(&self, path: &str) -> Option<SymbolicField> {
        let mut field = self.clone();
        for selector in crate::tree::parse_path(path) {
            field = match selector {
                crate::tree::Selector::Name(name) => field.field(&name)?,
                crate::tree::Selector::Index(i) => field.index(i)?,
            };
        }
        Some(field)
    }

    /// Lift this field into an [`Expr::Ref`].
    pub fn expr(&self) -> Expr {
        Expr::Ref(self.clone())
    }
}

impl From<SymbolicField> for Expr {
    fn from(field: SymbolicField) -> Expr {
        Expr::Ref(field)
    }
}
