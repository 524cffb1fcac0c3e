//! The shift-and-mask intermediate representation: what an [`super::Expr`]
//! tree reduces to once every field reference has been replaced by the
//! concrete shift/mask (and, for signed leaves, sign-extension) sequence
//! that reads it out of a raw window.

use num_bigint::{BigInt, BigUint};

use super::{Const, Expr};
use crate::error::{Error, Result};
use crate::raw::mask;
use crate::tree::FieldNode;
use crate::types::TypeKind;

/// A binary operator, shared between the symbolic [`Expr`] tree and the
/// lowered [`Ir`] tree. Lowering a `Binop` never changes its operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Bitwise complement, `~x`.
    BitNot,
    /// Logical negation, `!x`.
    LogicalNot,
}

/// The lowered form of an [`Expr`]: every [`Expr::Ref`] has been replaced by
/// the literal shift/mask sequence that reads its window out of a raw
/// variable, and every signed leaf is wrapped in [`Ir::SignExtend`].
///
/// Two raw-variable shapes are supported: a single unbounded variable named
/// `x` ([`Ir::Raw`]), used when `lower` is called with `word_width: None`;
/// or an indexed sequence of fixed-width words ([`Ir::Word`]), used when the
/// target interface reads the raw value out of a word array (e.g. a
/// `u32` register file) rather than one arbitrary-width integer. A field
/// that straddles a word boundary under the latter scheme cannot be lowered
/// and fails with [`Error::Overflow`].
#[derive(Debug, Clone, PartialEq)]
pub enum Ir {
    /// The whole raw value, rendered as the variable `x`.
    Raw,
    /// One fixed-width word of a block-indexed raw value, rendered as `x[i]`.
    Word(u64),
    /// An integer literal.
    Const(BigInt),
    /// `inner >> amount`.
    Shr(Box<Ir>, u64),
    /// `inner & mask`.
    And(Box<Ir>, BigUint),
    /// Two's-complement sign extension of a `width`-bit unsigned window,
    /// via the portable `(inner ^ sign_bit) - sign_bit` identity.
    SignExtend(Box<Ir>, u64),
    /// A binary operator applied to two lowered subexpressions.
    Binop(BinOp, Box<Ir>, Box<Ir>),
    /// A unary operator applied to a lowered subexpression.
    Unop(UnOp, Box<Ir>),
}

/// Lower a symbolic [`Expr`] to its shift-and-mask [`Ir`] form.
///
/// `word_width`, when `Some`, selects block-indexed lowering: every leaf
/// reference must fit entirely within one `word_width`-bit word of the raw
/// value, addressed as `x[i]`, or lowering fails with [`Error::Overflow`].
/// When `None`, every leaf reads directly out of a single unbounded
/// variable `x`.
pub fn lower(expr: &Expr, word_width: Option<u64>) -> Result<Ir> {
    match expr {
        Expr::Ref(field) => lower_ref(field.node(), word_width),
        Expr::Const(Const::Int(n)) => Ok(Ir::Const(n.clone())),
        Expr::Const(Const::Str(label)) => Err(Error::InvalidType(format!(
            "string constant `{label}` was never resolved against an enum leaf before lowering"
        ))),
        Expr::Binop(op, l, r) => Ok(Ir::Binop(
            *op,
            Box::new(lower(l, word_width)?),
            Box::new(lower(r, word_width)?),
        )),
        Expr::Unop(op, e) => Ok(Ir::Unop(*op, Box::new(lower(e, word_width)?))),
        Expr::Index(..) | Expr::Member(..) => Err(Error::InvalidType(
            "unresolved index/member access; navigate via SymbolicField before lowering"
                .to_string(),
        )),
    }
}

fn lower_ref(node: &FieldNode, word_width: Option<u64>) -> Result<Ir> {
    let read = lower_leaf_read(node, word_width)?;
    match node.kind() {
        TypeKind::SInt => Ok(Ir::SignExtend(Box::new(read), node.width())),
        TypeKind::UInt | TypeKind::Enum(_) | TypeKind::Custom(_) => Ok(read),
        TypeKind::Struct(_) | TypeKind::Array { .. } | TypeKind::Utf8 { .. } => {
            Err(Error::InvalidType(format!(
                "field `{}` has no scalar representation for expression lowering",
                node.name()
            )))
        }
    }
}

fn lower_leaf_read(node: &FieldNode, word_width: Option<u64>) -> Result<Ir> {
    let offset = node.offset();
    let width = node.width();
    let shifted = match word_width {
        None => shift(Ir::Raw, offset),
        Some(word_width) => {
            let first_word = offset / word_width;
            let last_bit = offset + width - 1;
            if last_bit / word_width != first_word {
                return Err(Error::Overflow {
                    width: width as u32,
                    detail: format!(
                        "field `{}` straddles a {word_width}-bit word boundary",
                        node.name()
                    ),
                });
            }
            shift(Ir::Word(first_word), offset % word_width)
        }
    };
    Ok(Ir::And(Box::new(shifted), mask(width)))
}

fn shift(base: Ir, amount: u64) -> Ir {
    if amount == 0 {
        base
    } else {
        Ir::Shr(Box::new(base), amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SymbolicField;
    use crate::tree::Tree;
    use crate::types::Type;
    use num_traits::ToPrimitive;

    fn foo_tree() -> std::rc::Rc<Tree> {
        let page = Type::array(Type::uint(6).unwrap(), 4).unwrap();
        let ty = Type::struct_(vec![("hdr", Type::uint(5).unwrap()), ("page", page)]).unwrap();
        Tree::new(ty)
    }

    #[test]
    fn lowers_array_element_comparison_to_shift_and_mask() {
        let tree = foo_tree();
        let root = SymbolicField::new(tree);
        let page2 = root.field("page").unwrap().index(2).unwrap();
        let expr = page2.expr().eq(42i64).unwrap();
        let ir = lower(&expr, None).unwrap();
        assert_eq!(
            ir,
            Ir::Binop(
                BinOp::Eq,
                Box::new(Ir::And(
                    Box::new(Ir::Shr(Box::new(Ir::Raw), 17)),
                    BigUint::from(63u32)
                )),
                Box::new(Ir::Const(BigInt::from(42)))
            )
        );
    }

    #[test]
    fn signed_leaf_gets_sign_extended() {
        let ty = Type::sint(6).unwrap();
        let tree = Tree::new(ty);
        let field = SymbolicField::new(tree);
        let ir = lower(&field.expr(), None).unwrap();
        assert!(matches!(ir, Ir::SignExtend(_, 6)));
    }

    #[test]
    fn block_indexed_lowering_rejects_straddling_field() {
        let ty = Type::struct_(vec![("a", Type::uint(20).unwrap()), ("b", Type::uint(20).unwrap())])
            .unwrap();
        let tree = Tree::new(ty);
        let root = SymbolicField::new(tree);
        let b = root.field("b").unwrap();
        let err = lower(&b.expr(), Some(16)).unwrap_err();
        assert!(matches!(err, Error::Overflow { .. }));
    }

    #[test]
    fn block_indexed_lowering_addresses_word_variable() {
        let ty = Type::struct_(vec![
            ("a", Type::uint(32).unwrap()),
            ("b", Type::uint(32).unwrap()),
        ])
        .unwrap();
        let tree = Tree::new(ty);
        let root = SymbolicField::new(tree);
        let b = root.field("b").unwrap();
        let ir = lower(&b.expr(), Some(32)).unwrap();
        assert_eq!(ir, Ir::And(Box::new(Ir::Word(1)), mask(32)));
    }

    /// Evaluates a closed (no free-variable) `Ir` tree directly, standing in
    /// for the C-family evaluator a renderer's output would run under.
    /// Reads of `Ir::Raw`/`Ir::Word` come from `words`, little-endian.
    fn eval(ir: &Ir, words: &[BigUint]) -> BigInt {
        match ir {
            Ir::Raw => BigInt::from(words[0].clone()),
            Ir::Word(i) => BigInt::from(words[*i as usize].clone()),
            Ir::Const(n) => n.clone(),
            Ir::Shr(inner, amount) => eval(inner, words) >> *amount as usize,
            Ir::And(inner, m) => eval(inner, words) & BigInt::from(m.clone()),
            Ir::SignExtend(inner, width) => {
                let sign_bit = BigInt::from(1) << (*width as usize - 1);
                (eval(inner, words) ^ &sign_bit) - &sign_bit
            }
            Ir::Binop(op, l, r) => {
                let (l, r) = (eval(l, words), eval(r, words));
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Mod => l % r,
                    BinOp::And => l & r,
                    BinOp::Or => l | r,
                    BinOp::Xor => l ^ r,
                    BinOp::Shl => l << r.to_u64().unwrap(),
                    BinOp::Shr => l >> r.to_u64().unwrap(),
                    BinOp::Eq => BigInt::from((l == r) as u8),
                    BinOp::Ne => BigInt::from((l != r) as u8),
                    BinOp::Lt => BigInt::from((l < r) as u8),
                    BinOp::Le => BigInt::from((l <= r) as u8),
                    BinOp::Gt => BigInt::from((l > r) as u8),
                    BinOp::Ge => BigInt::from((l >= r) as u8),
                }
            }
            Ir::Unop(op, e) => {
                let v = eval(e, words);
                match op {
                    UnOp::Neg => -v,
                    UnOp::BitNot => -(v + BigInt::from(1)),
                    UnOp::LogicalNot => BigInt::from((v == BigInt::from(0)) as u8),
                }
            }
        }
    }

    #[test]
    fn lowered_signed_field_agrees_with_direct_two_complement_decode_across_range() {
        let ty = Type::sint(6).unwrap();
        let tree = Tree::new(ty);
        let field = SymbolicField::new(tree);
        let ir = lower(&field.expr(), None).unwrap();
        for raw in 0u32..64 {
            let expected = if raw >= 32 { raw as i64 - 64 } else { raw as i64 };
            let got = eval(&ir, &[BigUint::from(raw)]);
            assert_eq!(got, BigInt::from(expected), "raw={raw}");
        }
    }
}
