//! Rendering a lowered [`Ir`] tree to a portable, fully-parenthesized
//! C-family source string, valid as-is in C, C++, Rust, Java, or
//! JavaScript, since it only uses operators and precedence rules common to
//! all of them (and parenthesizes away the need to know any of them).

use num_bigint::BigUint;
use num_traits::One;

use super::ir::{BinOp, Ir, UnOp};

/// Render `ir` to a C-family expression string reading the raw variable `x`
/// (or, under block-indexed lowering, the raw word array `x[i]`).
pub fn render(ir: &Ir) -> String {
    match ir {
        Ir::Raw => "x".to_string(),
        Ir::Word(i) => format!("x[{i}]"),
        Ir::Const(n) => n.to_string(),
        Ir::Shr(inner, amount) => format!("({} >> {amount})", render(inner)),
        Ir::And(inner, mask) => format!("({} & {mask})", render(inner)),
        Ir::SignExtend(inner, width) => {
            let sign_bit = BigUint::one() << (width - 1) as usize;
            format!("(({} ^ {sign_bit}) - {sign_bit})", render(inner))
        }
        Ir::Binop(op, l, r) => format!("({} {} {})", render(l), binop_str(*op), render(r)),
        Ir::Unop(op, e) => match op {
            UnOp::Neg => format!("(-{})", render(e)),
            UnOp::BitNot => format!("(~{})", render(e)),
            UnOp::LogicalNot => format!("(!{})", render(e)),
        },
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::And => "&",
        BinOp::Or => "|",
        BinOp::Xor => "^",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{lower, SymbolicField};
    use crate::tree::Tree;
    use crate::types::Type;

    #[test]
    fn renders_array_element_comparison() {
        let page = Type::array(Type::uint(6).unwrap(), 4).unwrap();
        let ty = Type::struct_(vec![("hdr", Type::uint(5).unwrap()), ("page", page)]).unwrap();
        let tree = Tree::new(ty);
        let root = SymbolicField::new(tree);
        let page2 = root.field("page").unwrap().index(2).unwrap();
        let expr = page2.expr().eq(42i64).unwrap();
        let ir = lower(&expr, None).unwrap();
        assert_eq!(render(&ir), "(((x >> 17) & 63) == 42)");
    }

    #[test]
    fn renders_sign_extension() {
        let ty = Type::sint(6).unwrap();
        let tree = Tree::new(ty);
        let field = SymbolicField::new(tree);
        let ir = lower(&field.expr(), None).unwrap();
        assert_eq!(render(&ir), "(((x & 63) ^ 32) - 32)");
    }

    #[test]
    fn renders_word_indexed_field() {
        let ty = Type::struct_(vec![
            ("a", Type::uint(32).unwrap()),
            ("b", Type::uint(32).unwrap()),
        ])
        .unwrap();
        let tree = Tree::new(ty);
        let root = SymbolicField::new(tree);
        let b = root.field("b").unwrap();
        let ir = lower(&b.expr(), Some(32)).unwrap();
        assert_eq!(render(&ir), "(x[1] & 4294967295)");
    }
}
