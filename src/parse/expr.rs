use crate::ast::{BinaryOp, UnaryOp};
use crate::lex::token::{TokenKind, Punct};

//Binding priorities for the Pratt parser. Lower values bind tighter; an operator is folded into
//the current operand only while its left priority is at most the caller's minimum.

/// A full `expression`, comma operator included.
pub const EXPR_PRIO: u8 = 28;
/// An `assignment-expression`: function arguments and initializers.
pub const ASSIGN_PRIO: u8 = 26;
/// A `conditional-expression`: array sizes, case labels, enumerator values.
pub const CONDITIONAL_PRIO: u8 = 24;
/// Operand of a prefix operator, a cast or `sizeof`. Only postfix operators bind tighter.
pub const PREFIX_PRIO: u8 = 2;
/// Middle operand of `?:`, which is a full expression.
pub const TERNARY_MID_PRIO: u8 = EXPR_PRIO;

/// Returns lhs and rhs binding priority of the token, for binary operands, `?:` and
/// assignments. Left-associative operators have `rhs = lhs - 1` so that an operator of the same
/// level stops the recursion; the right-associative ones share a single value.
pub fn infix_binding_power(tok: &TokenKind) -> Option<(u8, u8)> {
    let res = match tok {
        TokenKind::Punct(pn) => match pn {
            Punct::Asterisk | Punct::Div | Punct::Mod => (4, 3),
            Punct::Add | Punct::Sub => (6, 5),
            Punct::Shl | Punct::Shr => (8, 7),
            Punct::Lt | Punct::Le |
            Punct::Gt | Punct::Ge => (10, 9),
            Punct::Eq | Punct::Ne => (12, 11),
            Punct::Ampersand => (14, 13),
            Punct::Xor => (16, 15),
            Punct::Or => (18, 17),
            Punct::LAnd => (20, 19),
            Punct::LOr => (22, 21),
            Punct::Question => (CONDITIONAL_PRIO, CONDITIONAL_PRIO),
            Punct::Assign |
            Punct::AssignAdd | Punct::AssignSub |
            Punct::AssignDiv | Punct::AssignMul |
            Punct::AssignAnd | Punct::AssignXor |
            Punct::AssignShl | Punct::AssignShr |
            Punct::AssignOr  | Punct::AssignMod => (ASSIGN_PRIO, ASSIGN_PRIO),
            Punct::Comma => (EXPR_PRIO, EXPR_PRIO - 1),
            _ => return None,
        },
        _ => return None,
    };
    Some(res)
}

pub fn binary_op(pn: Punct) -> Option<BinaryOp> {
    let op = match pn {
        Punct::Add => BinaryOp::Add,
        Punct::Sub => BinaryOp::Sub,
        Punct::Asterisk => BinaryOp::Mult,
        Punct::Div => BinaryOp::Div,
        Punct::Mod => BinaryOp::Mod,
        Punct::Shl => BinaryOp::Shl,
        Punct::Shr => BinaryOp::Shr,
        Punct::Lt => BinaryOp::Lt,
        Punct::Gt => BinaryOp::Gt,
        Punct::Le => BinaryOp::Le,
        Punct::Ge => BinaryOp::Ge,
        Punct::Eq => BinaryOp::Eq,
        Punct::Ne => BinaryOp::Ne,
        Punct::Ampersand => BinaryOp::BAnd,
        Punct::Xor => BinaryOp::BXor,
        Punct::Or => BinaryOp::BOr,
        Punct::LAnd => BinaryOp::LAnd,
        Punct::LOr => BinaryOp::LOr,
        Punct::Comma => BinaryOp::Comma,
        _ => return None,
    };
    Some(op)
}

/// `Some(None)` for plain `=`, `Some(Some(op))` for compound assignment.
pub fn assign_op(pn: Punct) -> Option<Option<BinaryOp>> {
    let op = match pn {
        Punct::Assign => None,
        Punct::AssignAdd => Some(BinaryOp::Add),
        Punct::AssignSub => Some(BinaryOp::Sub),
        Punct::AssignMul => Some(BinaryOp::Mult),
        Punct::AssignDiv => Some(BinaryOp::Div),
        Punct::AssignMod => Some(BinaryOp::Mod),
        Punct::AssignShl => Some(BinaryOp::Shl),
        Punct::AssignShr => Some(BinaryOp::Shr),
        Punct::AssignAnd => Some(BinaryOp::BAnd),
        Punct::AssignXor => Some(BinaryOp::BXor),
        Punct::AssignOr => Some(BinaryOp::BOr),
        _ => return None,
    };
    Some(op)
}

pub fn prefix_op(pn: Punct) -> Option<UnaryOp> {
    let op = match pn {
        Punct::Asterisk => UnaryOp::Deref,
        Punct::Ampersand => UnaryOp::Addr,
        Punct::Sub => UnaryOp::Neg,
        Punct::Add => UnaryOp::Plus,
        Punct::Not => UnaryOp::LNot,
        Punct::BitwiseNot => UnaryOp::BNot,
        Punct::Inc => UnaryOp::PreInc,
        Punct::Dec => UnaryOp::PreDec,
        _ => return None,
    };
    Some(op)
}
