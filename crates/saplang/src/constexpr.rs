//! The constant evaluator: numeric promotion (L1, P1–P4),
//! short-circuit `&&`/`||` folding, and the tagged-scalar arithmetic that
//! backs it. Grounded in `examples/original_source/compiler/src/constexpr.cpp`'s
//! `cast_up_signed`/`cast_up_unsigned` widen-on-overflow cascade and its
//! `to_bool` truthiness table.

use crate::ast::{BinOp, UnaryOp};
use crate::types::{FloatKind, IntKind};
use crate::value::{fits_kind, float_fits, wrap_to_kind, ConstantValue};

#[must_use]
pub fn int_width_bytes(kind: IntKind) -> u8 {
    match kind {
        IntKind::U8 | IntKind::I8 => 1,
        IntKind::U16 | IntKind::I16 => 2,
        IntKind::U32 | IntKind::I32 => 4,
        IntKind::U64 | IntKind::I64 => 8,
    }
}

/// §4.5 P1/P2: same-signedness arithmetic keeps the wider kind; mixed
/// signed/unsigned always yields a signed kind, per
/// `max(lhs_kind_index, rhs_kind_index + shift)` with `shift` (= 4, the
/// enum distance between an unsigned kind and its same-width signed
/// counterpart) applied to whichever operand is unsigned.
#[must_use]
pub fn promote_int_pair(lhs: IntKind, rhs: IntKind) -> IntKind {
    if lhs == rhs {
        return lhs;
    }
    if lhs.is_signed() == rhs.is_signed() {
        return if int_width_bytes(lhs) >= int_width_bytes(rhs) { lhs } else { rhs };
    }
    const SHIFT: u8 = 4;
    let rank = |k: IntKind| k.rank_index() + if k.is_signed() { 0 } else { SHIFT };
    IntKind::from_rank_index(rank(lhs).max(rank(rhs)))
}

/// §4.5 P3: the wider float kind wins when a float is mixed with anything.
#[must_use]
pub fn promote_float_pair(lhs: FloatKind, rhs: FloatKind) -> FloatKind {
    if matches!(lhs, FloatKind::F64) || matches!(rhs, FloatKind::F64) {
        FloatKind::F64
    } else {
        FloatKind::F32
    }
}

/// §4.5 L1: the smallest unsigned kind holding a non-negative literal value.
#[must_use]
pub fn smallest_unsigned_kind(value: i128) -> Option<IntKind> {
    for kind in [IntKind::U8, IntKind::U16, IntKind::U32, IntKind::U64] {
        if fits_kind(value, kind) {
            return Some(kind);
        }
    }
    None
}

/// §4.5 L1: the smallest signed kind holding a (typically negative) value.
#[must_use]
pub fn smallest_signed_kind(value: i128) -> Option<IntKind> {
    for kind in [IntKind::I8, IntKind::I16, IntKind::I32, IntKind::I64] {
        if fits_kind(value, kind) {
            return Some(kind);
        }
    }
    None
}

/// Widen `value` within `kind`'s signedness family until it fits, wrapping
/// at the widest kind of that family (§4.5 P1 overflow rule; mirrors
/// `cast_up_signed`/`cast_up_unsigned` in the original).
#[must_use]
pub fn widen_or_wrap(value: i128, mut kind: IntKind) -> (IntKind, i128) {
    loop {
        if fits_kind(value, kind) {
            return (kind, value);
        }
        match kind.widen() {
            Some(next) => kind = next,
            None => return (kind, wrap_to_kind(value, kind)),
        }
    }
}

fn int_value(c: ConstantValue) -> Option<i128> {
    match c {
        ConstantValue::Int { value, .. } => Some(value),
        ConstantValue::Bool(b) => Some(i128::from(b)),
        ConstantValue::Float { .. } => None,
    }
}

fn float_value(c: ConstantValue) -> Option<f64> {
    match c {
        ConstantValue::Float { value, .. } => Some(value),
        ConstantValue::Int { value, .. } => Some(value as f64),
        ConstantValue::Bool(b) => Some(f64::from(b)),
    }
}

/// Folds a binary arithmetic/bitwise/comparison operator over two already-
/// folded constants. Logical `&&`/`||` are handled separately by
/// `fold_logical` since they can short-circuit on a non-constant operand.
#[must_use]
pub fn fold_binary_arithmetic(op: BinOp, lhs: ConstantValue, rhs: ConstantValue) -> Option<ConstantValue> {
    if matches!(op, BinOp::And | BinOp::Or) {
        return fold_logical(op, Some(lhs), Some(rhs));
    }
    if is_comparison(op) {
        return fold_comparison(op, lhs, rhs);
    }

    let is_float = matches!(lhs, ConstantValue::Float { .. }) || matches!(rhs, ConstantValue::Float { .. });
    if is_float {
        let (a, b) = (float_value(lhs)?, float_value(rhs)?);
        let kind = match (lhs, rhs) {
            (ConstantValue::Float { kind, .. }, ConstantValue::Float { kind: k2, .. }) => promote_float_pair(kind, k2),
            (ConstantValue::Float { kind, .. }, _) | (_, ConstantValue::Float { kind, .. }) => kind,
            _ => FloatKind::F64,
        };
        let result = apply_float_op(op, a, b)?;
        return Some(ConstantValue::Float { kind, value: result });
    }

    let (a, b) = (int_value(lhs)?, int_value(rhs)?);
    let start_kind = match (lhs, rhs) {
        (ConstantValue::Bool(_), ConstantValue::Bool(_)) => IntKind::U8,
        (ConstantValue::Int { kind, .. }, ConstantValue::Int { kind: k2, .. }) => promote_int_pair(kind, k2),
        (ConstantValue::Int { kind, .. }, ConstantValue::Bool(_))
        | (ConstantValue::Bool(_), ConstantValue::Int { kind, .. }) => promote_int_pair(kind, IntKind::U8),
        _ => IntKind::I32,
    };
    let raw = apply_int_op(op, a, b)?;
    let (kind, value) = widen_or_wrap(raw, start_kind);
    Some(ConstantValue::Int { kind, value })
}

fn apply_int_op(op: BinOp, a: i128, b: i128) -> Option<i128> {
    match op {
        BinOp::Add => Some(a + b),
        BinOp::Sub => Some(a - b),
        BinOp::Mul => Some(a * b),
        BinOp::Div => (b != 0).then(|| a / b),
        BinOp::Mod => (b != 0).then(|| a % b),
        BinOp::BitAnd => Some(a & b),
        BinOp::BitOr => Some(a | b),
        BinOp::BitXor => Some(a ^ b),
        BinOp::Shl => Some(a << (b & 0x3f)),
        BinOp::Shr => Some(a >> (b & 0x3f)),
        _ => None,
    }
}

fn apply_float_op(op: BinOp, a: f64, b: f64) -> Option<f64> {
    match op {
        BinOp::Add => Some(a + b),
        BinOp::Sub => Some(a - b),
        BinOp::Mul => Some(a * b),
        BinOp::Div => Some(a / b),
        _ => None,
    }
}

fn is_comparison(op: BinOp) -> bool {
    matches!(op, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
}

fn fold_comparison(op: BinOp, lhs: ConstantValue, rhs: ConstantValue) -> Option<ConstantValue> {
    let is_float = matches!(lhs, ConstantValue::Float { .. }) || matches!(rhs, ConstantValue::Float { .. });
    let result = if is_float {
        let (a, b) = (float_value(lhs)?, float_value(rhs)?);
        compare(op, a.partial_cmp(&b)?)
    } else {
        let (a, b) = (int_value(lhs)?, int_value(rhs)?);
        compare(op, a.cmp(&b))
    };
    Some(ConstantValue::Bool(result))
}

fn compare(op: BinOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    match op {
        BinOp::Eq => ordering == Equal,
        BinOp::Ne => ordering != Equal,
        BinOp::Lt => ordering == Less,
        BinOp::Le => ordering != Greater,
        BinOp::Gt => ordering == Greater,
        BinOp::Ge => ordering != Less,
        _ => false,
    }
}

/// §4.5 short-circuit rule: a constant-true LHS of `||` (or constant-false
/// LHS of `&&`) folds without needing the RHS to be constant at all.
#[must_use]
pub fn fold_logical(op: BinOp, lhs: Option<ConstantValue>, rhs: Option<ConstantValue>) -> Option<ConstantValue> {
    let lhs_bool = lhs.and_then(ConstantValue::as_bool);
    match op {
        BinOp::Or => {
            if lhs_bool == Some(true) {
                return Some(ConstantValue::Bool(true));
            }
            let rhs_bool = rhs.and_then(ConstantValue::as_bool)?;
            Some(ConstantValue::Bool(lhs_bool? || rhs_bool))
        }
        BinOp::And => {
            if lhs_bool == Some(false) {
                return Some(ConstantValue::Bool(false));
            }
            let rhs_bool = rhs.and_then(ConstantValue::as_bool)?;
            Some(ConstantValue::Bool(lhs_bool? && rhs_bool))
        }
        _ => None,
    }
}

/// Folds a unary operator. `Neg` applied to a non-negative int constant
/// re-picks the smallest *signed* kind holding the negated value (L1's
/// negative-literal rule, realised here rather than at the lexer since
/// `-` is always a separate `UnaryOperator` node — see DESIGN.md).
#[must_use]
pub fn fold_unary(op: UnaryOp, rhs: ConstantValue) -> Option<ConstantValue> {
    match op {
        UnaryOp::Neg => match rhs {
            ConstantValue::Int { value, .. } => {
                let negated = -value;
                let kind = smallest_signed_kind(negated).unwrap_or(IntKind::I64);
                let (kind, value) = widen_or_wrap(negated, kind);
                Some(ConstantValue::Int { kind, value })
            }
            ConstantValue::Float { kind, value } => Some(ConstantValue::Float { kind, value: -value }),
            ConstantValue::Bool(_) => None,
        },
        UnaryOp::Not => rhs.as_bool().map(|b| ConstantValue::Bool(!b)),
        UnaryOp::Deref | UnaryOp::AddrOf => None,
    }
}

#[must_use]
pub fn literal_fits_float(value: f64, kind: FloatKind) -> bool {
    float_fits(value, kind)
}

#[cfg(test)]
mod tests {
    use super::{fold_binary_arithmetic, fold_logical, fold_unary, promote_int_pair};
    use crate::ast::{BinOp, UnaryOp};
    use crate::types::IntKind;
    use crate::value::ConstantValue;

    #[test]
    fn p1_same_kind_stays_same_kind() {
        let a = ConstantValue::Int { kind: IntKind::I32, value: 3 };
        let b = ConstantValue::Int { kind: IntKind::I32, value: 4 };
        let folded = fold_binary_arithmetic(BinOp::Mul, a, b).unwrap();
        assert_eq!(folded, ConstantValue::Int { kind: IntKind::I32, value: 12 });
    }

    #[test]
    fn p1_overflow_widens_then_wraps() {
        let a = ConstantValue::Int { kind: IntKind::I64, value: i64::MAX as i128 };
        let b = ConstantValue::Int { kind: IntKind::I64, value: 1 };
        let folded = fold_binary_arithmetic(BinOp::Add, a, b).unwrap();
        assert_eq!(folded, ConstantValue::Int { kind: IntKind::I64, value: i64::MIN as i128 });
    }

    #[test]
    fn p2_mixed_signed_unsigned_always_yields_signed() {
        assert_eq!(promote_int_pair(IntKind::U32, IntKind::I32), IntKind::I32);
        assert_eq!(promote_int_pair(IntKind::U8, IntKind::I64), IntKind::I64);
        assert_eq!(promote_int_pair(IntKind::U64, IntKind::I8), IntKind::I64);
    }

    #[test]
    fn short_circuit_or_true_ignores_non_constant_rhs() {
        let lhs = Some(ConstantValue::Bool(true));
        assert_eq!(fold_logical(BinOp::Or, lhs, None), Some(ConstantValue::Bool(true)));
    }

    #[test]
    fn short_circuit_and_false_ignores_non_constant_rhs() {
        let lhs = Some(ConstantValue::Bool(false));
        assert_eq!(fold_logical(BinOp::And, lhs, None), Some(ConstantValue::Bool(false)));
    }

    #[test]
    fn both_constant_true_and_true_short_circuits_to_true() {
        let lhs = Some(ConstantValue::Bool(true));
        let rhs = Some(ConstantValue::Bool(true));
        assert_eq!(fold_logical(BinOp::And, lhs, rhs), Some(ConstantValue::Bool(true)));
    }

    #[test]
    fn negating_unsigned_literal_repicks_smallest_signed_kind() {
        let lit = ConstantValue::Int { kind: IntKind::U32, value: 300 };
        let folded = fold_unary(UnaryOp::Neg, lit).unwrap();
        assert_eq!(folded, ConstantValue::Int { kind: IntKind::I16, value: -300 });
    }
}
