//! The folded-constant tagged scalar ("optional folded
//! `ConstantValue`"), plus the numeric-promotion arithmetic used by
//! `constexpr.rs`.
//!
//! Every integer kind's value is carried in a single `i128` tagged by
//! `IntKind`/`FloatKind` rather than a C-style union with a discriminant:
//! a `match` on the tag gives the same fixed-layout behaviour just as
//! cheaply, without `unsafe`.

use crate::types::{FloatKind, IntKind};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ConstantValue {
    Int { kind: IntKind, value: i128 },
    Float { kind: FloatKind, value: f64 },
    Bool(bool),
}

impl ConstantValue {
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Int { value, .. } => Some(value != 0),
            Self::Float { value, .. } => Some(value != 0.0),
        }
    }

    #[must_use]
    pub fn as_i128(self) -> Option<i128> {
        match self {
            Self::Int { value, .. } => Some(value),
            Self::Bool(b) => Some(i128::from(b)),
            Self::Float { .. } => None,
        }
    }
}

#[must_use]
pub fn int_min(kind: IntKind) -> i128 {
    match kind {
        IntKind::U8 | IntKind::U16 | IntKind::U32 | IntKind::U64 => 0,
        IntKind::I8 => i128::from(i8::MIN),
        IntKind::I16 => i128::from(i16::MIN),
        IntKind::I32 => i128::from(i32::MIN),
        IntKind::I64 => i128::from(i64::MIN),
    }
}

#[must_use]
pub fn int_max(kind: IntKind) -> i128 {
    match kind {
        IntKind::U8 => i128::from(u8::MAX),
        IntKind::U16 => i128::from(u16::MAX),
        IntKind::U32 => i128::from(u32::MAX),
        IntKind::U64 => i128::from(u64::MAX),
        IntKind::I8 => i128::from(i8::MAX),
        IntKind::I16 => i128::from(i16::MAX),
        IntKind::I32 => i128::from(i32::MAX),
        IntKind::I64 => i128::from(i64::MAX),
    }
}

#[must_use]
pub fn fits_kind(value: i128, kind: IntKind) -> bool {
    value >= int_min(kind) && value <= int_max(kind)
}

/// Two's-complement wrap of `value` into `kind`'s bit width, used once the
/// widest kind of a signedness is reached during folding (§4.5 P1).
#[must_use]
pub fn wrap_to_kind(value: i128, kind: IntKind) -> i128 {
    let bits: u32 = match kind {
        IntKind::U8 | IntKind::I8 => 8,
        IntKind::U16 | IntKind::I16 => 16,
        IntKind::U32 | IntKind::I32 => 32,
        IntKind::U64 | IntKind::I64 => 64,
    };
    let modulus = 1i128 << bits;
    let mut reduced = value.rem_euclid(modulus);
    if kind.is_signed() && reduced >= modulus / 2 {
        reduced -= modulus;
    }
    reduced
}

#[must_use]
pub fn float_fits(value: f64, kind: FloatKind) -> bool {
    match kind {
        FloatKind::F32 => (f64::from(f32::MIN)..=f64::from(f32::MAX)).contains(&value),
        FloatKind::F64 => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{fits_kind, wrap_to_kind};
    use crate::types::IntKind;

    #[test]
    fn wraps_u8_overflow() {
        assert_eq!(wrap_to_kind(256, IntKind::U8), 0);
        assert_eq!(wrap_to_kind(-1, IntKind::U8), 255);
    }

    #[test]
    fn wraps_i8_overflow() {
        assert_eq!(wrap_to_kind(128, IntKind::I8), -128);
    }

    #[test]
    fn fits_kind_checks_range() {
        assert!(fits_kind(127, IntKind::I8));
        assert!(!fits_kind(128, IntKind::I8));
        assert!(fits_kind(255, IntKind::U8));
        assert!(!fits_kind(-1, IntKind::U8));
    }
}
