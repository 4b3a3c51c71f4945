//! The type model: a closed variant set of base kinds, each
//! optionally wrapped in pointer-depth and array modifiers.

use std::fmt;

use crate::intern::StringId;

/// Base type kinds. The ordering of the integer variants is load-bearing:
/// The fixed ordering `u8<u16<u32<u64<i8<i16<i32<i64` is used by the constant
/// evaluator to walk "the next wider kind of the same signedness" (§4.5 P1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum IntKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl IntKind {
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// The next wider kind of the same signedness, if any (§4.5 P1 overflow
    /// promotion). `None` at the widest kind of that signedness.
    #[must_use]
    pub fn widen(self) -> Option<Self> {
        match self {
            Self::U8 => Some(Self::U16),
            Self::U16 => Some(Self::U32),
            Self::U32 => Some(Self::U64),
            Self::U64 => None,
            Self::I8 => Some(Self::I16),
            Self::I16 => Some(Self::I32),
            Self::I32 => Some(Self::I64),
            Self::I64 => None,
        }
    }

    /// `max(lhs_kind_index, rhs_kind_index + shift)` per §4.5 P2, expressed
    /// as "the rank used when mixing this kind with an unsigned kind of
    /// equal width".
    #[must_use]
    pub fn rank_index(self) -> u8 {
        self as u8
    }

    /// Inverse of `rank_index`: the kind at enum position `idx`. Used by
    /// `constexpr::promote_int_pair` to map a computed `max(...)` rank back
    /// onto a concrete kind.
    #[must_use]
    pub fn from_rank_index(idx: u8) -> Self {
        match idx {
            0 => Self::U8,
            1 => Self::U16,
            2 => Self::U32,
            3 => Self::U64,
            4 => Self::I8,
            5 => Self::I16,
            6 => Self::I32,
            _ => Self::I64,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }
}

impl fmt::Display for IntKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FloatKind {
    F32,
    F64,
}

impl fmt::Display for FloatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if matches!(self, Self::F32) { "f32" } else { "f64" })
    }
}

/// An ordered, fixed-dimension array descriptor (`T[N][M]...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ArrayDims(pub Vec<u64>);

impl ArrayDims {
    #[must_use]
    pub fn dim_count(&self) -> usize {
        self.0.len()
    }
}

/// A function-pointer type: return type, ordered parameter types, and the
/// variadic-tail flag (`fn* rtype(ptype, ...)`). Both the return type and
/// each parameter type carry their own pointer-depth/array modifiers, so
/// this wraps full `Type`s rather than bare base kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FunctionPointerType {
    pub return_type: Box<Type>,
    pub params: Vec<Type>,
    pub variadic: bool,
}

/// The base type before pointer/array modifiers are applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BaseType {
    Void,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    /// User-defined struct/union/enum, or an identifier that never resolved.
    Custom(StringId),
    FunctionPointer(FunctionPointerType),
}

/// A fully modified type: a base kind plus pointer depth (0 = value) and an
/// optional array descriptor, composed on top of any base kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Type {
    pub base: BaseType,
    pub pointer_depth: u32,
    pub array: Option<ArrayDims>,
}

impl Type {
    #[must_use]
    pub fn simple(base: BaseType) -> Self {
        Self {
            base,
            pointer_depth: 0,
            array: None,
        }
    }

    #[must_use]
    pub fn void() -> Self {
        Self::simple(BaseType::Void)
    }

    #[must_use]
    pub fn bool_() -> Self {
        Self::simple(BaseType::Bool)
    }

    #[must_use]
    pub fn int(kind: IntKind) -> Self {
        Self::simple(BaseType::Int(kind))
    }

    #[must_use]
    pub fn float(kind: FloatKind) -> Self {
        Self::simple(BaseType::Float(kind))
    }

    #[must_use]
    pub fn is_custom_unresolved(&self) -> bool {
        matches!(self.base, BaseType::Custom(_)) && self.pointer_depth == 0 && self.array.is_none()
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.pointer_depth == 0 && self.array.is_none() && matches!(self.base, BaseType::Int(_))
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        self.pointer_depth == 0 && self.array.is_none() && matches!(self.base, BaseType::Float(_))
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.pointer_depth == 0 && self.array.is_none() && matches!(self.base, BaseType::Bool)
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        self.pointer_depth == 0 && self.array.is_none() && matches!(self.base, BaseType::Void)
    }

    #[must_use]
    pub fn pointer_to(base: BaseType, depth: u32) -> Self {
        Self {
            base,
            pointer_depth: depth,
            array: None,
        }
    }

    /// Array decay from `T[N]` to a pointer one array-dimension shallower
    /// (§4.5 `gen_array_decay`): strips the outermost dimension and, once
    /// none remain, turns the array into a plain pointer of depth 1.
    #[must_use]
    pub fn decay_one_dimension(&self) -> Option<Self> {
        let dims = self.array.as_ref()?;
        if dims.dim_count() <= 1 {
            Some(Self {
                base: self.base.clone(),
                pointer_depth: self.pointer_depth + 1,
                array: None,
            })
        } else {
            Some(Self {
                base: self.base.clone(),
                pointer_depth: self.pointer_depth,
                array: Some(ArrayDims(dims.0[1..].to_vec())),
            })
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            BaseType::Void => write!(f, "void")?,
            BaseType::Bool => write!(f, "bool")?,
            BaseType::Int(k) => write!(f, "{k}")?,
            BaseType::Float(k) => write!(f, "{k}")?,
            BaseType::Custom(_) => write!(f, "<custom>")?,
            BaseType::FunctionPointer(fp) => {
                write!(f, "fn*{}(", fp.return_type)?;
                for (i, p) in fp.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                if fp.variadic {
                    write!(f, "...")?;
                }
                write!(f, ")")?;
            }
        }
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        if let Some(dims) = &self.array {
            for d in &dims.0 {
                write!(f, "[{d}]")?;
            }
        }
        Ok(())
    }
}
