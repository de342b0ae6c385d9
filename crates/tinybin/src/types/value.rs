// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use super::descriptor::{PrimitiveKind, SliceClass, TypeDescriptor, TypeKind};

/// A dynamic value that can hold any encodable shape.
///
/// Struct values are positional: index `i` holds the field declared at `i`,
/// skipped fields included (as [`Value::Null`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Primitives
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),

    // Composites
    Struct(Vec<Value>),
    Array(Vec<Value>),
    Slice(Vec<Value>),
    Pointer(Option<Box<Value>>),

    // Packed slices
    Bytes(Vec<u8>),
    Bools(Vec<bool>),
    Ints(Vec<i64>),
    Uints(Vec<u64>),

    // Special
    Null,
}

impl Value {
    /// Zero value for a described type.
    pub fn zero(desc: &TypeDescriptor) -> Self {
        match &desc.kind {
            TypeKind::Primitive(kind) => Self::zero_primitive(*kind),
            TypeKind::Struct(fields) => Self::Struct(
                fields
                    .iter()
                    .map(|f| {
                        if f.is_skipped() {
                            Self::Null
                        } else {
                            Self::zero(&f.type_desc())
                        }
                    })
                    .collect(),
            ),
            TypeKind::Array(arr) => {
                let elem = arr.element.resolve();
                Self::Array((0..arr.length).map(|_| Self::zero(&elem)).collect())
            }
            TypeKind::Slice(elem) => match SliceClass::of(&elem.resolve()) {
                SliceClass::Bytes => Self::Bytes(Vec::new()),
                SliceClass::Bools => Self::Bools(Vec::new()),
                SliceClass::Signed(_) => Self::Ints(Vec::new()),
                SliceClass::Unsigned(_) => Self::Uints(Vec::new()),
                SliceClass::Pointers | SliceClass::Generic => Self::Slice(Vec::new()),
            },
            TypeKind::Pointer(_) => Self::Pointer(None),
            TypeKind::Opaque(_) => Self::Null,
        }
    }

    /// Zero value of a primitive kind.
    pub fn zero_primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::I8 => Self::I8(0),
            PrimitiveKind::I16 => Self::I16(0),
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::U8 => Self::U8(0),
            PrimitiveKind::U16 => Self::U16(0),
            PrimitiveKind::U32 => Self::U32(0),
            PrimitiveKind::U64 => Self::U64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
            PrimitiveKind::String => Self::String(String::new()),
        }
    }

    /// Short variant name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Struct(_) => "struct",
            Self::Array(_) => "array",
            Self::Slice(_) => "slice",
            Self::Pointer(_) => "pointer",
            Self::Bytes(_) => "bytes",
            Self::Bools(_) => "bools",
            Self::Ints(_) => "ints",
            Self::Uints(_) => "uints",
            Self::Null => "null",
        }
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any signed integer, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I8(v) => Some(i64::from(*v)),
            Self::I16(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Any unsigned integer, widened.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U8(v) => Some(u64::from(*v)),
            Self::U16(v) => Some(u64::from(*v)),
            Self::U32(v) => Some(u64::from(*v)),
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64 (f32 is widened).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Struct field by declaration index.
    pub fn field(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(index),
            _ => None,
        }
    }

    /// Elements of an array or a generic slice.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) | Self::Slice(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}
