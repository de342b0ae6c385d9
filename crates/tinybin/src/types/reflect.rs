// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static type introspection.
//!
//! [`Reflect`] gives every encodable Rust type a [`TypeDescriptor`] and a
//! lossless mapping to and from [`Value`]. Primitives, `String`, `Vec<T>`,
//! `[T; N]`, `Option<T>` (as a nullable pointer) and `Box<T>` (transparent) are
//! covered here; structs get it from `#[derive(Record)]`.

use std::sync::{Arc, OnceLock};

use super::descriptor::{PrimitiveKind, SliceClass, TypeDescriptor, TypeKind, TypeRef};
use super::value::Value;
use crate::error::{Error, Result};

/// Types that can describe their shape and convert to and from [`Value`].
pub trait Reflect: Sized {
    /// Shape of the type.
    fn descriptor() -> Arc<TypeDescriptor>;

    /// Convert to a dynamic value.
    fn to_value(&self) -> Value;

    /// Rebuild from a dynamic value.
    fn from_value(value: &Value) -> Result<Self>;

    /// Value representation of `Vec<Self>`; packed for bytes, bools and integers.
    #[doc(hidden)]
    fn slice_to_value(items: &[Self]) -> Value {
        Value::Slice(items.iter().map(Reflect::to_value).collect())
    }

    #[doc(hidden)]
    fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::Slice(items) => items.iter().map(Self::from_value).collect(),
            other => Err(mismatch("slice", other)),
        }
    }
}

/// Marker for struct types registrable as top-level messages.
///
/// Implemented by `#[derive(Record)]`.
pub trait Record: Reflect {}

pub(crate) fn mismatch(expected: &str, found: &Value) -> Error {
    Error::FieldAccess(format!("expected {expected}, found {}", found.kind_name()))
}

/// Borrow the positional fields of a struct value. Used by derived impls.
#[doc(hidden)]
pub fn struct_fields<'a>(value: &'a Value, count: usize, type_name: &str) -> Result<&'a [Value]> {
    match value {
        Value::Struct(fields) if fields.len() == count => Ok(fields),
        Value::Struct(fields) => Err(Error::FieldAccess(format!(
            "{type_name}: expected {count} fields, found {}",
            fields.len()
        ))),
        other => Err(mismatch(type_name, other)),
    }
}

macro_rules! primitive_descriptor {
    ($kind:expr) => {{
        static DESCRIPTOR: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
        Arc::clone(DESCRIPTOR.get_or_init(|| Arc::new(TypeDescriptor::primitive($kind))))
    }};
}

macro_rules! impl_reflect_signed {
    ($($ty:ty => $variant:ident, $kind:ident);* $(;)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> Arc<TypeDescriptor> {
                    primitive_descriptor!(PrimitiveKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: &Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(*v),
                        other => Err(mismatch(stringify!($ty), other)),
                    }
                }

                fn slice_to_value(items: &[Self]) -> Value {
                    Value::Ints(items.iter().map(|v| i64::from(*v)).collect())
                }

                fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
                    match value {
                        Value::Ints(items) => items
                            .iter()
                            .map(|v| {
                                <$ty>::try_from(*v).map_err(|_| {
                                    Error::FieldAccess(format!(
                                        "{v} out of range for {}",
                                        stringify!($ty)
                                    ))
                                })
                            })
                            .collect(),
                        Value::Slice(items) => items.iter().map(Self::from_value).collect(),
                        other => Err(mismatch("ints", other)),
                    }
                }
            }
        )*
    };
}

macro_rules! impl_reflect_unsigned {
    ($($ty:ty => $variant:ident, $kind:ident);* $(;)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> Arc<TypeDescriptor> {
                    primitive_descriptor!(PrimitiveKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: &Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(*v),
                        other => Err(mismatch(stringify!($ty), other)),
                    }
                }

                fn slice_to_value(items: &[Self]) -> Value {
                    Value::Uints(items.iter().map(|v| u64::from(*v)).collect())
                }

                fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
                    match value {
                        Value::Uints(items) => items
                            .iter()
                            .map(|v| {
                                <$ty>::try_from(*v).map_err(|_| {
                                    Error::FieldAccess(format!(
                                        "{v} out of range for {}",
                                        stringify!($ty)
                                    ))
                                })
                            })
                            .collect(),
                        Value::Slice(items) => items.iter().map(Self::from_value).collect(),
                        other => Err(mismatch("uints", other)),
                    }
                }
            }
        )*
    };
}

impl_reflect_signed! {
    i8 => I8, I8;
    i16 => I16, I16;
    i32 => I32, I32;
    i64 => I64, I64;
}

impl_reflect_unsigned! {
    u16 => U16, U16;
    u32 => U32, U32;
    u64 => U64, U64;
}

impl Reflect for u8 {
    fn descriptor() -> Arc<TypeDescriptor> {
        primitive_descriptor!(PrimitiveKind::U8)
    }

    fn to_value(&self) -> Value {
        Value::U8(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::U8(v) => Ok(*v),
            other => Err(mismatch("u8", other)),
        }
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Bytes(items.to_vec())
    }

    fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::Slice(items) => items.iter().map(Self::from_value).collect(),
            other => Err(mismatch("bytes", other)),
        }
    }
}

impl Reflect for bool {
    fn descriptor() -> Arc<TypeDescriptor> {
        primitive_descriptor!(PrimitiveKind::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Bools(items.to_vec())
    }

    fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::Bools(bools) => Ok(bools.clone()),
            Value::Slice(items) => items.iter().map(Self::from_value).collect(),
            other => Err(mismatch("bools", other)),
        }
    }
}

// Pointer-sized integers travel as their 64-bit counterparts.
impl Reflect for isize {
    fn descriptor() -> Arc<TypeDescriptor> {
        i64::descriptor()
    }

    fn to_value(&self) -> Value {
        Value::I64(*self as i64)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let v = i64::from_value(value)?;
        isize::try_from(v).map_err(|_| Error::FieldAccess(format!("{v} out of range for isize")))
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Ints(items.iter().map(|v| *v as i64).collect())
    }

    fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
        i64::slice_from_value(value)?
            .into_iter()
            .map(|v| {
                isize::try_from(v)
                    .map_err(|_| Error::FieldAccess(format!("{v} out of range for isize")))
            })
            .collect()
    }
}

impl Reflect for usize {
    fn descriptor() -> Arc<TypeDescriptor> {
        u64::descriptor()
    }

    fn to_value(&self) -> Value {
        Value::U64(*self as u64)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let v = u64::from_value(value)?;
        usize::try_from(v).map_err(|_| Error::FieldAccess(format!("{v} out of range for usize")))
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Uints(items.iter().map(|v| *v as u64).collect())
    }

    fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
        u64::slice_from_value(value)?
            .into_iter()
            .map(|v| {
                usize::try_from(v)
                    .map_err(|_| Error::FieldAccess(format!("{v} out of range for usize")))
            })
            .collect()
    }
}

impl Reflect for f32 {
    fn descriptor() -> Arc<TypeDescriptor> {
        primitive_descriptor!(PrimitiveKind::F32)
    }

    fn to_value(&self) -> Value {
        Value::F32(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::F32(v) => Ok(*v),
            other => Err(mismatch("f32", other)),
        }
    }
}

impl Reflect for f64 {
    fn descriptor() -> Arc<TypeDescriptor> {
        primitive_descriptor!(PrimitiveKind::F64)
    }

    fn to_value(&self) -> Value {
        Value::F64(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::F64(v) => Ok(*v),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl Reflect for String {
    fn descriptor() -> Arc<TypeDescriptor> {
        primitive_descriptor!(PrimitiveKind::String)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::slice(TypeRef::Lazy(T::descriptor)))
    }

    fn to_value(&self) -> Value {
        T::slice_to_value(self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        T::slice_from_value(value)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::array(TypeRef::Lazy(T::descriptor), N))
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(mismatch("array", value));
        };
        let items = items.iter().map(T::from_value).collect::<Result<Vec<T>>>()?;
        let found = items.len();
        items
            .try_into()
            .map_err(|_| Error::FieldAccess(format!("expected array of {N}, found {found}")))
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::pointer(TypeRef::Lazy(T::descriptor)))
    }

    fn to_value(&self) -> Value {
        Value::Pointer(self.as_ref().map(|v| Box::new(v.to_value())))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Pointer(None) | Value::Null => Ok(None),
            Value::Pointer(Some(inner)) => T::from_value(inner).map(Some),
            other => Err(mismatch("pointer", other)),
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn descriptor() -> Arc<TypeDescriptor> {
        T::descriptor()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: &Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }

    fn slice_to_value(items: &[Self]) -> Value {
        pack(&T::descriptor(), items.iter().map(|b| b.to_value()).collect())
    }

    fn slice_from_value(value: &Value) -> Result<Vec<Self>> {
        unpack(&T::descriptor(), value)?
            .iter()
            .map(Self::from_value)
            .collect()
    }
}

/// Fold a list of element values into the slice representation of `element`.
fn pack(element: &TypeDescriptor, items: Vec<Value>) -> Value {
    match SliceClass::of(element) {
        SliceClass::Bytes => Value::Bytes(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::U8(b) => Some(*b),
                    _ => None,
                })
                .collect(),
        ),
        SliceClass::Bools => Value::Bools(items.iter().filter_map(Value::as_bool).collect()),
        SliceClass::Signed(_) => Value::Ints(items.iter().filter_map(Value::as_i64).collect()),
        SliceClass::Unsigned(_) => Value::Uints(items.iter().filter_map(Value::as_u64).collect()),
        SliceClass::Pointers | SliceClass::Generic => Value::Slice(items),
    }
}

/// Inverse of [`pack`].
fn unpack(element: &TypeDescriptor, value: &Value) -> Result<Vec<Value>> {
    let kind = match &element.kind {
        TypeKind::Primitive(kind) => Some(*kind),
        _ => None,
    };
    match (value, kind) {
        (Value::Slice(items), _) => Ok(items.clone()),
        (Value::Bytes(bytes), _) => Ok(bytes.iter().map(|b| Value::U8(*b)).collect()),
        (Value::Bools(bools), _) => Ok(bools.iter().map(|b| Value::Bool(*b)).collect()),
        (Value::Ints(ints), Some(kind)) => ints.iter().map(|v| narrow_signed(*v, kind)).collect(),
        (Value::Uints(uints), Some(kind)) => {
            uints.iter().map(|v| narrow_unsigned(*v, kind)).collect()
        }
        (other, _) => Err(mismatch("slice", other)),
    }
}

/// Narrow a widened signed integer back to `kind`.
fn narrow_signed(v: i64, kind: PrimitiveKind) -> Result<Value> {
    let out_of_range = || Error::FieldAccess(format!("{v} out of range for {}", kind.name()));
    Ok(match kind {
        PrimitiveKind::I8 => Value::I8(i8::try_from(v).map_err(|_| out_of_range())?),
        PrimitiveKind::I16 => Value::I16(i16::try_from(v).map_err(|_| out_of_range())?),
        PrimitiveKind::I32 => Value::I32(i32::try_from(v).map_err(|_| out_of_range())?),
        PrimitiveKind::I64 => Value::I64(v),
        _ => return Err(out_of_range()),
    })
}

/// Narrow a widened unsigned integer back to `kind`.
fn narrow_unsigned(v: u64, kind: PrimitiveKind) -> Result<Value> {
    let out_of_range = || Error::FieldAccess(format!("{v} out of range for {}", kind.name()));
    Ok(match kind {
        PrimitiveKind::U8 => Value::U8(u8::try_from(v).map_err(|_| out_of_range())?),
        PrimitiveKind::U16 => Value::U16(u16::try_from(v).map_err(|_| out_of_range())?),
        PrimitiveKind::U32 => Value::U32(u32::try_from(v).map_err(|_| out_of_range())?),
        PrimitiveKind::U64 => Value::U64(v),
        _ => return Err(out_of_range()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::descriptor::Kind;

    #[test]
    fn test_primitive_descriptors_are_shared() {
        let a = i32::descriptor();
        let b = i32::descriptor();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "i32");
        assert_eq!(usize::descriptor().kind(), Kind::U64);
    }

    #[test]
    fn test_container_descriptors() {
        assert_eq!(<Vec<String>>::descriptor().name(), "[]string");
        assert_eq!(<Option<u16>>::descriptor().name(), "*u16");
        assert_eq!(<[f32; 3]>::descriptor().name(), "[3]f32");
        assert_eq!(<Box<u8>>::descriptor().name(), "u8");
        assert_eq!(<Vec<Option<i8>>>::descriptor().name(), "[]*i8");
    }

    #[test]
    fn test_packed_slices() {
        assert_eq!(vec![1u8, 2].to_value(), Value::Bytes(vec![1, 2]));
        assert_eq!(vec![true].to_value(), Value::Bools(vec![true]));
        assert_eq!(vec![-1i16, 5].to_value(), Value::Ints(vec![-1, 5]));
        assert_eq!(vec![9u32].to_value(), Value::Uints(vec![9]));
        assert_eq!(
            vec![1.0f64].to_value(),
            Value::Slice(vec![Value::F64(1.0)])
        );
    }

    #[test]
    fn test_slice_narrowing_rejects_out_of_range() {
        let err = <Vec<i8>>::from_value(&Value::Ints(vec![300]));
        assert!(matches!(err, Err(Error::FieldAccess(_))));
        let ok = <Vec<u16>>::from_value(&Value::Uints(vec![65535]));
        assert_eq!(ok.ok(), Some(vec![65535u16]));
    }

    #[test]
    fn test_option_and_array_round_trip() {
        let v: Option<String> = Some("hi".into());
        assert_eq!(<Option<String>>::from_value(&v.to_value()).ok(), Some(v));
        assert_eq!(<Option<String>>::from_value(&Value::Pointer(None)).ok(), Some(None));

        let arr = [1u64, 2, 3];
        assert_eq!(<[u64; 3]>::from_value(&arr.to_value()).ok(), Some(arr));
        assert!(<[u64; 2]>::from_value(&arr.to_value()).is_err());
    }

    #[test]
    fn test_boxed_slices_pack_like_their_inner_type() {
        let items = vec![Box::new(7u8), Box::new(8u8)];
        let value = items.to_value();
        assert_eq!(value, Value::Bytes(vec![7, 8]));
        assert_eq!(<Vec<Box<u8>>>::from_value(&value).ok(), Some(items));

        let ints = vec![Box::new(-2i32)];
        assert_eq!(<Vec<Box<i32>>>::from_value(&ints.to_value()).ok(), Some(ints));
    }

    #[test]
    fn test_struct_fields_checks_arity() {
        let v = Value::Struct(vec![Value::I32(1)]);
        assert!(struct_fields(&v, 1, "Point").is_ok());
        assert!(matches!(
            struct_fields(&v, 2, "Point"),
            Err(Error::FieldAccess(_))
        ));
        assert!(struct_fields(&Value::Null, 1, "Point").is_err());
    }
}
