// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime shape information.
//!
//! A [`TypeDescriptor`] is the read-only introspection view the scanner and the
//! registry work from: kind classification, field enumeration and element-type
//! lookup. Descriptors are immutable once built and shared behind `Arc`.

use std::fmt;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
}

impl PrimitiveKind {
    /// Canonical type name, also used as the type identity.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
        }
    }

    /// Signed integer family (zigzag varint on the wire).
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Unsigned integer family (plain varint on the wire).
    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// True for the 64-bit integer kinds, which decode through the 10-byte varint path.
    pub fn is_wide(&self) -> bool {
        matches!(self, Self::I64 | Self::U64)
    }
}

/// Kinds the engine can describe but never encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpaqueKind {
    Map,
    Chan,
    Func,
    Complex,
    Interface,
    /// A type the provider does not describe (e.g. a field excluded from the wire).
    Foreign,
}

/// Flat structural classification of a type, independent of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Struct,
    Array,
    Slice,
    Pointer,
    Map,
    Chan,
    Func,
    Complex,
    Interface,
    Foreign,
}

impl From<PrimitiveKind> for Kind {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool,
            PrimitiveKind::I8 => Self::I8,
            PrimitiveKind::I16 => Self::I16,
            PrimitiveKind::I32 => Self::I32,
            PrimitiveKind::I64 => Self::I64,
            PrimitiveKind::U8 => Self::U8,
            PrimitiveKind::U16 => Self::U16,
            PrimitiveKind::U32 => Self::U32,
            PrimitiveKind::U64 => Self::U64,
            PrimitiveKind::F32 => Self::F32,
            PrimitiveKind::F64 => Self::F64,
            PrimitiveKind::String => Self::String,
        }
    }
}

impl From<OpaqueKind> for Kind {
    fn from(kind: OpaqueKind) -> Self {
        match kind {
            OpaqueKind::Map => Self::Map,
            OpaqueKind::Chan => Self::Chan,
            OpaqueKind::Func => Self::Func,
            OpaqueKind::Complex => Self::Complex,
            OpaqueKind::Interface => Self::Interface,
            OpaqueKind::Foreign => Self::Foreign,
        }
    }
}

/// Type identity: the canonical name of a shape.
///
/// Structs use their declared (or fully qualified) name, composites are spelled
/// from their element: `[]Person`, `*Person`, `[4]u8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to another type descriptor.
///
/// `Lazy` defers resolution so self-referential shapes can be described
/// without building an infinite tree.
#[derive(Clone)]
pub enum TypeRef {
    Lazy(fn() -> Arc<TypeDescriptor>),
    Shared(Arc<TypeDescriptor>),
}

impl TypeRef {
    /// Resolve to the referenced descriptor.
    pub fn resolve(&self) -> Arc<TypeDescriptor> {
        match self {
            Self::Lazy(provider) => provider(),
            Self::Shared(desc) => Arc::clone(desc),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Resolving here could recurse forever on cyclic shapes.
            Self::Lazy(_) => f.write_str("TypeRef::Lazy(..)"),
            Self::Shared(desc) => write!(f, "TypeRef::Shared({})", desc.key),
        }
    }
}

impl From<Arc<TypeDescriptor>> for TypeRef {
    fn from(desc: Arc<TypeDescriptor>) -> Self {
        Self::Shared(desc)
    }
}

impl From<TypeDescriptor> for TypeRef {
    fn from(desc: TypeDescriptor) -> Self {
        Self::Shared(Arc::new(desc))
    }
}

/// Tag value that excludes a field from the wire.
pub const SKIP_TAG: &str = "-";

/// Field descriptor for struct members.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name (never transmitted).
    pub name: String,
    /// Field type.
    pub ty: TypeRef,
    /// Optional field tag; [`SKIP_TAG`] excludes the field.
    pub tag: Option<String>,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            tag: None,
        }
    }

    /// Attach a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Exclude the field from encoding.
    pub fn skipped(self) -> Self {
        self.with_tag(SKIP_TAG)
    }

    /// Fields named `_` or tagged `-` are not part of the wire shape.
    pub fn is_skipped(&self) -> bool {
        self.name == "_" || self.tag.as_deref() == Some(SKIP_TAG)
    }

    /// Resolve the field type.
    pub fn type_desc(&self) -> Arc<TypeDescriptor> {
        self.ty.resolve()
    }
}

/// Array type descriptor.
#[derive(Debug, Clone)]
pub struct ArrayDescriptor {
    /// Element type.
    pub element: TypeRef,
    /// Fixed length (part of the type, never on the wire).
    pub length: usize,
}

/// Type kind enumeration.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// Struct with fields in declaration order.
    Struct(Vec<FieldDescriptor>),
    Array(ArrayDescriptor),
    /// Dynamic-length sequence.
    Slice(TypeRef),
    /// Nullable indirection.
    Pointer(TypeRef),
    Opaque(OpaqueKind),
}

/// A complete type descriptor.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type identity.
    pub key: TypeKey,
    /// Type shape.
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(key: TypeKey, kind: TypeKind) -> Self {
        Self { key, kind }
    }

    /// Create a primitive type descriptor.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(TypeKey::new(kind.name()), TypeKind::Primitive(kind))
    }

    /// Create a struct type descriptor.
    pub fn struct_type(name: impl Into<Arc<str>>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(TypeKey::new(name), TypeKind::Struct(fields))
    }

    /// Create a fixed-length array descriptor.
    pub fn array(element: impl Into<TypeRef>, length: usize) -> Self {
        let element = element.into();
        let key = TypeKey::new(format!("[{}]{}", length, element.resolve().key));
        Self::new(key, TypeKind::Array(ArrayDescriptor { element, length }))
    }

    /// Create a slice descriptor.
    pub fn slice(element: impl Into<TypeRef>) -> Self {
        let element = element.into();
        let key = TypeKey::new(format!("[]{}", element.resolve().key));
        Self::new(key, TypeKind::Slice(element))
    }

    /// Create a pointer descriptor.
    pub fn pointer(element: impl Into<TypeRef>) -> Self {
        let element = element.into();
        let key = TypeKey::new(format!("*{}", element.resolve().key));
        Self::new(key, TypeKind::Pointer(element))
    }

    /// Describe a type the engine cannot encode.
    pub fn opaque(name: impl Into<Arc<str>>, kind: OpaqueKind) -> Self {
        Self::new(TypeKey::new(name), TypeKind::Opaque(kind))
    }

    /// Type identity.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Type name.
    pub fn name(&self) -> &str {
        self.key.as_str()
    }

    /// Flat kind classification.
    pub fn kind(&self) -> Kind {
        match &self.kind {
            TypeKind::Primitive(p) => (*p).into(),
            TypeKind::Struct(_) => Kind::Struct,
            TypeKind::Array(_) => Kind::Array,
            TypeKind::Slice(_) => Kind::Slice,
            TypeKind::Pointer(_) => Kind::Pointer,
            TypeKind::Opaque(o) => (*o).into(),
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    /// Get fields if this is a struct.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match &self.kind {
            TypeKind::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Number of declared fields (0 for non-structs).
    pub fn num_fields(&self) -> usize {
        self.fields().map_or(0, <[FieldDescriptor]>::len)
    }

    /// Field by declaration index.
    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields()?.get(index)
    }

    /// Element type of a pointer, array or slice.
    pub fn element_type(&self) -> Option<Arc<TypeDescriptor>> {
        match &self.kind {
            TypeKind::Pointer(elem) | TypeKind::Slice(elem) => Some(elem.resolve()),
            TypeKind::Array(arr) => Some(arr.element.resolve()),
            _ => None,
        }
    }

    /// Fixed length of an array type.
    pub fn len(&self) -> Option<usize> {
        match &self.kind {
            TypeKind::Array(arr) => Some(arr.length),
            _ => None,
        }
    }

    /// Struct identity used for registry lookups.
    pub fn struct_id(&self) -> Option<&TypeKey> {
        self.is_struct().then_some(&self.key)
    }
}

/// How a slice's elements are represented and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SliceClass {
    Bytes,
    Bools,
    Signed(PrimitiveKind),
    Unsigned(PrimitiveKind),
    Pointers,
    Generic,
}

impl SliceClass {
    pub(crate) fn of(element: &TypeDescriptor) -> Self {
        match &element.kind {
            TypeKind::Primitive(PrimitiveKind::U8) => Self::Bytes,
            TypeKind::Primitive(PrimitiveKind::Bool) => Self::Bools,
            TypeKind::Primitive(p) if p.is_signed() => Self::Signed(*p),
            TypeKind::Primitive(p) if p.is_unsigned() => Self::Unsigned(*p),
            TypeKind::Pointer(_) => Self::Pointers,
            _ => Self::Generic,
        }
    }
}
