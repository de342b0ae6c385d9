// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type introspection: descriptors, dynamic values and the [`Reflect`] bridge.

mod builder;
mod descriptor;
mod reflect;
mod value;

pub use builder::TypeDescriptorBuilder;
pub use descriptor::{
    ArrayDescriptor, FieldDescriptor, Kind, OpaqueKind, PrimitiveKind, TypeDescriptor, TypeKey,
    TypeKind, TypeRef, SKIP_TAG,
};
pub use reflect::{struct_fields, Record, Reflect};
pub use value::Value;

pub(crate) use descriptor::SliceClass;
pub(crate) use reflect::mismatch;
