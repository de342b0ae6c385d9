// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for struct descriptors.
//!
//! Used where no Rust type exists for a shape, e.g. decoding a peer's
//! messages dynamically.

use std::sync::Arc;

use super::descriptor::{FieldDescriptor, PrimitiveKind, TypeDescriptor};

/// Builder for struct [`TypeDescriptor`]s.
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    /// Create a new builder for a struct type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a primitive field.
    pub fn field(mut self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.fields.push(FieldDescriptor::new(
            name,
            TypeDescriptor::primitive(kind),
        ));
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::String)
    }

    /// Add a field with an arbitrary type descriptor.
    pub fn field_with_type(
        mut self,
        name: impl Into<String>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a slice field of primitives.
    pub fn slice_field(mut self, name: impl Into<String>, element_kind: PrimitiveKind) -> Self {
        let slice = TypeDescriptor::slice(TypeDescriptor::primitive(element_kind));
        self.fields.push(FieldDescriptor::new(name, slice));
        self
    }

    /// Add a fixed-length array field of primitives.
    pub fn array_field(
        mut self,
        name: impl Into<String>,
        element_kind: PrimitiveKind,
        length: usize,
    ) -> Self {
        let arr = TypeDescriptor::array(TypeDescriptor::primitive(element_kind), length);
        self.fields.push(FieldDescriptor::new(name, arr));
        self
    }

    /// Add a nested struct field.
    pub fn nested_field(mut self, name: impl Into<String>, nested: Arc<TypeDescriptor>) -> Self {
        self.fields.push(FieldDescriptor::new(name, nested));
        self
    }

    /// Add a nullable field pointing at `target`.
    pub fn pointer_field(mut self, name: impl Into<String>, target: Arc<TypeDescriptor>) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, TypeDescriptor::pointer(target)));
        self
    }

    /// Add a field that is described but never encoded.
    pub fn skipped_field(mut self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, TypeDescriptor::primitive(kind)).skipped());
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::struct_type(self.name, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::descriptor::Kind;

    #[test]
    fn test_builder_preserves_declaration_order() {
        let inner = Arc::new(
            TypeDescriptorBuilder::new("Inner")
                .field("x", PrimitiveKind::F64)
                .build(),
        );
        let desc = TypeDescriptorBuilder::new("Outer")
            .field("id", PrimitiveKind::U32)
            .string_field("name")
            .slice_field("samples", PrimitiveKind::I16)
            .array_field("digest", PrimitiveKind::U8, 4)
            .nested_field("inner", inner.clone())
            .pointer_field("parent", inner)
            .skipped_field("scratch", PrimitiveKind::I64)
            .build();

        let kinds: Vec<Kind> = desc
            .fields()
            .unwrap_or_default()
            .iter()
            .map(|f| f.type_desc().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                Kind::U32,
                Kind::String,
                Kind::Slice,
                Kind::Array,
                Kind::Struct,
                Kind::Pointer,
                Kind::I64,
            ]
        );
        assert!(desc.field(6).is_some_and(FieldDescriptor::is_skipped));
        assert_eq!(desc.name(), "Outer");
    }
}
