// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor -> codec tree construction.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Codec, CodecCache, FieldCodec, StructCodec};
use crate::error::{Error, Result};
use crate::types::{PrimitiveKind, SliceClass, TypeDescriptor, TypeKey, TypeKind};

/// One scan pass.
///
/// Codecs built during the pass are staged and only published to the cache
/// once the whole tree has been built, so a failing scan leaves no entries.
pub(super) struct Scanner<'c> {
    cache: &'c CodecCache,
    staged: HashMap<TypeKey, Arc<Codec>>,
    in_progress: Vec<TypeKey>,
}

impl<'c> Scanner<'c> {
    pub(super) fn new(cache: &'c CodecCache) -> Self {
        Self {
            cache,
            staged: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Staged codecs, ready to publish.
    pub(super) fn into_staged(self) -> HashMap<TypeKey, Arc<Codec>> {
        self.staged
    }

    pub(super) fn scan(&mut self, desc: &TypeDescriptor) -> Result<Arc<Codec>> {
        if let Some(hit) = self.cache.peek(&desc.key) {
            return Ok(hit);
        }
        if let Some(hit) = self.staged.get(&desc.key) {
            return Ok(Arc::clone(hit));
        }
        // A codec tree cannot refer back to itself.
        if self.in_progress.contains(&desc.key) {
            return Err(Error::UnsupportedType(format!(
                "recursive type {}",
                desc.key
            )));
        }

        self.in_progress.push(desc.key.clone());
        let built = self.build(desc);
        self.in_progress.pop();

        let codec = Arc::new(built?);
        self.staged.insert(desc.key.clone(), Arc::clone(&codec));
        Ok(codec)
    }

    fn build(&mut self, desc: &TypeDescriptor) -> Result<Codec> {
        Ok(match &desc.kind {
            TypeKind::Primitive(PrimitiveKind::Bool) => Codec::Bool,
            TypeKind::Primitive(PrimitiveKind::String) => Codec::String,
            TypeKind::Primitive(kind) => Codec::Primitive(*kind),
            TypeKind::Pointer(elem) => Codec::Pointer(self.scan(&elem.resolve())?),
            TypeKind::Array(arr) => Codec::Array {
                length: arr.length,
                element: self.scan(&arr.element.resolve())?,
            },
            TypeKind::Slice(elem) => {
                let elem = elem.resolve();
                match SliceClass::of(&elem) {
                    SliceClass::Bytes => Codec::Bytes,
                    SliceClass::Bools => Codec::Bools,
                    SliceClass::Signed(kind) => Codec::VarintSlice(kind),
                    SliceClass::Unsigned(kind) => Codec::UvarintSlice(kind),
                    SliceClass::Pointers => {
                        let pointee = elem.element_type().ok_or_else(|| {
                            Error::UnsupportedType(format!("pointer {} has no element", elem.key))
                        })?;
                        Codec::SliceOfPointer(self.scan(&pointee)?)
                    }
                    SliceClass::Generic => Codec::Slice(self.scan(&elem)?),
                }
            }
            TypeKind::Struct(fields) => {
                let mut codecs = Vec::with_capacity(fields.len());
                for (index, field) in fields.iter().enumerate() {
                    if field.is_skipped() {
                        continue;
                    }
                    let codec = self.scan(&field.type_desc()).map_err(|e| match e {
                        Error::UnsupportedType(what) => Error::UnsupportedType(format!(
                            "{}.{}: {what}",
                            desc.key, field.name
                        )),
                        other => other,
                    })?;
                    codecs.push(FieldCodec { index, codec });
                }
                Codec::Struct(StructCodec {
                    key: desc.key.clone(),
                    field_count: fields.len(),
                    fields: codecs,
                })
            }
            TypeKind::Opaque(kind) => {
                return Err(Error::UnsupportedType(format!("{} ({kind:?})", desc.key)));
            }
        })
    }
}
