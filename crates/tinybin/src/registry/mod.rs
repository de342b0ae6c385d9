// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct registry.
//!
//! Registers struct shapes and assigns their wire type ids. An id is the
//! position at which the struct was registered, so every peer exchanging
//! messages must register the same types in the same order. Nested structs
//! are registered before the struct containing them.
//!
//! The envelope only depends on [`TypeIdResolver`], so another id scheme
//! (name hashes, explicit ids) can replace the positional one.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DiagnosticFn;
use crate::error::{Error, Result};
use crate::types::{Kind, TypeDescriptor, TypeKey, TypeKind};

/// Maps struct identities to wire type ids and back.
pub trait TypeIdResolver: Send + Sync {
    /// Wire id of a registered struct.
    fn resolve_id(&self, key: &TypeKey) -> Option<u32>;

    /// Registered struct for a wire id.
    fn resolve_type(&self, id: u32) -> Option<Arc<StructDescriptor>>;
}

/// One encoded field of a registered struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub kind: Kind,
    /// Id of the struct this field holds (directly or through a container).
    pub nested_id: Option<u32>,
}

/// A registered struct shape.
#[derive(Debug, Clone)]
pub struct StructDescriptor {
    pub id: u32,
    pub key: TypeKey,
    /// Encoded fields in declaration order; skipped fields are absent.
    pub fields: Vec<FieldInfo>,
    pub descriptor: Arc<TypeDescriptor>,
}

#[derive(Debug, Default)]
struct Inner {
    structs: Vec<Arc<StructDescriptor>>,
    by_key: HashMap<TypeKey, u32>,
}

/// Registrations of one `add_structs` call, committed only if all succeed.
struct Staging<'a> {
    committed: &'a Inner,
    pending: Vec<Arc<StructDescriptor>>,
    by_key: HashMap<TypeKey, u32>,
}

impl Staging<'_> {
    fn lookup(&self, key: &TypeKey) -> Option<u32> {
        self.committed
            .by_key
            .get(key)
            .or_else(|| self.by_key.get(key))
            .copied()
    }

    fn next_id(&self) -> Result<u32> {
        u32::try_from(self.committed.structs.len() + self.pending.len())
            .map_err(|_| Error::Protocol("type id space exhausted".into()))
    }
}

/// Positional struct registry.
pub struct Registry {
    inner: RwLock<Inner>,
    max_depth: usize,
    on_diagnostic: Option<DiagnosticFn>,
}

impl Registry {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self::with_diagnostic(max_depth, None)
    }

    pub(crate) fn with_diagnostic(max_depth: usize, on_diagnostic: Option<DiagnosticFn>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_depth,
            on_diagnostic,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Register the structs reachable from each descriptor, in order.
    ///
    /// Each entry must be a struct or a container of one. Already registered
    /// structs are skipped. Returns the id of each entry's struct. Either every
    /// new struct is registered or, on error, none is.
    pub fn add_structs(&self, descs: &[Arc<TypeDescriptor>]) -> Result<Vec<u32>> {
        let mut inner = self.inner.write();
        let mut stage = Staging {
            committed: &inner,
            pending: Vec::new(),
            by_key: HashMap::new(),
        };

        let mut ids = Vec::with_capacity(descs.len());
        for desc in descs {
            match self.analyze(&mut stage, desc, 1)? {
                Some(id) => ids.push(id),
                None => return Err(Error::mismatch("struct", desc.key.as_str())),
            }
        }

        let Staging { pending, .. } = stage;
        for sd in pending {
            log::debug!(
                "[registry] registered {} as id {} ({} fields)",
                sd.key,
                sd.id,
                sd.fields.len()
            );
            if let Some(cb) = &self.on_diagnostic {
                cb(&format!("struct registered: {} id={}", sd.key, sd.id));
            }
            inner.by_key.insert(sd.key.clone(), sd.id);
            inner.structs.push(sd);
        }
        Ok(ids)
    }

    /// Register a single struct (or container of one).
    pub fn add_struct(&self, desc: Arc<TypeDescriptor>) -> Result<u32> {
        let ids = self.add_structs(std::slice::from_ref(&desc))?;
        ids.first()
            .copied()
            .ok_or_else(|| Error::mismatch("struct", desc.key.as_str()))
    }

    /// Walk `desc`; returns the id of the struct it is or contains.
    fn analyze(
        &self,
        stage: &mut Staging<'_>,
        desc: &Arc<TypeDescriptor>,
        depth: usize,
    ) -> Result<Option<u32>> {
        match &desc.kind {
            TypeKind::Struct(_) => self.analyze_struct(stage, desc, depth).map(Some),
            // Containers do not add a nesting level.
            TypeKind::Pointer(_) | TypeKind::Slice(_) | TypeKind::Array(_) => {
                match desc.element_type() {
                    Some(elem) => self.analyze(stage, &elem, depth),
                    None => Ok(None),
                }
            }
            TypeKind::Primitive(_) | TypeKind::Opaque(_) => Ok(None),
        }
    }

    fn analyze_struct(
        &self,
        stage: &mut Staging<'_>,
        desc: &Arc<TypeDescriptor>,
        depth: usize,
    ) -> Result<u32> {
        if let Some(id) = stage.lookup(&desc.key) {
            return Ok(id);
        }
        if depth > self.max_depth {
            return Err(Error::MaxDepthExceeded {
                type_name: desc.key.to_string(),
                max: self.max_depth,
            });
        }

        let mut fields = Vec::with_capacity(desc.num_fields());
        for field in desc.fields().unwrap_or_default() {
            if field.is_skipped() {
                continue;
            }
            let fdesc = field.type_desc();
            let nested_id = self.analyze(stage, &fdesc, depth + 1)?;
            fields.push(FieldInfo {
                name: field.name.clone(),
                kind: fdesc.kind(),
                nested_id,
            });
        }

        // Nested registration may already have added this struct.
        if let Some(id) = stage.lookup(&desc.key) {
            return Ok(id);
        }
        let id = stage.next_id()?;
        stage.by_key.insert(desc.key.clone(), id);
        stage.pending.push(Arc::new(StructDescriptor {
            id,
            key: desc.key.clone(),
            fields,
            descriptor: Arc::clone(desc),
        }));
        Ok(id)
    }

    pub fn get(&self, id: u32) -> Option<Arc<StructDescriptor>> {
        self.inner.read().structs.get(id as usize).cloned()
    }

    pub fn id_of(&self, key: &TypeKey) -> Option<u32> {
        self.inner.read().by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().structs.is_empty()
    }

    /// All registered structs in id order.
    pub fn snapshot(&self) -> Vec<Arc<StructDescriptor>> {
        self.inner.read().structs.clone()
    }
}

impl TypeIdResolver for Registry {
    fn resolve_id(&self, key: &TypeKey) -> Option<u32> {
        self.id_of(key)
    }

    fn resolve_type(&self, id: u32) -> Option<Arc<StructDescriptor>> {
        self.get(id)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
