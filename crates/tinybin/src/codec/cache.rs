// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent codec cache.
//!
//! Append-only map from type identity to codec tree. Lookups are lock-free
//! reads on a `DashMap` shard. Two threads missing on the same type may both
//! build it; the build is a pure function of the shape, so whichever insert
//! lands first wins and the other result is dropped.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::scanner::Scanner;
use super::Codec;
use crate::config::DiagnosticFn;
use crate::error::Result;
use crate::types::{TypeDescriptor, TypeKey};

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Per-engine codec cache.
#[derive(Default)]
pub struct CodecCache {
    codecs: DashMap<TypeKey, Arc<Codec>>,
    hits: AtomicU64,
    misses: AtomicU64,
    on_diagnostic: Option<DiagnosticFn>,
}

impl CodecCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_diagnostic(on_diagnostic: Option<DiagnosticFn>) -> Self {
        Self {
            on_diagnostic,
            ..Self::default()
        }
    }

    /// Codec for `desc`, building and caching it (and its sub-codecs) on a miss.
    pub fn scan(&self, desc: &TypeDescriptor) -> Result<Arc<Codec>> {
        if let Some(hit) = self.peek(&desc.key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let start = Instant::now();
        let mut scanner = Scanner::new(self);
        let codec = scanner.scan(desc)?;

        let staged = scanner.into_staged();
        let built = staged.len();
        for (key, codec) in staged {
            self.codecs.entry(key).or_insert(codec);
        }
        let codec = self.peek(&desc.key).unwrap_or(codec);

        log::debug!(
            "[codec-cache] built {} ({} new codecs) in {:?}",
            desc.key,
            built,
            start.elapsed()
        );
        if let Some(cb) = &self.on_diagnostic {
            cb(&format!("codec built: {} ({built} new)", desc.key));
        }
        Ok(codec)
    }

    /// Cached codec, without building or counting.
    pub fn peek(&self, key: &TypeKey) -> Option<Arc<Codec>> {
        self.codecs.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.codecs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.codecs.len(),
        }
    }
}

impl std::fmt::Debug for CodecCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecCache")
            .field("stats", &self.stats())
            .finish()
    }
}
