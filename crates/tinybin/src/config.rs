// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine configuration.
//!
//! Wire-level constants shared by every peer, plus per-engine runtime limits.

use std::fmt;
use std::sync::Arc;

// =======================================================================
// Protocol constants
// =======================================================================

/// Envelope major version. Peers with a different major cannot talk.
pub const PROTOCOL_MAJOR: u8 = 1;

/// Envelope minor version. Differences are tolerated.
pub const PROTOCOL_MINOR: u8 = 0;

// =======================================================================
// Runtime defaults
// =======================================================================

/// Maximum struct nesting depth accepted at registration.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Encoders/decoders kept per pool.
pub const DEFAULT_POOL_CAPACITY: usize = 32;

/// Largest collection length accepted from the wire (elements).
pub const DEFAULT_MAX_COLLECTION_LEN: usize = 16 * 1024 * 1024;

/// Largest wire length accepted for elements that occupy no bytes
/// (unit structs, all-skipped structs, `[T; 0]`).
pub const DEFAULT_MAX_ZERO_SIZED_LEN: usize = 4096;

/// Initial capacity of a pooled encoder's output buffer.
pub const ENCODER_INITIAL_CAPACITY: usize = 256;

/// Encoder buffers grown past this are shrunk when returned to the pool.
pub const ENCODER_MAX_RETAINED: usize = 64 * 1024;

/// Refill buffer size of [`crate::wire::StreamReader`].
pub const STREAM_BUFFER_SIZE: usize = 4096;

/// Diagnostic side-channel callback.
pub type DiagnosticFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Per-engine configuration.
#[derive(Clone)]
pub struct Config {
    /// Registration depth limit (top-level struct is depth 1).
    pub max_depth: usize,
    /// Pool capacity for encoders and decoders each.
    pub pool_capacity: usize,
    /// Upper bound on decoded slice/string/bytes lengths.
    pub max_collection_len: usize,
    /// Upper bound on decoded lengths of zero-sized elements.
    pub max_zero_sized_len: usize,
    /// Optional diagnostic callback; never affects control flow.
    pub on_diagnostic: Option<DiagnosticFn>,
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity.max(1);
        self
    }

    pub fn with_max_collection_len(mut self, len: usize) -> Self {
        self.max_collection_len = len;
        self
    }

    pub fn with_max_zero_sized_len(mut self, len: usize) -> Self {
        self.max_zero_sized_len = len;
        self
    }

    pub fn with_diagnostic(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_diagnostic = Some(Arc::new(f));
        self
    }

    pub(crate) fn diagnose(&self, msg: &str) {
        if let Some(cb) = &self.on_diagnostic {
            cb(msg);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
            max_zero_sized_len: DEFAULT_MAX_ZERO_SIZED_LEN,
            on_diagnostic: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_depth", &self.max_depth)
            .field("pool_capacity", &self.pool_capacity)
            .field("max_collection_len", &self.max_collection_len)
            .field("max_zero_sized_len", &self.max_zero_sized_len)
            .field("on_diagnostic", &self.on_diagnostic.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.max_depth, 8);
        assert_eq!(cfg.pool_capacity, 32);
        assert_eq!(cfg.max_collection_len, 16 * 1024 * 1024);
        assert_eq!(cfg.max_zero_sized_len, 4096);
        assert!(cfg.on_diagnostic.is_none());
    }

    #[test]
    fn test_diagnostic_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let cfg = Config::default()
            .with_max_depth(3)
            .with_pool_capacity(0)
            .with_diagnostic(move |_| {
                seen.fetch_add(1, Ordering::Relaxed);
            });
        cfg.diagnose("registered Person");
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(cfg.max_depth, 3);
        assert_eq!(cfg.pool_capacity, 1);
        assert!(format!("{cfg:?}").contains("on_diagnostic: true"));
    }
}
