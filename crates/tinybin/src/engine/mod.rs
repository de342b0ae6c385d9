// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The engine instance.
//!
//! A [`TinyBin`] owns everything a protocol needs: the struct registry, the
//! codec cache and two bounded worker pools. Engines share no state, so
//! independent protocols can run side by side in one process.
//!
//! # Example
//!
//! ```
//! use tinybin::{Record, TinyBin};
//!
//! #[derive(Debug, Clone, PartialEq, Record)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! let engine = TinyBin::new();
//! engine.add_struct::<Person>()?;
//!
//! let alice = Person { name: "Alice".into(), age: 30 };
//! let bytes = engine.encode(&alice)?;
//! assert_eq!(bytes, [1, 0, 0, 1, 5, b'A', b'l', b'i', b'c', b'e', 60]);
//! assert_eq!(engine.decode::<Person>(&bytes)?, alice);
//! # Ok::<(), tinybin::Error>(())
//! ```

mod pool;
mod worker;

use std::io::{Read, Write};
use std::sync::Arc;

use crate::codec::{CodecCache, Limits};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::{Message, Shape};
use crate::registry::Registry;
use crate::types::{Record, Reflect, TypeDescriptor, Value};
use crate::wire::SliceReader;
use pool::Pool;
use worker::{Decoder, Encoder, Session};

/// Worker pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub encoders_idle: usize,
    pub decoders_idle: usize,
    /// Checkouts that found the pool empty and allocated.
    pub exhausted: u64,
}

/// Binary serialization engine.
pub struct TinyBin {
    config: Config,
    limits: Limits,
    registry: Registry,
    cache: CodecCache,
    encoders: Pool<Encoder>,
    decoders: Pool<Decoder>,
}

impl TinyBin {
    /// Engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        log::debug!(
            "[engine] created (max_depth={}, pool_capacity={}, max_collection_len={})",
            config.max_depth,
            config.pool_capacity,
            config.max_collection_len
        );
        Self {
            limits: Limits {
                max_collection_len: config.max_collection_len,
                max_zero_sized_len: config.max_zero_sized_len,
            },
            registry: Registry::with_diagnostic(config.max_depth, config.on_diagnostic.clone()),
            cache: CodecCache::with_diagnostic(config.on_diagnostic.clone()),
            encoders: Pool::new("encoder", config.pool_capacity, Encoder::new),
            decoders: Pool::new("decoder", config.pool_capacity, Decoder::new),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn session(&self) -> Session<'_> {
        Session {
            resolver: &self.registry,
            cache: &self.cache,
            limits: &self.limits,
        }
    }

    fn report(&self, op: &str, err: Error) -> Error {
        log::debug!("[engine] {} failed: {}", op, err);
        self.config.diagnose(&format!("{op} failed: {err}"));
        err
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register `T` (and the structs it contains); returns its type id.
    ///
    /// Type ids are registration positions: peers must register the same
    /// types in the same order.
    pub fn add_struct<T: Record>(&self) -> Result<u32> {
        self.registry.add_struct(T::descriptor())
    }

    /// Register several shapes in order, atomically.
    pub fn add_structs(&self, descs: &[Arc<TypeDescriptor>]) -> Result<Vec<u32>> {
        self.registry.add_structs(descs)
    }

    /// Type id the messages of `T` (a struct or a `Vec` of one) carry.
    pub fn type_id_of<T: Reflect>(&self) -> Option<u32> {
        let shape = Shape::of(&T::descriptor()).ok()?;
        self.registry.id_of(shape.struct_key())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &CodecCache {
        &self.cache
    }

    /// Number of codecs built so far.
    pub fn cached_codecs(&self) -> usize {
        self.cache.len()
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.encoders.capacity(),
            encoders_idle: self.encoders.available(),
            decoders_idle: self.decoders.available(),
            exhausted: self.encoders.exhausted_count() + self.decoders.exhausted_count(),
        }
    }

    // ---------------------------------------------------------------------
    // Framed messages
    // ---------------------------------------------------------------------

    /// Encode `value` (a registered struct or a non-empty `Vec` of one).
    pub fn encode<T: Reflect>(&self, value: &T) -> Result<Vec<u8>> {
        self.encode_value(&T::descriptor(), &value.to_value())
    }

    /// Encode into `out`; returns the bytes written.
    ///
    /// The message is framed in full before anything reaches `out`.
    pub fn encode_to<T: Reflect, W: Write>(&self, value: &T, mut out: W) -> Result<usize> {
        let mut enc = self.encoders.checkout();
        let bytes = enc
            .frame(self.session(), &T::descriptor(), &value.to_value())
            .map_err(|e| self.report("encode", e))?;
        out.write_all(bytes)?;
        Ok(bytes.len())
    }

    /// Encode a dynamic value of shape `desc`.
    pub fn encode_value(&self, desc: &TypeDescriptor, value: &Value) -> Result<Vec<u8>> {
        let mut enc = self.encoders.checkout();
        enc.frame(self.session(), desc, value)
            .map(<[u8]>::to_vec)
            .map_err(|e| self.report("encode", e))
    }

    /// Decode one message into a `T`.
    pub fn decode<T: Reflect>(&self, bytes: &[u8]) -> Result<T> {
        let mut r = SliceReader::new(bytes);
        self.decode_next(&mut r)
    }

    /// Decode one message into `dest`; `dest` is left untouched on error.
    pub fn decode_into<T: Reflect>(&self, bytes: &[u8], dest: &mut T) -> Result<()> {
        *dest = self.decode(bytes)?;
        Ok(())
    }

    /// Decode the next message of a buffer holding several back to back.
    pub fn decode_next<T: Reflect>(&self, r: &mut SliceReader<'_>) -> Result<T> {
        let value = self.decode_value_from(r, &T::descriptor())?;
        T::from_value(&value)
    }

    /// Decode one message from a byte stream.
    ///
    /// Bytes the stream yields past the message are consumed and dropped.
    pub fn decode_from<T: Reflect, R: Read>(&self, src: R) -> Result<T> {
        let mut dec = self.decoders.checkout();
        let value = dec
            .message_from(src, self.session(), &T::descriptor())
            .map_err(|e| self.report("decode", e))?;
        T::from_value(&value)
    }

    /// Decode one message into a dynamic value of shape `desc`.
    pub fn decode_value(&self, desc: &TypeDescriptor, bytes: &[u8]) -> Result<Value> {
        self.decode_value_from(&mut SliceReader::new(bytes), desc)
    }

    fn decode_value_from(&self, r: &mut SliceReader<'_>, desc: &TypeDescriptor) -> Result<Value> {
        self.session()
            .message(r, desc)
            .map_err(|e| self.report("decode", e))
    }

    /// Decode one message using only the shapes in the registry.
    pub fn decode_message(&self, bytes: &[u8]) -> Result<Message> {
        self.session()
            .dynamic(&mut SliceReader::new(bytes))
            .map_err(|e| self.report("decode", e))
    }

    // ---------------------------------------------------------------------
    // Headerless values
    // ---------------------------------------------------------------------

    /// Encode any supported value without an envelope. No registration needed.
    pub fn marshal<T: Reflect>(&self, value: &T) -> Result<Vec<u8>> {
        let mut enc = self.encoders.checkout();
        enc.marshal(self.session(), &T::descriptor(), &value.to_value())
            .map(<[u8]>::to_vec)
            .map_err(|e| self.report("marshal", e))
    }

    /// Marshal into `out`; returns the bytes written.
    pub fn marshal_to<T: Reflect, W: Write>(&self, value: &T, mut out: W) -> Result<usize> {
        let mut enc = self.encoders.checkout();
        let bytes = enc
            .marshal(self.session(), &T::descriptor(), &value.to_value())
            .map_err(|e| self.report("marshal", e))?;
        out.write_all(bytes)?;
        Ok(bytes.len())
    }

    /// Decode a value written by [`TinyBin::marshal`].
    pub fn unmarshal<T: Reflect>(&self, bytes: &[u8]) -> Result<T> {
        let value = self
            .session()
            .unmarshal(&mut SliceReader::new(bytes), &T::descriptor())
            .map_err(|e| self.report("unmarshal", e))?;
        T::from_value(&value)
    }
}

impl Default for TinyBin {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TinyBin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TinyBin")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("pools", &self.pool_stats())
            .finish()
    }
}
