// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tinybin - compact binary serialization
//!
//! Encodes Rust structs into a small, schema-less binary form framed by a
//! four-field envelope. Struct shapes are registered up front; the wire
//! carries only a numeric type id, never field names.
//!
//! ## Quick Start
//!
//! ```rust
//! use tinybin::{Record, Result, TinyBin};
//!
//! #[derive(Debug, PartialEq, Record)]
//! struct Reading {
//!     sensor: u16,
//!     celsius: f32,
//!     #[tinybin(skip)]
//!     cached: Option<String>,
//! }
//!
//! fn main() -> Result<()> {
//!     let engine = TinyBin::new();
//!     engine.add_struct::<Reading>()?;
//!
//!     let bytes = engine.encode(&Reading { sensor: 3, celsius: 21.5, cached: None })?;
//!     let back: Reading = engine.decode(&bytes)?;
//!     assert_eq!(back.sensor, 3);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +----------------------------------------------------------------+
//! |  TinyBin engine: registry + codec cache + encoder/decoder pools |
//! +----------------------------------------------------------------+
//! |  protocol: [major][minor][type id][count] + payload            |
//! +----------------------------------------------------------------+
//! |  codec: one codec tree per type, built once by the scanner     |
//! +----------------------------------------------------------------+
//! |  wire: LEB128/zigzag varints, sticky Writer, WireRead readers  |
//! +----------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`types`] - type descriptors, dynamic values, the [`Reflect`] bridge
//! - [`codec`] - codec trees and the per-engine cache
//! - [`registry`] - positional struct registry
//! - [`protocol`] - message envelope
//! - [`wire`] - byte-level primitives

// Allow the derive macro to work inside this crate's tests
extern crate self as tinybin;

/// Codec trees and the per-engine codec cache.
pub mod codec;
/// Protocol constants and runtime configuration.
pub mod config;
/// Error type shared by every operation.
pub mod error;
/// Message envelope (header + payload).
pub mod protocol;
/// Struct registry and type id resolution.
pub mod registry;
/// Type descriptors, dynamic values and reflection.
pub mod types;
/// Varints, writer and readers.
pub mod wire;

mod engine;

pub use codec::{CacheStats, Codec, CodecCache};
pub use config::{Config, PROTOCOL_MAJOR, PROTOCOL_MINOR};
pub use engine::{PoolStats, TinyBin};
pub use error::{Error, Result};
pub use protocol::{Header, Message};
pub use registry::{Registry, StructDescriptor, TypeIdResolver};
pub use types::{Record, Reflect, TypeDescriptor, TypeDescriptorBuilder, Value};

// Derive macro (for #[derive(tinybin::Record)])
pub use tinybin_codegen::Record;

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TinyBin>();
};
