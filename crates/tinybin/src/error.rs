// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.

use thiserror::Error;

/// Errors surfaced by scanning, registration, encoding and decoding.
///
/// Every operation fails fast: the first error aborts the whole call and no
/// partial result is handed back.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or incompatible envelope header, or an oversized length prefix.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Type (or type id) not present in the registry.
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// Destination shape does not match the message.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Shape the engine cannot encode (maps, channels, functions, cycles...).
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Max depth exceeded registering {type_name} (limit {max})")]
    MaxDepthExceeded { type_name: String, max: usize },

    /// Varint longer than its target width allows, or out of range for it.
    #[error("Varint overflow")]
    VarintOverflow,

    /// Input ended in the middle of a varint.
    #[error("Varint truncated")]
    VarintTruncated,

    /// Value does not fit the shape being encoded or rebuilt.
    #[error("Field access error: {0}")]
    FieldAccess(String),

    #[error("Unexpected end of input: need {need} bytes, have {have}")]
    UnexpectedEof { need: usize, have: usize },

    /// Malformed payload (bad bool byte, invalid UTF-8).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
