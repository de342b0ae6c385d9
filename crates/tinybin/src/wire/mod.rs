// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-level wire primitives: varints, fixed-width numerics, strings, bools.

mod reader;
pub mod varint;
mod writer;

pub use reader::{SliceReader, StreamReader, WireRead};
pub use writer::Writer;
