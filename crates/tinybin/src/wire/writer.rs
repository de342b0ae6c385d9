// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sticky-error wire writer.

use std::io::{self, Write};

use super::varint::{encode_uvarint, zigzag_encode, MAX_VARINT_LEN64};
use crate::error::Result;

/// Primitive writer over any byte sink.
///
/// The first failed write is latched; every later write becomes a no-op and
/// [`Writer::finish`] reports that first error. Callers can therefore chain
/// primitive writes and check once at the end.
#[derive(Debug)]
pub struct Writer<W: Write> {
    out: W,
    err: Option<io::Error>,
    written: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            err: None,
            written: 0,
        }
    }

    /// Raw byte write.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        if self.err.is_some() {
            return;
        }
        match self.out.write_all(bytes) {
            Ok(()) => self.written += bytes.len(),
            Err(e) => self.err = Some(e),
        }
    }

    #[inline]
    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    /// Single byte, `0x01` for true.
    #[inline]
    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    /// LEB128 unsigned varint.
    #[inline]
    pub fn write_uvarint(&mut self, v: u64) {
        let mut buf = [0u8; MAX_VARINT_LEN64];
        let len = encode_uvarint(v, &mut buf);
        self.write(&buf[..len]);
    }

    /// Zigzag + LEB128 signed varint.
    #[inline]
    pub fn write_varint(&mut self, v: i64) {
        self.write_uvarint(zigzag_encode(v));
    }

    #[inline]
    pub fn write_u16(&mut self, v: u16) {
        self.write(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    #[inline]
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// IEEE-754 bit pattern, 4 bytes little-endian.
    #[inline]
    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// IEEE-754 bit pattern, 8 bytes little-endian.
    #[inline]
    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Varint length followed by raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_uvarint(bytes.len() as u64);
        self.write(bytes);
    }

    /// Varint length followed by UTF-8 bytes.
    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Bytes accepted by the sink so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// True once a write has failed.
    pub fn is_failed(&self) -> bool {
        self.err.is_some()
    }

    /// Flush and return the sink, or the first error encountered.
    pub fn finish(mut self) -> Result<W> {
        if let Some(e) = self.err.take() {
            return Err(e.into());
        }
        self.out.flush()?;
        Ok(self.out)
    }
}
