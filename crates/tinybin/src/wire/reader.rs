// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire readers: a zero-copy cursor over a byte slice and a buffered stream reader.

use std::io::{self, Read};

use super::varint::{zigzag_decode, VarintDecoder, MAX_VARINT_LEN32, MAX_VARINT_LEN64};
use crate::config::STREAM_BUFFER_SIZE;
use crate::error::{Error, Result};

/// Chunk size for growing byte vectors read from a stream.
const STREAM_CHUNK: usize = 64 * 1024;

/// Generate fixed-width little-endian read methods.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        #[inline]
        fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            self.read_exact_into(&mut bytes)?;
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Read side of the wire primitives.
///
/// Implementors supply [`WireRead::read_exact_into`]; everything else is
/// derived from it. A shortage of input is [`Error::UnexpectedEof`], except
/// inside a varint where it is [`Error::VarintTruncated`].
pub trait WireRead {
    /// Fill `buf` completely or fail.
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Bytes still available, when the reader knows it.
    fn remaining(&self) -> Option<usize> {
        None
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact_into(&mut b)?;
        Ok(b[0])
    }

    /// Exactly `len` raw bytes.
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.read_exact_into(&mut out)?;
        Ok(out)
    }

    /// Varint reconstructing a 32-bit quantity (at most 5 bytes).
    fn read_uvarint32(&mut self) -> Result<u32> {
        Ok(read_bounded_uvarint(self, MAX_VARINT_LEN32)? as u32)
    }

    /// Varint reconstructing a 64-bit quantity (at most 10 bytes).
    fn read_uvarint64(&mut self) -> Result<u64> {
        read_bounded_uvarint(self, MAX_VARINT_LEN64)
    }

    /// Zigzag varint, 32-bit path.
    fn read_varint32(&mut self) -> Result<i32> {
        let v = self.read_uvarint32()?;
        Ok(zigzag_decode(u64::from(v)) as i32)
    }

    /// Zigzag varint, 64-bit path.
    fn read_varint64(&mut self) -> Result<i64> {
        Ok(zigzag_decode(self.read_uvarint64()?))
    }

    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_u64, u64, 8);

    #[inline]
    fn read_f32(&mut self) -> Result<f32> {
        self.read_u32().map(f32::from_bits)
    }

    #[inline]
    fn read_f64(&mut self) -> Result<f64> {
        self.read_u64().map(f64::from_bits)
    }

    /// One byte, strictly `0x00` or `0x01`.
    fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(Error::InvalidData(format!("invalid bool byte 0x{b:02x}"))),
        }
    }

    /// `len` bytes of UTF-8 (the length prefix has already been read).
    fn read_string_body(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_byte_vec(len)?;
        String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("invalid UTF-8: {e}")))
    }

    /// Varint length followed by UTF-8 bytes.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_uvarint64()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::Protocol(format!("string length {len} exceeds address space")))?;
        self.read_string_body(len)
    }
}

fn read_bounded_uvarint<R: WireRead + ?Sized>(r: &mut R, max_len: usize) -> Result<u64> {
    let mut dec = VarintDecoder::new(max_len);
    loop {
        let byte = match r.read_u8() {
            Ok(b) => b,
            Err(Error::UnexpectedEof { .. }) => return Err(Error::VarintTruncated),
            Err(e) => return Err(e),
        };
        if let Some(value) = dec.push(byte)? {
            return Ok(value);
        }
    }
}

// =======================================================================
// SliceReader
// =======================================================================

/// Cursor over an in-memory buffer. No intermediate allocation.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let have = self.buf.len() - self.pos;
        if len > have {
            return Err(Error::UnexpectedEof { need: len, have });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }
}

impl WireRead for SliceReader<'_> {
    #[inline]
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let src = self.read_slice(buf.len())?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.buf.len() - self.pos)
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        let Some(&b) = self.buf.get(self.pos) else {
            return Err(Error::UnexpectedEof { need: 1, have: 0 });
        };
        self.pos += 1;
        Ok(b)
    }

    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        self.read_slice(len).map(<[u8]>::to_vec)
    }
}

// =======================================================================
// StreamReader
// =======================================================================

/// Buffered reader over any [`io::Read`] source.
///
/// Bytes are pulled from the source in refills of the internal buffer. Bytes
/// read ahead but not yet consumed are visible through
/// [`StreamReader::buffered`].
#[derive(Debug)]
pub struct StreamReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_buffer(inner, Vec::new())
    }

    /// Reuse an existing allocation as the refill buffer.
    pub fn with_buffer(inner: R, mut buf: Vec<u8>) -> Self {
        buf.clear();
        buf.resize(STREAM_BUFFER_SIZE, 0);
        Self {
            inner,
            buf,
            pos: 0,
            filled: 0,
        }
    }

    /// Bytes buffered but not yet consumed.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..self.filled]
    }

    /// Return the source and the refill buffer (its unconsumed bytes are lost).
    pub fn into_parts(self) -> (R, Vec<u8>) {
        (self.inner, self.buf)
    }

    /// Refill the buffer; returns false on end of stream.
    fn fill(&mut self) -> Result<bool> {
        debug_assert!(self.pos == self.filled);
        self.pos = 0;
        self.filled = 0;
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.filled = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> WireRead for StreamReader<R> {
    fn read_exact_into(&mut self, out: &mut [u8]) -> Result<()> {
        let mut done = 0;
        while done < out.len() {
            if self.pos == self.filled && !self.fill()? {
                return Err(Error::UnexpectedEof {
                    need: out.len(),
                    have: done,
                });
            }
            let n = (self.filled - self.pos).min(out.len() - done);
            out[done..done + n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            done += n;
        }
        Ok(())
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        if self.pos == self.filled && !self.fill()? {
            return Err(Error::UnexpectedEof { need: 1, have: 0 });
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Grows in chunks so a hostile length prefix cannot force one huge allocation.
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(STREAM_CHUNK));
        while out.len() < len {
            let start = out.len();
            let step = (len - start).min(STREAM_CHUNK);
            out.resize(start + step, 0);
            self.read_exact_into(&mut out[start..]).map_err(|e| match e {
                Error::UnexpectedEof { have, .. } => Error::UnexpectedEof {
                    need: len,
                    have: start + have,
                },
                other => other,
            })?;
        }
        Ok(out)
    }
}
