// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LEB128 variable-length integers and zigzag folding.
//!
//! # Encoding Rules
//!
//! - Each byte uses 7 bits for data, bit 7 indicates continuation
//! - Values 0-127 encode in 1 byte
//! - A 32-bit quantity takes at most 5 bytes, a 64-bit one at most 10
//!
//! Signed integers are zigzag-folded first (`0, -1, 1, -2, ...` map to
//! `0, 1, 2, 3, ...`) so small negatives stay short.
//!
//! ```
//! use tinybin::wire::varint::{decode_uvarint64, encode_uvarint, MAX_VARINT_LEN64};
//!
//! let mut buf = [0u8; MAX_VARINT_LEN64];
//! let len = encode_uvarint(300, &mut buf);
//! assert_eq!(&buf[..len], &[0xAC, 0x02]);
//! assert_eq!(decode_uvarint64(&buf[..len]).ok(), Some((300, 2)));
//! ```

use crate::error::{Error, Result};

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_LEN64: usize = 10;

/// Maximum encoded length of a 32-bit varint.
pub const MAX_VARINT_LEN32: usize = 5;

/// Continuation bit mask (bit 7).
const CONTINUATION_BIT: u8 = 0x80;

/// Data bits mask (bits 0-6).
const DATA_MASK: u8 = 0x7F;

/// Encode `value` as LEB128 into `buf`, returning the number of bytes used.
#[inline]
pub fn encode_uvarint(mut value: u64, buf: &mut [u8; MAX_VARINT_LEN64]) -> usize {
    let mut i = 0;
    while value >= u64::from(CONTINUATION_BIT) {
        buf[i] = (value as u8 & DATA_MASK) | CONTINUATION_BIT;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Number of bytes needed to encode `value`.
#[inline]
#[must_use]
pub const fn uvarint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Fold a signed integer into an unsigned one.
#[inline]
#[must_use]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
#[must_use]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Byte-at-a-time LEB128 decoder bounded to `max_len` bytes.
///
/// The last permitted byte must terminate the sequence and carry no bits
/// beyond the target width; otherwise the varint is [`Error::VarintOverflow`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct VarintDecoder {
    value: u64,
    shift: u32,
    count: usize,
    max_len: usize,
}

impl VarintDecoder {
    pub(crate) const fn new(max_len: usize) -> Self {
        Self {
            value: 0,
            shift: 0,
            count: 0,
            max_len,
        }
    }

    /// Feed one byte. Returns the value once the terminating byte is seen.
    #[inline]
    pub(crate) fn push(&mut self, byte: u8) -> Result<Option<u64>> {
        self.count += 1;
        let data = u64::from(byte & DATA_MASK);
        if self.count == self.max_len {
            // Bits left for the final byte: 4 for 32-bit, 1 for 64-bit.
            let width = if self.max_len == MAX_VARINT_LEN32 { 32 } else { 64 };
            let room = width - self.shift;
            if byte & CONTINUATION_BIT != 0 || data >> room != 0 {
                return Err(Error::VarintOverflow);
            }
        }
        self.value |= data << self.shift;
        if byte & CONTINUATION_BIT == 0 {
            return Ok(Some(self.value));
        }
        self.shift += 7;
        Ok(None)
    }

    pub(crate) const fn consumed(&self) -> usize {
        self.count
    }
}

fn decode_bounded(buf: &[u8], max_len: usize) -> Result<(u64, usize)> {
    let mut dec = VarintDecoder::new(max_len);
    for &byte in buf {
        if let Some(value) = dec.push(byte)? {
            return Ok((value, dec.consumed()));
        }
    }
    Err(Error::VarintTruncated)
}

/// Decode a 64-bit varint from the front of `buf`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_uvarint64(buf: &[u8]) -> Result<(u64, usize)> {
    decode_bounded(buf, MAX_VARINT_LEN64)
}

/// Decode a 32-bit varint from the front of `buf` (at most 5 bytes).
pub fn decode_uvarint32(buf: &[u8]) -> Result<(u32, usize)> {
    let (value, len) = decode_bounded(buf, MAX_VARINT_LEN32)?;
    Ok((value as u32, len))
}
