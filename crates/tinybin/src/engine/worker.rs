// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pooled encode/decode workers.

use std::io::Read;

use super::pool::Reset;
use crate::codec::{CodecCache, Limits};
use crate::config::{ENCODER_INITIAL_CAPACITY, ENCODER_MAX_RETAINED};
use crate::error::Result;
use crate::protocol::{self, Message};
use crate::registry::TypeIdResolver;
use crate::types::{TypeDescriptor, Value};
use crate::wire::{SliceReader, StreamReader, Writer};

/// Engine state a worker is bound to for one call.
#[derive(Clone, Copy)]
pub(crate) struct Session<'e> {
    pub resolver: &'e dyn TypeIdResolver,
    pub cache: &'e CodecCache,
    pub limits: &'e Limits,
}

// Slice input needs no worker state; only streams borrow a pooled `Decoder`.
impl Session<'_> {
    pub(crate) fn message(
        &self,
        r: &mut SliceReader<'_>,
        dest: &TypeDescriptor,
    ) -> Result<Value> {
        protocol::decode_message(r, self.resolver, self.cache, dest, self.limits)
    }

    pub(crate) fn dynamic(&self, r: &mut SliceReader<'_>) -> Result<Message> {
        protocol::decode_dynamic(r, self.resolver, self.cache, self.limits)
    }

    /// Decode a headerless value of shape `desc`.
    pub(crate) fn unmarshal(
        &self,
        r: &mut SliceReader<'_>,
        desc: &TypeDescriptor,
    ) -> Result<Value> {
        let codec = self.cache.scan(desc)?;
        let mut value = codec.zero_value();
        codec.decode(r, &mut value, self.limits)?;
        Ok(value)
    }
}

/// Encoder with a reusable output buffer.
pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::with_capacity(ENCODER_INITIAL_CAPACITY),
        }
    }

    /// Frame `value` as one message; the bytes stay valid until the next call.
    pub(crate) fn frame(
        &mut self,
        s: Session<'_>,
        desc: &TypeDescriptor,
        value: &Value,
    ) -> Result<&[u8]> {
        self.buf.clear();
        let mut w = Writer::new(&mut self.buf);
        protocol::encode_message(&mut w, s.resolver, s.cache, desc, value)?;
        w.finish()?;
        Ok(&self.buf)
    }

    /// Encode `value` without an envelope.
    pub(crate) fn marshal(
        &mut self,
        s: Session<'_>,
        desc: &TypeDescriptor,
        value: &Value,
    ) -> Result<&[u8]> {
        self.buf.clear();
        let codec = s.cache.scan(desc)?;
        let mut w = Writer::new(&mut self.buf);
        codec.encode(&mut w, value)?;
        w.finish()?;
        Ok(&self.buf)
    }
}

impl Reset for Encoder {
    fn reset(&mut self) {
        self.buf.clear();
        if self.buf.capacity() > ENCODER_MAX_RETAINED {
            self.buf.shrink_to(ENCODER_INITIAL_CAPACITY);
        }
    }
}

/// Decoder holding the refill buffer used for streaming sources.
pub(crate) struct Decoder {
    stream_buf: Vec<u8>,
}

impl Decoder {
    pub(crate) fn new() -> Self {
        Self {
            stream_buf: Vec::new(),
        }
    }

    /// Decode one message from a byte stream, reusing the refill buffer.
    pub(crate) fn message_from<R: Read>(
        &mut self,
        src: R,
        s: Session<'_>,
        dest: &TypeDescriptor,
    ) -> Result<Value> {
        let mut r = StreamReader::with_buffer(src, std::mem::take(&mut self.stream_buf));
        let out = protocol::decode_message(&mut r, s.resolver, s.cache, dest, s.limits);
        let (_, buf) = r.into_parts();
        self.stream_buf = buf;
        out
    }

}

impl Reset for Decoder {
    fn reset(&mut self) {
        self.stream_buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::types::{PrimitiveKind, TypeDescriptorBuilder};

    #[test]
    fn test_encoder_reset_shrinks_large_buffers() {
        let mut enc = Encoder::new();
        enc.buf.resize(ENCODER_MAX_RETAINED * 2, 0);
        enc.reset();
        assert!(enc.buf.is_empty());
        assert!(enc.buf.capacity() <= ENCODER_MAX_RETAINED);

        enc.buf.extend_from_slice(&[1, 2, 3]);
        let cap = enc.buf.capacity();
        enc.reset();
        assert_eq!(enc.buf.capacity(), cap);
    }

    #[test]
    fn test_stream_buffer_is_kept_across_calls() {
        let desc = TypeDescriptorBuilder::new("Tick")
            .field("n", PrimitiveKind::U32)
            .build();
        let reg = Registry::new(4);
        reg.add_struct(std::sync::Arc::new(desc.clone()))
            .expect("register");
        let cache = CodecCache::new();
        let limits = Limits::default();
        let s = Session {
            resolver: &reg,
            cache: &cache,
            limits: &limits,
        };

        let mut enc = Encoder::new();
        let bytes = enc
            .frame(s, &desc, &Value::Struct(vec![Value::U32(9)]))
            .expect("frame")
            .to_vec();

        let mut dec = Decoder::new();
        let v = dec.message_from(&bytes[..], s, &desc).expect("decode");
        assert_eq!(v, Value::Struct(vec![Value::U32(9)]));
        assert!(dec.stream_buf.capacity() > 0);

        let mut r = SliceReader::new(&bytes);
        let msg = s.dynamic(&mut r).expect("dynamic");
        assert_eq!(msg.values, vec![Value::Struct(vec![Value::U32(9)])]);
    }
}
