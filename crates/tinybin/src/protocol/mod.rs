// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message envelope.
//!
//! # Wire Format
//!
//! ```text
//! +--------+--------+-----------+-----------+---------------------------+
//! | major  | minor  | type_id   | count     | payload                   |
//! | (u8)   | (u8)   | (uvarint) | (uvarint) | count consecutive structs |
//! +--------+--------+-----------+-----------+---------------------------+
//! ```
//!
//! - `count == 1` carries a single struct, `count > 1` a homogeneous slice
//! - Structs are written back to back, without a length prefix
//! - A different `major` is rejected; a different `minor` is tolerated

use std::io::Write;
use std::sync::Arc;

use crate::codec::{check_len, CodecCache, Limits};
use crate::config::{PROTOCOL_MAJOR, PROTOCOL_MINOR};
use crate::error::{Error, Result};
use crate::registry::{StructDescriptor, TypeIdResolver};
use crate::types::{TypeDescriptor, TypeKey, TypeKind, Value};
use crate::wire::{WireRead, Writer};

/// Envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: u8,
    pub minor: u8,
    pub type_id: u32,
    pub count: u32,
}

impl Header {
    /// Header at the current protocol version.
    #[must_use]
    pub fn new(type_id: u32, count: u32) -> Self {
        Self {
            major: PROTOCOL_MAJOR,
            minor: PROTOCOL_MINOR,
            type_id,
            count,
        }
    }

    pub fn encode<W: Write>(&self, w: &mut Writer<W>) {
        w.write_u8(self.major);
        w.write_u8(self.minor);
        w.write_uvarint(u64::from(self.type_id));
        w.write_uvarint(u64::from(self.count));
    }

    /// Read and validate a header.
    pub fn decode<R: WireRead + ?Sized>(r: &mut R) -> Result<Self> {
        let major = r.read_u8()?;
        if major != PROTOCOL_MAJOR {
            return Err(Error::Protocol(format!(
                "unsupported major version {major} (expected {PROTOCOL_MAJOR})"
            )));
        }
        let minor = r.read_u8()?;
        if minor != PROTOCOL_MINOR {
            log::debug!(
                "[envelope] peer minor version {minor} differs from {PROTOCOL_MINOR}, continuing"
            );
        }
        let header = Self {
            major,
            minor,
            type_id: r.read_uvarint32()?,
            count: r.read_uvarint32()?,
        };
        log::trace!(
            "[envelope] header v{}.{} type_id={} count={}",
            header.major,
            header.minor,
            header.type_id,
            header.count
        );
        Ok(header)
    }
}

/// Message shape of a value's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A single struct.
    Struct(TypeKey),
    /// A slice of structs.
    StructSlice(TypeKey),
}

impl Shape {
    /// Classify a type as a message shape.
    pub fn of(desc: &TypeDescriptor) -> Result<Self> {
        match &desc.kind {
            TypeKind::Struct(_) => Ok(Self::Struct(desc.key.clone())),
            TypeKind::Slice(elem) => {
                let elem = elem.resolve();
                if elem.is_struct() {
                    Ok(Self::StructSlice(elem.key.clone()))
                } else {
                    Err(Error::mismatch("slice of struct", desc.key.as_str()))
                }
            }
            _ => Err(Error::mismatch("struct or slice of struct", desc.key.as_str())),
        }
    }

    pub fn struct_key(&self) -> &TypeKey {
        match self {
            Self::Struct(key) | Self::StructSlice(key) => key,
        }
    }
}

/// A message decoded without a destination type.
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    /// Registered shape of the payload structs.
    pub descriptor: Arc<StructDescriptor>,
    /// One value per struct in the payload.
    pub values: Vec<Value>,
}

impl Message {
    pub fn type_id(&self) -> u32 {
        self.header.type_id
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }
}

/// Frame `value` (of type `desc`) as one message.
pub fn encode_message<W: Write>(
    w: &mut Writer<W>,
    resolver: &dyn TypeIdResolver,
    cache: &CodecCache,
    desc: &TypeDescriptor,
    value: &Value,
) -> Result<Header> {
    let shape = Shape::of(desc)?;
    let key = shape.struct_key();
    let type_id = resolver
        .resolve_id(key)
        .ok_or_else(|| Error::TypeNotFound(key.to_string()))?;

    match shape {
        Shape::Struct(_) => {
            let codec = cache.scan(desc)?;
            let header = Header::new(type_id, 1);
            header.encode(w);
            codec.encode(w, value)?;
            Ok(header)
        }
        Shape::StructSlice(ref key) => {
            let Value::Slice(items) = value else {
                return Err(crate::types::mismatch("slice", value));
            };
            if items.is_empty() {
                return Err(Error::mismatch(
                    format!("non-empty []{key}"),
                    "empty slice",
                ));
            }
            let count = u32::try_from(items.len())
                .map_err(|_| Error::Protocol(format!("{} structs in one message", items.len())))?;
            let elem = desc
                .element_type()
                .ok_or_else(|| Error::mismatch("slice of struct", desc.key.as_str()))?;
            let codec = cache.scan(&elem)?;
            let header = Header::new(type_id, count);
            header.encode(w);
            for item in items {
                codec.encode(w, item)?;
            }
            Ok(header)
        }
    }
}

fn lookup(resolver: &dyn TypeIdResolver, header: &Header) -> Result<Arc<StructDescriptor>> {
    resolver
        .resolve_type(header.type_id)
        .ok_or_else(|| Error::TypeNotFound(format!("type id {}", header.type_id)))
}

/// Decode `count` consecutive structs into exactly `count` values.
fn decode_structs<R: WireRead + ?Sized>(
    r: &mut R,
    cache: &CodecCache,
    sd: &StructDescriptor,
    count: u32,
    limits: &Limits,
) -> Result<Vec<Value>> {
    let codec = cache.scan(&sd.descriptor)?;
    let count = check_len(r, u64::from(count), codec.min_wire_size(), limits)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let mut value = codec.zero_value();
        codec.decode(r, &mut value, limits)?;
        values.push(value);
    }
    Ok(values)
}

/// Decode one message into the shape of `dest`.
///
/// A struct destination takes a `count == 1` message; a slice destination
/// takes `count > 1`. The registered struct must be the destination's.
pub fn decode_message<R: WireRead + ?Sized>(
    r: &mut R,
    resolver: &dyn TypeIdResolver,
    cache: &CodecCache,
    dest: &TypeDescriptor,
    limits: &Limits,
) -> Result<Value> {
    let header = Header::decode(r)?;
    let sd = lookup(resolver, &header)?;
    let shape = Shape::of(dest)?;
    if shape.struct_key() != &sd.key {
        return Err(Error::mismatch(shape.struct_key().as_str(), sd.key.as_str()));
    }

    match (shape, header.count) {
        (Shape::Struct(_), 1) => {
            let mut values = decode_structs(r, cache, &sd, 1, limits)?;
            values
                .pop()
                .ok_or_else(|| Error::Protocol("empty payload".into()))
        }
        (Shape::StructSlice(_), n) if n > 1 => {
            decode_structs(r, cache, &sd, n, limits).map(Value::Slice)
        }
        (shape, n) => Err(Error::mismatch(
            match shape {
                Shape::Struct(key) => format!("{key} (count 1)"),
                Shape::StructSlice(key) => format!("[]{key} (count > 1)"),
            },
            format!("{} x{n}", sd.key),
        )),
    }
}

/// Decode one message using only the registry.
pub fn decode_dynamic<R: WireRead + ?Sized>(
    r: &mut R,
    resolver: &dyn TypeIdResolver,
    cache: &CodecCache,
    limits: &Limits,
) -> Result<Message> {
    let header = Header::decode(r)?;
    let descriptor = lookup(resolver, &header)?;
    if header.count == 0 {
        return Err(Error::Protocol(format!(
            "message for {} has count 0",
            descriptor.key
        )));
    }
    let values = decode_structs(r, cache, &descriptor, header.count, limits)?;
    Ok(Message {
        header,
        descriptor,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_DEPTH;
    use crate::registry::Registry;
    use crate::types::{PrimitiveKind, TypeDescriptorBuilder};
    use crate::wire::SliceReader;

    fn person() -> Arc<TypeDescriptor> {
        Arc::new(
            TypeDescriptorBuilder::new("Person")
                .string_field("name")
                .field("age", PrimitiveKind::I32)
                .build(),
        )
    }

    fn alice() -> Value {
        Value::Struct(vec![Value::from("Alice"), Value::I32(30)])
    }

    fn setup() -> (Registry, CodecCache) {
        let reg = Registry::new(DEFAULT_MAX_DEPTH);
        reg.add_struct(person()).expect("register");
        (reg, CodecCache::new())
    }

    fn frame(reg: &Registry, cache: &CodecCache, desc: &TypeDescriptor, v: &Value) -> Vec<u8> {
        let mut w = Writer::new(Vec::new());
        encode_message(&mut w, reg, cache, desc, v).expect("encode");
        w.finish().expect("finish")
    }

    #[test]
    fn test_single_struct_frame() {
        let (reg, cache) = setup();
        let bytes = frame(&reg, &cache, &person(), &alice());
        assert_eq!(
            bytes,
            vec![1, 0, 0, 1, 5, b'A', b'l', b'i', b'c', b'e', 60]
        );
        let mut r = SliceReader::new(&bytes);
        let v = decode_message(&mut r, &reg, &cache, &person(), &Limits::default())
            .expect("decode");
        assert_eq!(v, alice());
    }

    #[test]
    fn test_slice_frame_has_no_length_prefix() {
        let (reg, cache) = setup();
        let list = TypeDescriptor::slice(person());
        let bob = Value::Struct(vec![Value::from("Bob"), Value::I32(25)]);
        let value = Value::Slice(vec![alice(), bob.clone()]);
        let bytes = frame(&reg, &cache, &list, &value);
        assert_eq!(&bytes[..4], &[1, 0, 0, 2]);
        assert_eq!(&bytes[4..11], &[5, b'A', b'l', b'i', b'c', b'e', 60]);
        assert_eq!(&bytes[11..], &[3, b'B', b'o', b'b', 50]);

        let mut r = SliceReader::new(&bytes);
        let back = decode_message(&mut r, &reg, &cache, &list, &Limits::default())
            .expect("decode");
        assert_eq!(back, value);

        // A single-struct destination cannot take two structs.
        let mut r = SliceReader::new(&bytes);
        assert!(matches!(
            decode_message(&mut r, &reg, &cache, &person(), &Limits::default()),
            Err(Error::TypeMismatch { .. })
        ));

        // A slice destination needs more than one struct.
        let one = frame(&reg, &cache, &person(), &alice());
        let mut r = SliceReader::new(&one);
        assert!(matches!(
            decode_message(&mut r, &reg, &cache, &list, &Limits::default()),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_slice_is_rejected() {
        let (reg, cache) = setup();
        let mut w = Writer::new(Vec::new());
        let err = encode_message(
            &mut w,
            &reg,
            &cache,
            &TypeDescriptor::slice(person()),
            &Value::Slice(vec![]),
        );
        assert!(matches!(err, Err(Error::TypeMismatch { .. })));
        assert_eq!(w.written(), 0);
    }

    #[test]
    fn test_unregistered_type() {
        let (reg, cache) = setup();
        let other = TypeDescriptorBuilder::new("Other")
            .field("x", PrimitiveKind::U8)
            .build();
        let mut w = Writer::new(Vec::new());
        assert!(matches!(
            encode_message(&mut w, &reg, &cache, &other, &Value::Struct(vec![Value::U8(1)])),
            Err(Error::TypeNotFound(_))
        ));

        let mut r = SliceReader::new(&[1, 0, 9, 1]);
        assert!(matches!(
            decode_message(&mut r, &reg, &cache, &person(), &Limits::default()),
            Err(Error::TypeNotFound(_))
        ));
    }

    #[test]
    fn test_version_checks() {
        let (reg, cache) = setup();
        let mut bytes = frame(&reg, &cache, &person(), &alice());

        bytes[1] = 7;
        let mut r = SliceReader::new(&bytes);
        assert!(decode_message(&mut r, &reg, &cache, &person(), &Limits::default()).is_ok());

        bytes[0] = 2;
        let mut r = SliceReader::new(&bytes);
        assert!(matches!(
            decode_message(&mut r, &reg, &cache, &person(), &Limits::default()),
            Err(Error::Protocol(_))
        ));

        // A wrong major fails before anything else is read.
        let mut r = SliceReader::new(&[2]);
        assert!(matches!(
            decode_message(&mut r, &reg, &cache, &person(), &Limits::default()),
            Err(Error::Protocol(_))
        ));
        let mut r = SliceReader::new(&[1]);
        assert!(matches!(
            decode_message(&mut r, &reg, &cache, &person(), &Limits::default()),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_dynamic_decode() {
        let (reg, cache) = setup();
        let list = TypeDescriptor::slice(person());
        let value = Value::Slice(vec![alice(), alice(), alice()]);
        let bytes = frame(&reg, &cache, &list, &value);
        let mut r = SliceReader::new(&bytes);
        let msg = decode_dynamic(&mut r, &reg, &cache, &Limits::default()).expect("decode");
        assert_eq!(msg.type_id(), 0);
        assert_eq!(msg.count(), 3);
        assert_eq!(msg.descriptor.key.as_str(), "Person");
        assert_eq!(msg.values[2], alice());

        let mut r = SliceReader::new(&[1, 0, 0, 0]);
        assert!(matches!(
            decode_dynamic(&mut r, &reg, &cache, &Limits::default()),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_hostile_count() {
        let (reg, cache) = setup();
        // Claims u32::MAX structs with no payload.
        let bytes = [1, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        let mut r = SliceReader::new(&bytes);
        let list = TypeDescriptor::slice(person());
        assert!(decode_message(&mut r, &reg, &cache, &list, &Limits::default()).is_err());
    }

    #[test]
    fn test_shape_classification() {
        assert!(matches!(Shape::of(&person()), Ok(Shape::Struct(_))));
        assert!(matches!(
            Shape::of(&TypeDescriptor::slice(person())),
            Ok(Shape::StructSlice(_))
        ));
        assert!(Shape::of(&TypeDescriptor::primitive(PrimitiveKind::U8)).is_err());
        assert!(Shape::of(&TypeDescriptor::pointer(person())).is_err());
    }
}
