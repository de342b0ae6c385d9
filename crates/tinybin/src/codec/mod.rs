// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-directed codecs.
//!
//! A [`Codec`] is the encode/decode strategy for one type shape. Codec trees
//! are built once per type by the scanner, then shared immutably; all kind
//! dispatch happens at construction time, encode/decode just walk the tree.

mod cache;
mod scanner;

pub use cache::{CacheStats, CodecCache};

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{mismatch, PrimitiveKind, TypeKey, Value};
use crate::wire::{WireRead, Writer};

/// Decode-time resource limits.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Largest collection length accepted from the wire.
    pub max_collection_len: usize,
    /// Largest length accepted for elements with no wire footprint.
    pub max_zero_sized_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_collection_len: crate::config::DEFAULT_MAX_COLLECTION_LEN,
            max_zero_sized_len: crate::config::DEFAULT_MAX_ZERO_SIZED_LEN,
        }
    }
}

/// One field of a struct codec.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCodec {
    /// Declaration index of the field.
    pub index: usize,
    pub codec: Arc<Codec>,
}

/// Ordered field codecs of a struct; skipped fields have no entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StructCodec {
    pub key: TypeKey,
    /// Declared field count, skipped fields included.
    pub field_count: usize,
    pub fields: Vec<FieldCodec>,
}

/// Encode/decode strategy for one type shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Codec {
    /// Integers (varint) and floats (fixed-width).
    Primitive(PrimitiveKind),
    String,
    Bool,
    Struct(StructCodec),
    /// Fixed length, taken from the type and never written.
    Array { length: usize, element: Arc<Codec> },
    /// Generic slice, element codec per item.
    Slice(Arc<Codec>),
    /// Slice of nullable elements; the codec is the pointee's.
    SliceOfPointer(Arc<Codec>),
    Pointer(Arc<Codec>),
    Bytes,
    Bools,
    /// Signed integer slice, one zigzag varint per item.
    VarintSlice(PrimitiveKind),
    /// Unsigned integer slice, one varint per item.
    UvarintSlice(PrimitiveKind),
}

impl Codec {
    /// Write `value` according to this codec.
    pub fn encode<W: std::io::Write>(&self, w: &mut Writer<W>, value: &Value) -> Result<()> {
        match self {
            Self::Primitive(kind) => encode_primitive(*kind, w, value),
            Self::String => match value {
                Value::String(s) => {
                    w.write_string(s);
                    Ok(())
                }
                other => Err(mismatch("string", other)),
            },
            Self::Bool => match value {
                Value::Bool(b) => {
                    w.write_bool(*b);
                    Ok(())
                }
                other => Err(mismatch("bool", other)),
            },
            Self::Struct(sc) => {
                let Value::Struct(fields) = value else {
                    return Err(mismatch(sc.key.as_str(), value));
                };
                if fields.len() != sc.field_count {
                    return Err(Error::FieldAccess(format!(
                        "{}: expected {} fields, found {}",
                        sc.key,
                        sc.field_count,
                        fields.len()
                    )));
                }
                for fc in &sc.fields {
                    fc.codec.encode(w, &fields[fc.index])?;
                }
                Ok(())
            }
            Self::Array { length, element } => {
                let Value::Array(items) = value else {
                    return Err(mismatch("array", value));
                };
                if items.len() != *length {
                    return Err(Error::FieldAccess(format!(
                        "expected array of {length}, found {}",
                        items.len()
                    )));
                }
                items.iter().try_for_each(|item| element.encode(w, item))
            }
            Self::Slice(element) => {
                let Value::Slice(items) = value else {
                    return Err(mismatch("slice", value));
                };
                w.write_uvarint(items.len() as u64);
                items.iter().try_for_each(|item| element.encode(w, item))
            }
            Self::SliceOfPointer(element) => {
                let Value::Slice(items) = value else {
                    return Err(mismatch("slice", value));
                };
                w.write_uvarint(items.len() as u64);
                for item in items {
                    match item {
                        Value::Pointer(None) | Value::Null => w.write_bool(true),
                        Value::Pointer(Some(inner)) => {
                            w.write_bool(false);
                            element.encode(w, inner)?;
                        }
                        other => return Err(mismatch("pointer", other)),
                    }
                }
                Ok(())
            }
            Self::Pointer(element) => match value {
                Value::Pointer(None) | Value::Null => {
                    w.write_bool(true);
                    Ok(())
                }
                Value::Pointer(Some(inner)) => {
                    w.write_bool(false);
                    element.encode(w, inner)
                }
                other => Err(mismatch("pointer", other)),
            },
            Self::Bytes => match value {
                Value::Bytes(bytes) => {
                    w.write_bytes(bytes);
                    Ok(())
                }
                other => Err(mismatch("bytes", other)),
            },
            Self::Bools => match value {
                Value::Bools(bools) => {
                    w.write_uvarint(bools.len() as u64);
                    for b in bools {
                        w.write_bool(*b);
                    }
                    Ok(())
                }
                other => Err(mismatch("bools", other)),
            },
            Self::VarintSlice(kind) => match value {
                Value::Ints(ints) => {
                    w.write_uvarint(ints.len() as u64);
                    for &v in ints {
                        check_signed_range(*kind, v)?;
                        w.write_varint(v);
                    }
                    Ok(())
                }
                other => Err(mismatch("ints", other)),
            },
            Self::UvarintSlice(kind) => match value {
                Value::Uints(uints) => {
                    w.write_uvarint(uints.len() as u64);
                    for &v in uints {
                        check_unsigned_range(*kind, v)?;
                        w.write_uvarint(v);
                    }
                    Ok(())
                }
                other => Err(mismatch("uints", other)),
            },
        }
    }

    /// Read into `out`, reusing its allocations where the shape already matches.
    ///
    /// On error `out` may be partially updated; callers that need atomicity
    /// decode into a scratch value.
    pub fn decode<R: WireRead + ?Sized>(
        &self,
        r: &mut R,
        out: &mut Value,
        limits: &Limits,
    ) -> Result<()> {
        match self {
            Self::Primitive(kind) => *out = decode_primitive(*kind, r)?,
            Self::String => {
                let len = read_len(r, 1, limits)?;
                *out = Value::String(r.read_string_body(len)?);
            }
            Self::Bool => *out = Value::Bool(r.read_bool()?),
            Self::Struct(sc) => {
                let reuse = matches!(out, Value::Struct(f) if f.len() == sc.field_count);
                if !reuse {
                    *out = self.zero_value();
                }
                if let Value::Struct(fields) = out {
                    for fc in &sc.fields {
                        fc.codec.decode(r, &mut fields[fc.index], limits)?;
                    }
                }
            }
            Self::Array { length, element } => {
                let reuse = matches!(out, Value::Array(items) if items.len() == *length);
                if !reuse {
                    *out = self.zero_value();
                }
                if let Value::Array(items) = out {
                    for item in items.iter_mut() {
                        element.decode(r, item, limits)?;
                    }
                }
            }
            Self::Slice(element) => {
                let len = read_len(r, element.min_wire_size(), limits)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    let mut item = element.zero_value();
                    element.decode(r, &mut item, limits)?;
                    items.push(item);
                }
                *out = Value::Slice(items);
            }
            Self::SliceOfPointer(element) => {
                let len = read_len(r, 1, limits)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    if r.read_bool()? {
                        items.push(Value::Pointer(None));
                    } else {
                        let mut item = element.zero_value();
                        element.decode(r, &mut item, limits)?;
                        items.push(Value::Pointer(Some(Box::new(item))));
                    }
                }
                *out = Value::Slice(items);
            }
            Self::Pointer(element) => {
                if r.read_bool()? {
                    *out = Value::Pointer(None);
                } else if let Value::Pointer(Some(inner)) = out {
                    element.decode(r, inner, limits)?;
                } else {
                    let mut inner = element.zero_value();
                    element.decode(r, &mut inner, limits)?;
                    *out = Value::Pointer(Some(Box::new(inner)));
                }
            }
            Self::Bytes => {
                let len = read_len(r, 1, limits)?;
                *out = Value::Bytes(r.read_byte_vec(len)?);
            }
            Self::Bools => {
                let len = read_len(r, 1, limits)?;
                let mut bools = Vec::with_capacity(len);
                for _ in 0..len {
                    bools.push(r.read_bool()?);
                }
                *out = Value::Bools(bools);
            }
            Self::VarintSlice(kind) => {
                let len = read_len(r, 1, limits)?;
                let mut ints = Vec::with_capacity(len);
                for _ in 0..len {
                    ints.push(read_signed(*kind, r)?);
                }
                *out = Value::Ints(ints);
            }
            Self::UvarintSlice(kind) => {
                let len = read_len(r, 1, limits)?;
                let mut uints = Vec::with_capacity(len);
                for _ in 0..len {
                    uints.push(read_unsigned(*kind, r)?);
                }
                *out = Value::Uints(uints);
            }
        }
        Ok(())
    }

    /// Zero value of the shape this codec handles.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Primitive(kind) => Value::zero_primitive(*kind),
            Self::String => Value::String(String::new()),
            Self::Bool => Value::Bool(false),
            Self::Struct(sc) => {
                let mut fields = vec![Value::Null; sc.field_count];
                for fc in &sc.fields {
                    fields[fc.index] = fc.codec.zero_value();
                }
                Value::Struct(fields)
            }
            Self::Array { length, element } => {
                Value::Array((0..*length).map(|_| element.zero_value()).collect())
            }
            Self::Slice(_) | Self::SliceOfPointer(_) => Value::Slice(Vec::new()),
            Self::Pointer(_) => Value::Pointer(None),
            Self::Bytes => Value::Bytes(Vec::new()),
            Self::Bools => Value::Bools(Vec::new()),
            Self::VarintSlice(_) => Value::Ints(Vec::new()),
            Self::UvarintSlice(_) => Value::Uints(Vec::new()),
        }
    }

    /// Fewest bytes one encoded value can occupy.
    pub fn min_wire_size(&self) -> usize {
        match self {
            Self::Primitive(PrimitiveKind::F32) => 4,
            Self::Primitive(PrimitiveKind::F64) => 8,
            Self::Struct(sc) => sc.fields.iter().map(|f| f.codec.min_wire_size()).sum(),
            Self::Array { length, element } => length.saturating_mul(element.min_wire_size()),
            _ => 1,
        }
    }

    /// Struct identity, if this is a struct codec.
    pub fn struct_key(&self) -> Option<&TypeKey> {
        match self {
            Self::Struct(sc) => Some(&sc.key),
            _ => None,
        }
    }
}

fn encode_primitive<W: std::io::Write>(
    kind: PrimitiveKind,
    w: &mut Writer<W>,
    value: &Value,
) -> Result<()> {
    match (kind, value) {
        (PrimitiveKind::I8, Value::I8(v)) => w.write_varint(i64::from(*v)),
        (PrimitiveKind::I16, Value::I16(v)) => w.write_varint(i64::from(*v)),
        (PrimitiveKind::I32, Value::I32(v)) => w.write_varint(i64::from(*v)),
        (PrimitiveKind::I64, Value::I64(v)) => w.write_varint(*v),
        (PrimitiveKind::U8, Value::U8(v)) => w.write_uvarint(u64::from(*v)),
        (PrimitiveKind::U16, Value::U16(v)) => w.write_uvarint(u64::from(*v)),
        (PrimitiveKind::U32, Value::U32(v)) => w.write_uvarint(u64::from(*v)),
        (PrimitiveKind::U64, Value::U64(v)) => w.write_uvarint(*v),
        (PrimitiveKind::F32, Value::F32(v)) => w.write_f32(*v),
        (PrimitiveKind::F64, Value::F64(v)) => w.write_f64(*v),
        (PrimitiveKind::Bool, Value::Bool(v)) => w.write_bool(*v),
        (PrimitiveKind::String, Value::String(s)) => w.write_string(s),
        (kind, other) => return Err(mismatch(kind.name(), other)),
    }
    Ok(())
}

fn decode_primitive<R: WireRead + ?Sized>(kind: PrimitiveKind, r: &mut R) -> Result<Value> {
    Ok(match kind {
        PrimitiveKind::I8 => Value::I8(narrow(r.read_varint32()?)?),
        PrimitiveKind::I16 => Value::I16(narrow(r.read_varint32()?)?),
        PrimitiveKind::I32 => Value::I32(r.read_varint32()?),
        PrimitiveKind::I64 => Value::I64(r.read_varint64()?),
        PrimitiveKind::U8 => Value::U8(narrow(r.read_uvarint32()?)?),
        PrimitiveKind::U16 => Value::U16(narrow(r.read_uvarint32()?)?),
        PrimitiveKind::U32 => Value::U32(r.read_uvarint32()?),
        PrimitiveKind::U64 => Value::U64(r.read_uvarint64()?),
        PrimitiveKind::F32 => Value::F32(r.read_f32()?),
        PrimitiveKind::F64 => Value::F64(r.read_f64()?),
        PrimitiveKind::Bool => Value::Bool(r.read_bool()?),
        PrimitiveKind::String => Value::String(r.read_string()?),
    })
}

/// Narrow a 32-bit varint to its declared width.
fn narrow<S: Copy, T: TryFrom<S>>(v: S) -> Result<T> {
    T::try_from(v).map_err(|_| Error::VarintOverflow)
}

fn read_signed<R: WireRead + ?Sized>(kind: PrimitiveKind, r: &mut R) -> Result<i64> {
    if kind.is_wide() {
        return r.read_varint64();
    }
    let v = r.read_varint32()?;
    check_signed_range(kind, i64::from(v)).map_err(|_| Error::VarintOverflow)?;
    Ok(i64::from(v))
}

fn read_unsigned<R: WireRead + ?Sized>(kind: PrimitiveKind, r: &mut R) -> Result<u64> {
    if kind.is_wide() {
        return r.read_uvarint64();
    }
    let v = r.read_uvarint32()?;
    check_unsigned_range(kind, u64::from(v)).map_err(|_| Error::VarintOverflow)?;
    Ok(u64::from(v))
}

fn check_signed_range(kind: PrimitiveKind, v: i64) -> Result<()> {
    let ok = match kind {
        PrimitiveKind::I8 => i8::try_from(v).is_ok(),
        PrimitiveKind::I16 => i16::try_from(v).is_ok(),
        PrimitiveKind::I32 => i32::try_from(v).is_ok(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::FieldAccess(format!("{v} out of range for {}", kind.name())))
    }
}

fn check_unsigned_range(kind: PrimitiveKind, v: u64) -> Result<()> {
    let ok = match kind {
        PrimitiveKind::U8 => u8::try_from(v).is_ok(),
        PrimitiveKind::U16 => u16::try_from(v).is_ok(),
        PrimitiveKind::U32 => u32::try_from(v).is_ok(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::FieldAccess(format!("{v} out of range for {}", kind.name())))
    }
}

/// Read a collection length and check it against the limits and, when known,
/// the input still available.
fn read_len<R: WireRead + ?Sized>(r: &mut R, min_size: usize, limits: &Limits) -> Result<usize> {
    let raw = r.read_uvarint64()?;
    check_len(r, raw, min_size, limits)
}

/// Validate a wire-supplied element count before anything is allocated for it.
pub(crate) fn check_len<R: WireRead + ?Sized>(
    r: &R,
    raw: u64,
    min_size: usize,
    limits: &Limits,
) -> Result<usize> {
    let len = usize::try_from(raw)
        .ok()
        .filter(|len| *len <= limits.max_collection_len)
        .ok_or_else(|| {
            Error::Protocol(format!(
                "collection length {raw} exceeds limit {}",
                limits.max_collection_len
            ))
        })?;
    // Zero-sized elements cost nothing to read but still cost a Value each.
    if min_size == 0 && len > limits.max_zero_sized_len {
        return Err(Error::Protocol(format!(
            "length {len} of zero-sized elements exceeds limit {}",
            limits.max_zero_sized_len
        )));
    }
    if let Some(have) = r.remaining() {
        if min_size > 0 && len > have / min_size {
            return Err(Error::UnexpectedEof {
                need: len.saturating_mul(min_size),
                have,
            });
        }
    }
    Ok(len)
}
