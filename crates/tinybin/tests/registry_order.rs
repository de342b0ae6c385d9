// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Positional type ids: registration order, idempotence, depth limits and
// what happens when peers disagree on the order.

use std::sync::Arc;

use tinybin::types::{FieldDescriptor, Kind, PrimitiveKind, TypeDescriptor};
use tinybin::{Config, Error, Record, Reflect, TinyBin, TypeDescriptorBuilder, Value};

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Alpha {
    x: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Beta {
    y: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Level1 {
    v: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Level2 {
    inner: Level1,
}

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Level3 {
    inner: Level2,
}

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Tree {
    value: i32,
    children: Vec<Tree>,
}

#[test]
fn test_order_decides_ids() {
    let ab = TinyBin::new();
    assert_eq!(
        ab.add_structs(&[Alpha::descriptor(), Beta::descriptor()]).ok(),
        Some(vec![0, 1])
    );
    // Registering again changes nothing.
    assert_eq!(
        ab.add_structs(&[Alpha::descriptor(), Beta::descriptor()]).ok(),
        Some(vec![0, 1])
    );
    assert_eq!(ab.registry().len(), 2);

    let ba = TinyBin::new();
    ba.add_structs(&[Beta::descriptor(), Alpha::descriptor()])
        .expect("register");
    assert_eq!(ab.type_id_of::<Alpha>(), Some(0));
    assert_eq!(ba.type_id_of::<Alpha>(), Some(1));
}

#[test]
fn test_diverging_peers() {
    let sender = TinyBin::new();
    sender
        .add_structs(&[Alpha::descriptor(), Beta::descriptor()])
        .expect("register");
    let receiver = TinyBin::new();
    receiver
        .add_structs(&[Beta::descriptor(), Alpha::descriptor()])
        .expect("register");

    let bytes = sender.encode(&Alpha { x: 5 }).expect("encode");

    // A typed decode notices the mismatch.
    assert!(matches!(
        receiver.decode::<Alpha>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));

    // A registry-driven decode of a same-shaped struct silently succeeds
    // with the wrong type.
    let msg = receiver.decode_message(&bytes).expect("decode");
    assert!(msg.descriptor.key.as_str().ends_with("Beta"));
    assert_eq!(msg.values, vec![Value::Struct(vec![Value::U32(5)])]);
}

#[test]
fn test_depth_limit_from_config() {
    let config = Config::default().with_max_depth(2);

    let engine = TinyBin::with_config(config.clone());
    assert_eq!(engine.add_struct::<Level2>().ok(), Some(1));

    let engine = TinyBin::with_config(config.clone());
    match engine.add_struct::<Level3>() {
        Err(Error::MaxDepthExceeded { max, type_name }) => {
            assert_eq!(max, 2);
            assert!(type_name.ends_with("Level1"));
        }
        other => panic!("expected MaxDepthExceeded, got {other:?}"),
    }
    // Nothing from the failed call is kept.
    assert!(engine.registry().is_empty());

    // Structs already registered are not walked again, so the limit applies
    // to what a call adds.
    let engine = TinyBin::with_config(config);
    engine.add_struct::<Level2>().expect("register");
    assert_eq!(engine.add_struct::<Level3>().ok(), Some(2));
}

#[test]
fn test_recursive_type() {
    let engine = TinyBin::new();
    assert!(matches!(
        engine.add_struct::<Tree>(),
        Err(Error::MaxDepthExceeded { .. })
    ));
    assert!(engine.registry().is_empty());

    let leaf = Tree {
        value: 1,
        children: Vec::new(),
    };
    assert!(matches!(engine.marshal(&leaf), Err(Error::UnsupportedType(_))));
    assert_eq!(engine.cached_codecs(), 0);
}

#[test]
fn test_runtime_described_structs() {
    let engine = TinyBin::new();
    let point = Arc::new(
        TypeDescriptorBuilder::new("Point")
            .field("x", PrimitiveKind::F64)
            .field("y", PrimitiveKind::F64)
            .build(),
    );
    let path = Arc::new(
        TypeDescriptorBuilder::new("Path")
            .string_field("name")
            .field_with_type("points", Arc::new(TypeDescriptor::slice(point.clone())))
            .skipped_field("cache", PrimitiveKind::U64)
            .build(),
    );
    assert_eq!(engine.add_structs(&[path.clone()]).ok(), Some(vec![1]));

    let sd = engine.registry().get(1).expect("registered");
    let kinds: Vec<_> = sd.fields.iter().map(|f| (f.name.as_str(), f.kind)).collect();
    assert_eq!(kinds, vec![("name", Kind::String), ("points", Kind::Slice)]);
    assert_eq!(sd.fields[1].nested_id, Some(0));

    let value = Value::Struct(vec![
        Value::from("route"),
        Value::Slice(vec![
            Value::Struct(vec![Value::F64(1.0), Value::F64(2.0)]),
            Value::Struct(vec![Value::F64(-3.5), Value::F64(0.25)]),
        ]),
        Value::Null,
    ]);
    let bytes = engine.encode_value(&path, &value).expect("encode");
    assert_eq!(&bytes[..4], &[1, 0, 1, 1]);
    assert_eq!(engine.decode_value(&path, &bytes).expect("decode"), value);
}

#[test]
fn test_opaque_fields_are_unsupported() {
    let engine = TinyBin::new();
    let odd = Arc::new(TypeDescriptor::struct_type(
        "Odd",
        vec![
            FieldDescriptor::new("ok", TypeDescriptor::primitive(PrimitiveKind::U8)),
            FieldDescriptor::new(
                "table",
                TypeDescriptor::opaque("map[string]int", tinybin::types::OpaqueKind::Map),
            ),
        ],
    ));
    // Registration only looks for nested structs.
    assert_eq!(engine.add_structs(&[odd.clone()]).ok(), Some(vec![0]));
    let value = Value::Struct(vec![Value::U8(1), Value::Null]);
    match engine.encode_value(&odd, &value) {
        Err(Error::UnsupportedType(msg)) => assert!(msg.contains("table")),
        other => panic!("expected UnsupportedType, got {other:?}"),
    }
}
