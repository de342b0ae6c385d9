// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Byte-exact envelope scenarios: header layout, slice framing, nil pointers,
// version handling and malformed input.

use tinybin::{Error, Record, TinyBin, PROTOCOL_MAJOR, PROTOCOL_MINOR};

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Person {
    name: String,
    age: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Link {
    id: u8,
    next: Option<Box<Person>>,
}

fn person(name: &str, age: i32) -> Person {
    Person {
        name: name.into(),
        age,
    }
}

fn engine() -> TinyBin {
    let engine = TinyBin::new();
    assert_eq!(engine.add_struct::<Person>().expect("register Person"), 0);
    assert_eq!(engine.add_struct::<Link>().expect("register Link"), 1);
    engine
}

#[test]
fn test_person_scenario() {
    let engine = engine();
    let bytes = engine.encode(&person("Alice", 30)).expect("encode");
    assert_eq!(
        bytes,
        [PROTOCOL_MAJOR, PROTOCOL_MINOR, 0, 1, 5, b'A', b'l', b'i', b'c', b'e', 60]
    );
    assert_eq!(engine.decode::<Person>(&bytes).expect("decode"), person("Alice", 30));
}

#[test]
fn test_slice_scenario() {
    let engine = engine();
    let people = vec![person("Alice", 30), person("Bob", 25)];
    let bytes = engine.encode(&people).expect("encode");

    let mut expected = vec![1, 0, 0, 2];
    expected.extend_from_slice(&[5, b'A', b'l', b'i', b'c', b'e', 60]);
    expected.extend_from_slice(&[3, b'B', b'o', b'b', 50]);
    assert_eq!(bytes, expected);

    let back: Vec<Person> = engine.decode(&bytes).expect("decode");
    assert_eq!(back, people);
}

#[test]
fn test_nil_pointer_scenario() {
    let engine = engine();
    let nil = Link { id: 7, next: None };
    let bytes = engine.encode(&nil).expect("encode");
    assert_eq!(bytes, [1, 0, 1, 1, 7, 0x01]);
    assert_eq!(engine.decode::<Link>(&bytes).expect("decode"), nil);

    let set = Link {
        id: 7,
        next: Some(Box::new(person("Alice", 30))),
    };
    let bytes = engine.encode(&set).expect("encode");
    assert_eq!(&bytes[4..6], &[7, 0x00]);
    assert_eq!(engine.decode::<Link>(&bytes).expect("decode"), set);
}

#[test]
fn test_empty_slice_is_rejected() {
    let engine = engine();
    assert!(matches!(
        engine.encode(&Vec::<Person>::new()),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_single_element_slice_is_a_struct_frame() {
    let engine = engine();
    let one = vec![person("Solo", 1)];
    let bytes = engine.encode(&one).expect("encode");
    assert_eq!(&bytes[..4], &[1, 0, 0, 1]);
    // count 1 only ever decodes into a bare struct.
    assert!(matches!(
        engine.decode::<Vec<Person>>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(engine.decode::<Person>(&bytes).expect("decode"), one[0]);

    let alone = engine.encode(&person("A", 1)).expect("encode");
    assert!(matches!(
        engine.decode::<Vec<Person>>(&alone),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_unregistered_type() {
    let engine = TinyBin::new();
    assert!(matches!(
        engine.encode(&person("Alice", 30)),
        Err(Error::TypeNotFound(_))
    ));
    assert!(matches!(
        engine.decode::<Person>(&[1, 0, 0, 1, 0, 0]),
        Err(Error::TypeNotFound(_))
    ));
}

#[test]
fn test_version_handling() {
    let engine = engine();
    let mut bytes = engine.encode(&person("Alice", 30)).expect("encode");

    bytes[1] = PROTOCOL_MINOR + 3;
    assert_eq!(engine.decode::<Person>(&bytes).expect("decode"), person("Alice", 30));

    bytes[0] = PROTOCOL_MAJOR + 1;
    assert!(matches!(engine.decode::<Person>(&bytes), Err(Error::Protocol(_))));
    // The major byte alone is enough to refuse the frame.
    assert!(matches!(
        engine.decode::<Person>(&[PROTOCOL_MAJOR + 1]),
        Err(Error::Protocol(_))
    ));
}

#[test]
fn test_header_varint_bounds() {
    let engine = engine();
    // Type id with a sixth byte: too long for 32 bits.
    let long = [1, 0, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00, 1];
    assert!(matches!(engine.decode::<Person>(&long), Err(Error::VarintOverflow)));

    // Input ends inside the type id.
    assert!(matches!(
        engine.decode::<Person>(&[1, 0, 0x80]),
        Err(Error::VarintTruncated)
    ));
}

#[test]
fn test_wrong_destination() {
    let engine = engine();
    let bytes = engine.encode(&person("Alice", 30)).expect("encode");
    assert!(matches!(
        engine.decode::<Link>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));

    let two = engine
        .encode(&vec![person("A", 1), person("B", 2)])
        .expect("encode");
    assert!(matches!(
        engine.decode::<Person>(&two),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn test_truncated_input_never_panics() {
    let engine = engine();
    let people = vec![person("Alice", 30), person("Bob", -25), person("", 0)];
    let bytes = engine.encode(&people).expect("encode");
    for cut in 0..bytes.len() {
        assert!(
            engine.decode::<Vec<Person>>(&bytes[..cut]).is_err(),
            "prefix of {cut} bytes decoded"
        );
    }
}

#[test]
fn test_corrupted_input_never_panics() {
    let engine = engine();
    let bytes = engine
        .encode(&Link {
            id: 1,
            next: Some(Box::new(person("Alice", 30))),
        })
        .expect("encode");

    let mut rng = fastrand::Rng::with_seed(0x7157);
    for _ in 0..2_000 {
        let mut noisy = bytes.clone();
        let at = rng.usize(..noisy.len());
        noisy[at] = rng.u8(..);
        // Any outcome but a panic is fine.
        let _ = engine.decode::<Link>(&noisy);
        let _ = engine.decode_message(&noisy);
    }
}
