// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// One engine shared across threads, and engines isolated from each other.

use std::sync::Arc;
use std::thread;

use tinybin::{Config, Record, TinyBin};

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Sample {
    seq: u64,
    source: String,
    values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Record)]
struct Batch {
    samples: Vec<Sample>,
    tags: Vec<u16>,
}

const THREADS: usize = 8;
const ROUNDS: u64 = 200;

#[test]
fn test_shared_engine_across_threads() {
    let engine = Arc::new(TinyBin::with_config(Config::default().with_pool_capacity(2)));
    engine.add_struct::<Sample>().expect("register");
    engine.add_struct::<Batch>().expect("register");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for seq in 0..ROUNDS {
                    let sample = Sample {
                        seq,
                        source: format!("thread-{t}"),
                        values: vec![seq as f64; (seq % 5) as usize],
                    };
                    let bytes = engine.encode(&sample).expect("encode");
                    assert_eq!(engine.decode::<Sample>(&bytes).expect("decode"), sample);

                    let batch = Batch {
                        samples: vec![sample.clone(), sample],
                        tags: vec![t as u16, seq as u16],
                    };
                    let mut out = Vec::new();
                    engine.encode_to(&batch, &mut out).expect("encode");
                    assert_eq!(engine.decode_from::<Batch, _>(&out[..]).expect("decode"), batch);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread");
    }

    // Every worker went back, extra ones were dropped.
    let stats = engine.pool_stats();
    assert_eq!(stats.encoders_idle, 2);
    assert_eq!(stats.decoders_idle, 2);
}

#[test]
fn test_concurrent_first_use_builds_equivalent_codecs() {
    let engine = Arc::new(TinyBin::new());
    engine.add_struct::<Batch>().expect("register");

    let batch = Batch {
        samples: vec![Sample {
            seq: 1,
            source: "s".into(),
            values: vec![0.5],
        }],
        tags: vec![9],
    };
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let batch = batch.clone();
            thread::spawn(move || engine.encode(&batch).expect("encode"))
        })
        .collect();
    let outputs: Vec<Vec<u8>> = handles
        .into_iter()
        .map(|h| h.join().expect("worker thread"))
        .collect();
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));

    let stats = engine.cache().stats();
    assert_eq!(stats.entries, engine.cached_codecs());
}

#[test]
fn test_concurrent_registration_is_consistent() {
    let engine = Arc::new(TinyBin::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.add_struct::<Batch>().expect("register"))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("worker thread"), 1);
    }
    assert_eq!(engine.registry().len(), 2);
    assert_eq!(engine.type_id_of::<Sample>(), Some(0));
}

#[test]
fn test_engines_do_not_share_state() {
    let a = TinyBin::new();
    let b = TinyBin::new();
    a.add_struct::<Sample>().expect("register");
    b.add_struct::<Batch>().expect("register");

    let bytes = a.encode(&Sample::default()).expect("encode");
    assert_eq!(b.cached_codecs(), 0);
    assert_eq!(a.type_id_of::<Batch>(), None);
    // b knows Sample only as part of Batch; the frame is still not a Batch.
    assert_eq!(b.type_id_of::<Sample>(), Some(0));
    assert!(b.decode::<Batch>(&bytes).is_err());
}
