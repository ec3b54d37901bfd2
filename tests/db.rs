//! End-to-end tests against the public `Db` facade, covering the concrete scenarios and
//! round-trip properties from the specification.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use picokv::{Db, Options};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn options(db_name: &str, key_size_max: u16, hash_buckets: u32) -> Options {
    Options {
        db_name: db_name.to_string(),
        key_size_max,
        data_size_max: 4096,
        hash_buckets,
        items_max: 10_000,
    }
}

fn scratch_path() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("testdb");
    std::mem::forget(dir);
    path
}

#[test]
fn happy_path_scenario() {
    let path = scratch_path();
    let mut db = Db::create(&path, options("happy", 64, 128)).unwrap();
    db.write(b"misakawa", b"mikoto").unwrap();
    assert_eq!(db.read(b"misakawa").unwrap(), Some(b"mikoto".to_vec()));
    db.delete(b"misakawa").unwrap();
    assert_eq!(db.read(b"misakawa").unwrap(), None);
}

#[test]
fn reopen_scenario() {
    let path = scratch_path();
    let opts = options("lambda", 64, 128);
    {
        let mut db = Db::create(&path, opts.clone()).unwrap();
        db.write(b"Lisp", b"LambdaExpression").unwrap();
    }
    let mut db = Db::open(&path).unwrap();
    assert_eq!(db.options(), &opts);
    assert_eq!(
        db.read(b"Lisp").unwrap(),
        Some(b"LambdaExpression".to_vec())
    );
}

const VALUE_POOL: [&str; 18] = [
    "aria", "banshee", "cicada", "diorama", "ephemeral", "foxglove", "gossamer", "halcyon",
    "ibis", "jubilee", "kelvin", "lumen", "mosaic", "nimbus", "opaline", "paragon", "quartz",
    "riverine",
];

#[test]
fn load_scenario_thousand_keys() {
    let path = scratch_path();
    let mut db = Db::create(&path, options("load", 8, 128)).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    let mut expected = HashMap::new();
    for i in 0..1000u32 {
        let key = format!("{:03}", i);
        let value = VALUE_POOL[rng.gen_range(0..VALUE_POOL.len())];
        db.write(key.as_bytes(), value.as_bytes()).unwrap();
        expected.insert(key, value);
    }

    for (key, value) in &expected {
        assert_eq!(
            db.read(key.as_bytes()).unwrap(),
            Some(value.as_bytes().to_vec())
        );
    }
}

#[test]
fn mixed_workload_scenario() {
    let path = scratch_path();
    let mut db = Db::create(&path, options("mixed", 8, 128)).unwrap();
    let mut rng = StdRng::seed_from_u64(2);

    let mut expected = HashMap::new();
    let mut original_keys = Vec::new();
    for i in 0..1000u32 {
        let key = format!("{:03}", i);
        let value = VALUE_POOL[rng.gen_range(0..VALUE_POOL.len())];
        db.write(key.as_bytes(), value.as_bytes()).unwrap();
        expected.insert(key.clone(), value);
        original_keys.push(key);
    }

    original_keys.shuffle(&mut rng);
    let deleted: HashSet<String> = original_keys.into_iter().take(128).collect();
    for key in &deleted {
        db.delete(key.as_bytes()).unwrap();
        expected.remove(key);
    }

    let alphabet: Vec<char> = ('A'..='Z').collect();
    let mut new_keys = Vec::new();
    for digit in 0..10u8 {
        for &letter in &alphabet {
            if new_keys.len() >= 260 {
                break;
            }
            new_keys.push(format!("{}{}", digit, letter));
        }
    }
    new_keys.truncate(260);
    for key in &new_keys {
        let value = VALUE_POOL[rng.gen_range(0..VALUE_POOL.len())];
        db.write(key.as_bytes(), value.as_bytes()).unwrap();
        expected.insert(key.clone(), value);
    }

    for key in &deleted {
        assert_eq!(db.read(key.as_bytes()).unwrap(), None, "key {} should be gone", key);
    }
    for (key, value) in &expected {
        assert_eq!(
            db.read(key.as_bytes()).unwrap(),
            Some(value.as_bytes().to_vec()),
            "key {} should read its stored value",
            key
        );
    }
}

#[test]
fn slot_reuse_scenario() {
    let path = scratch_path();
    // A single-bucket database, per the chain-only testing convention for `hash_buckets = 0`.
    let mut db = Db::create(&path, options("slots", 8, 0)).unwrap();

    let mut keys = Vec::new();
    for i in 0..32u32 {
        let key = format!("s{:02}", i);
        db.write(key.as_bytes(), b"v").unwrap();
        keys.push(key);
    }
    for key in &keys[0..4] {
        db.delete(key.as_bytes()).unwrap();
    }
    for i in 32..40u32 {
        db.write(format!("s{:02}", i).as_bytes(), b"v").unwrap();
    }

    let record_size = db.options().record_size() as u64;
    let header_size = 4 * (1 + 1); // free-list head + the single forced bucket head
    let expected = header_size + record_size * (32 - 4 + 8);
    assert_eq!(db.index_size().unwrap(), expected);
}

#[test]
fn data_reuse_scenario() {
    let path = scratch_path();
    let mut db = Db::create(&path, options("heap", 16, 64)).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    let mut live: Vec<(String, Vec<u8>)> = Vec::new();
    for i in 0..32u32 {
        let key = format!("d{:02}", i);
        let len = rng.gen_range(32..96);
        let value: Vec<u8> = (0..len).map(|_| rng.gen_range(1..=255)).collect();
        db.write(key.as_bytes(), &value).unwrap();
        live.push((key, value));
    }

    for (key, _) in &live[0..8] {
        db.delete(key.as_bytes()).unwrap();
    }
    live.drain(0..8);

    let mut fresh = Vec::new();
    for i in 32..40u32 {
        let key = format!("d{:02}", i);
        let len = rng.gen_range(32..96);
        let value: Vec<u8> = (0..len).map(|_| rng.gen_range(1..=255)).collect();
        db.write(key.as_bytes(), &value).unwrap();
        fresh.push((key, value));
    }

    for (key, value) in live.iter().chain(fresh.iter()) {
        assert_eq!(db.read(key.as_bytes()).unwrap(), Some(value.clone()));
    }
}

#[test]
fn write_write_read_returns_latest_value() {
    let path = scratch_path();
    let mut db = Db::create(&path, options("ww", 16, 32)).unwrap();
    db.write(b"k", b"v1").unwrap();
    db.write(b"k", b"v2").unwrap();
    assert_eq!(db.read(b"k").unwrap(), Some(b"v2".to_vec()));
}

#[test]
fn repeated_write_delete_bounds_index_size() {
    let path = scratch_path();
    let mut db = Db::create(&path, options("churn", 16, 1)).unwrap();
    db.write(b"k", b"v").unwrap();
    db.delete(b"k").unwrap();
    let size_after_first = db.index_size().unwrap();

    for _ in 0..50 {
        db.write(b"k", b"v").unwrap();
        db.delete(b"k").unwrap();
    }
    assert_eq!(db.index_size().unwrap(), size_after_first);
}
