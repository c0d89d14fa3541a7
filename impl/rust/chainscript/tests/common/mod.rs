//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use chainscript::{Evidence, Link, LinkBuilder, LinkReference, Segment};
use rand_core::{OsRng, RngCore};

pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    buf
}

pub fn random_hash() -> Vec<u8> {
    random_bytes(32)
}

pub fn random_string(n: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    random_bytes(n)
        .into_iter()
        .map(|b| ALPHABET[b as usize % ALPHABET.len()] as char)
        .collect()
}

/// A fixed 2048-bit RSA key, PKCS#8 PEM.
pub const RSA_PRIVATE_PEM: &str = include_str!("../fixtures/rsa-2048.pem");

/// A 32-byte Ed25519 seed usable as a private key.
pub fn random_key() -> Vec<u8> {
    random_bytes(32)
}

pub fn random_link() -> Link {
    LinkBuilder::new(&random_string(8), &random_string(12))
        .with_action(random_string(6))
        .build()
        .expect("random link")
}

pub fn random_segment() -> Segment {
    random_link().segmentify().expect("segmentify")
}

pub fn random_evidence() -> Evidence {
    Evidence::new("0.1.0", random_string(6), random_string(6), random_bytes(16))
        .expect("random evidence")
}

/// The link used across the hash-sensitivity and end-to-end tests.
pub fn reference_builder() -> LinkBuilder {
    LinkBuilder::new("test_process", "test_map")
        .with_action("init")
        .with_data(&serde_json::json!({"name": "batman", "age": 42}))
        .with_parent([0u8; 32])
        .with_priority(42.0)
        .with_tags(["tag1", "tag2"])
}

pub fn reference(link_hash: &[u8], process: &str) -> LinkReference {
    LinkReference::new(link_hash.to_vec(), process)
}
