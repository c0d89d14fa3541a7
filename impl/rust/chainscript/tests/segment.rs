//! Segments and evidences.

mod common;

use chainscript::{marshal_segment, unmarshal_segment, Error, Evidence};
use common::*;

#[test]
fn fresh_segment_validates() {
    let segment = random_segment();
    assert!(segment.validate(None).is_ok());
}

#[test]
fn missing_link_hash_is_reported() {
    let mut segment = random_segment();
    segment.meta.as_mut().unwrap().link_hash.clear();
    assert_eq!(segment.validate(None), Err(Error::MissingLinkHash));
}

#[test]
fn stored_hash_must_match_link() {
    let mut segment = random_segment();
    segment.meta.as_mut().unwrap().link_hash = random_hash();
    assert_eq!(segment.validate(None), Err(Error::LinkHashMismatch));

    segment.set_link_hash().unwrap();
    assert!(segment.validate(None).is_ok());
}

#[test]
fn link_errors_propagate() {
    let mut segment = random_segment();
    segment.link.as_mut().unwrap().meta.as_mut().unwrap().map_id.clear();
    segment.set_link_hash().unwrap();
    assert_eq!(segment.validate(None), Err(Error::MissingMapId));
}

#[test]
fn add_then_get_evidence() {
    let mut segment = random_segment();
    let e = random_evidence();
    segment.add_evidence(e.clone()).unwrap();
    assert_eq!(segment.get_evidence(&e.backend, &e.provider), Some(&e));
    assert_eq!(segment.get_evidence(&e.backend, "elsewhere"), None);
}

#[test]
fn duplicate_evidence_is_rejected() {
    let mut segment = random_segment();
    let first = Evidence::new("0.1.0", "bitcoin", "testnet", vec![42]).unwrap();
    let second = Evidence::new("0.2.0", "bitcoin", "testnet", vec![24]).unwrap();
    segment.add_evidence(first.clone()).unwrap();
    assert_eq!(
        segment.add_evidence(second),
        Err(Error::DuplicateEvidence {
            backend: "bitcoin".into(),
            provider: "testnet".into(),
        })
    );
    assert_eq!(segment.get_evidence("bitcoin", "testnet"), Some(&first));
    assert_eq!(segment.find_evidences("bitcoin").len(), 1);
}

#[test]
fn find_evidences_keeps_insertion_order() {
    let mut segment = random_segment();
    let btc_test = Evidence::new("0.1.0", "bitcoin", "testnet", vec![1]).unwrap();
    let eth_main = Evidence::new("1.0.3", "ethereum", "mainnet", vec![2]).unwrap();
    let btc_main = Evidence::new("0.1.0", "bitcoin", "mainnet", vec![3]).unwrap();
    for e in [&btc_test, &eth_main, &btc_main] {
        segment.add_evidence(e.clone()).unwrap();
    }
    assert_eq!(segment.find_evidences("bitcoin"), vec![&btc_test, &btc_main]);
    assert_eq!(segment.find_evidences("ethereum"), vec![&eth_main]);
    assert!(segment.find_evidences("dogecoin").is_empty());
}

#[test]
fn evidences_do_not_affect_link_hash() {
    let mut segment = random_segment();
    let before = segment.link_hash().to_vec();
    segment.add_evidence(random_evidence()).unwrap();
    assert_eq!(segment.link_hash(), before.as_slice());
    assert!(segment.validate(None).is_ok());
}

fn decoded_with_payload_path(payload_path: String) -> chainscript::Segment {
    let mut link = random_link();
    link.sign(&random_key(), "").unwrap();
    link.signatures[0].payload_path = payload_path;
    let bytes = marshal_segment(&link.segmentify().unwrap());
    unmarshal_segment(&bytes).unwrap()
}

#[test]
fn deeply_nested_payload_path_from_the_wire_is_an_error() {
    let nested = format!("{}version{}", "[".repeat(200_000), "]".repeat(200_000));
    let segment = decoded_with_payload_path(nested);
    assert!(matches!(segment.validate(None), Err(Error::PayloadPath(_))));

    let nested = format!("{}version{}", "[".repeat(1_000), "]".repeat(1_000));
    let segment = decoded_with_payload_path(nested);
    assert!(matches!(segment.validate(None), Err(Error::PayloadPath(_))));
}

#[test]
fn long_dotted_payload_path_from_the_wire_is_an_error() {
    let segment = decoded_with_payload_path(vec!["meta"; 500_000].join("."));
    assert!(matches!(segment.validate(None), Err(Error::PayloadPath(_))));
}
