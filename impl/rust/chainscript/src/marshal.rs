//! Protobuf wire form of segments, links and evidences.

use prost::Message;

use crate::error::{Error, Result};
use crate::types::{Evidence, Link, Segment};

pub fn marshal_segment(segment: &Segment) -> Vec<u8> {
    segment.encode_to_vec()
}

pub fn unmarshal_segment(bytes: &[u8]) -> Result<Segment> {
    decode(bytes)
}

pub fn marshal_link(link: &Link) -> Vec<u8> {
    link.encode_to_vec()
}

pub fn unmarshal_link(bytes: &[u8]) -> Result<Link> {
    decode(bytes)
}

pub fn marshal_evidence(evidence: &Evidence) -> Vec<u8> {
    evidence.encode_to_vec()
}

pub fn unmarshal_evidence(bytes: &[u8]) -> Result<Evidence> {
    decode(bytes)
}

fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M> {
    M::decode(bytes).map_err(|e| Error::Decode(e.to_string()))
}
