//! ChainScript entity schema.
//!
//! Every entity is a protobuf message (the deterministic struct encoder the
//! link hash is computed over) and carries a serde JSON view that mirrors the
//! schema's JSON names: snake_case, empty fields omitted, bytes as standard
//! base64. Field numbers are part of the interoperability contract.

use serde::{Deserialize, Serialize};

/// A segment wraps a link with mutable metadata.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    #[prost(message, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[prost(message, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<SegmentMeta>,
}

/// Segment metadata: the frozen link hash and the evidences collected since.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentMeta {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub link_hash: Vec<u8>,
    #[prost(message, repeated, tag = "10")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidences: Vec<Evidence>,
}

/// An externally verifiable proof that a link existed at some point in time.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Evidence {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Kind of proof (e.g. "bitcoin", "ethereum").
    #[prost(string, tag = "10")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub backend: String,
    /// Instance of the backend (e.g. "testnet").
    #[prost(string, tag = "11")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,
    /// Opaque, backend-specific proof bytes.
    #[prost(bytes = "vec", tag = "20")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub proof: Vec<u8>,
}

/// The immutable part of a segment.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// Client payload, canonically encoded.
    #[prost(bytes = "vec", tag = "10")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
    #[prost(message, optional, tag = "11")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<LinkMeta>,
    #[prost(message, repeated, tag = "20")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<Signature>,
}

/// The process a link belongs to, and the state it moved that process to.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Process {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[prost(string, tag = "10")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkMeta {
    /// Identifier of the library that produced the link.
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[prost(bytes = "vec", tag = "10")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub prev_link_hash: Vec<u8>,
    #[prost(double, tag = "11")]
    #[serde(skip_serializing_if = "is_zero")]
    pub priority: f64,
    #[prost(message, repeated, tag = "12")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub refs: Vec<LinkReference>,
    #[prost(message, optional, tag = "20")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<Process>,
    #[prost(string, tag = "21")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub map_id: String,
    #[prost(string, tag = "30")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[prost(string, tag = "31")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub step: String,
    #[prost(string, repeated, tag = "32")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Client metadata, canonically encoded.
    #[prost(bytes = "vec", tag = "100")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
}

/// A pointer to another link, possibly in another process.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkReference {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub link_hash: Vec<u8>,
    #[prost(string, tag = "10")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub process: String,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// `chainscript/<ALGORITHM>` for signatures produced by this crate. The
    /// algorithm picks the verifier.
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub r#type: String,
    #[prost(string, tag = "10")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub payload_path: String,
    #[prost(bytes = "vec", tag = "20")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub public_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "21")]
    #[serde(with = "b64", skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<u8>,
}

impl LinkReference {
    pub fn new(link_hash: impl Into<Vec<u8>>, process: impl Into<String>) -> Self {
        Self {
            link_hash: link_hash.into(),
            process: process.into(),
        }
    }
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

// ---------------------------------------------------------------------------
// Base64 serde helper for byte fields
// ---------------------------------------------------------------------------

mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => STANDARD.decode(s).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
