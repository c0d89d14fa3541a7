use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use prost::Message;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::hash::LinkHash;
use crate::registry::ClientRegistry;
use crate::types::{Link, LinkMeta, Segment, SegmentMeta};

pub const LINK_VERSION_1_0_0: &str = "1.0.0";

/// Version written into links built by this crate.
pub const LINK_VERSION: &str = LINK_VERSION_1_0_0;

/// Supported link formats. Any other version string is rejected with
/// `UnknownLinkVersion` before hashing or payload handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkVersion {
    V1_0_0,
}

impl LinkVersion {
    pub const CURRENT: LinkVersion = LinkVersion::V1_0_0;

    pub fn parse(version: &str) -> Result<Self> {
        match version {
            LINK_VERSION_1_0_0 => Ok(LinkVersion::V1_0_0),
            other => Err(Error::UnknownLinkVersion(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkVersion::V1_0_0 => LINK_VERSION_1_0_0,
        }
    }

    fn hash(self, link: &Link) -> LinkHash {
        match self {
            // SHA-256 over the protobuf encoding of the whole link.
            LinkVersion::V1_0_0 => LinkHash::new(canon_json::sha256(&link.encode_to_vec())),
        }
    }

    fn encode_payload<T: Serialize + ?Sized>(self, payload: &T) -> Result<Vec<u8>> {
        match self {
            LinkVersion::V1_0_0 => canon_json::to_canonical_vec(payload)
                .map_err(|e| Error::PayloadEncoding(e.to_string())),
        }
    }

    fn decode_payload<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            LinkVersion::V1_0_0 => {
                serde_json::from_slice(bytes).map_err(|e| Error::PayloadEncoding(e.to_string()))
            }
        }
    }
}

impl FromStr for LinkVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LinkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Segment resolution
// ---------------------------------------------------------------------------

/// Looks up segments by link hash while validating same-process references.
///
/// `Ok(None)` means "not found". Errors are reported as `RefNotFound` by the
/// caller. Cancellation and timeouts are the resolver's own business.
pub trait SegmentResolver {
    fn get_segment(&self, link_hash: &[u8]) -> anyhow::Result<Option<Segment>>;
}

impl<F> SegmentResolver for F
where
    F: Fn(&[u8]) -> anyhow::Result<Option<Segment>>,
{
    fn get_segment(&self, link_hash: &[u8]) -> anyhow::Result<Option<Segment>> {
        self(link_hash)
    }
}

// ---------------------------------------------------------------------------
// Link operations
// ---------------------------------------------------------------------------

impl Link {
    #[cfg_attr(feature = "obs", tracing::instrument(level = "debug", skip_all, err))]
    pub fn hash(&self) -> Result<LinkHash> {
        Ok(LinkVersion::parse(&self.version)?.hash(self))
    }

    pub fn hash_string(&self) -> Result<String> {
        Ok(self.hash()?.to_hex())
    }

    /// The parent link hash, if there is one.
    pub fn prev_link_hash(&self) -> Option<&[u8]> {
        self.meta
            .as_ref()
            .map(|m| m.prev_link_hash.as_slice())
            .filter(|h| !h.is_empty())
    }

    pub fn tag_map(&self) -> HashSet<&str> {
        self.meta
            .iter()
            .flat_map(|m| m.tags.iter().map(String::as_str))
            .collect()
    }

    /// Wrap the link in a segment carrying its hash.
    pub fn segmentify(self) -> Result<Segment> {
        let link_hash = self.hash()?;
        Ok(Segment {
            link: Some(self),
            meta: Some(SegmentMeta {
                link_hash: link_hash.to_vec(),
                evidences: Vec::new(),
            }),
        })
    }

    pub fn set_data<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<()> {
        self.set_data_with(ClientRegistry::builtin(), data)
    }

    pub fn set_data_with<T: Serialize + ?Sized>(
        &mut self,
        registry: &ClientRegistry,
        data: &T,
    ) -> Result<()> {
        let version = self.payload_version(registry)?;
        self.data = version.encode_payload(data)?;
        Ok(())
    }

    pub fn structurize_data<T: DeserializeOwned>(&self) -> Result<T> {
        self.structurize_data_with(ClientRegistry::builtin())
    }

    pub fn structurize_data_with<T: DeserializeOwned>(&self, registry: &ClientRegistry) -> Result<T> {
        self.payload_version(registry)?.decode_payload(&self.data)
    }

    pub fn set_metadata<T: Serialize + ?Sized>(&mut self, metadata: &T) -> Result<()> {
        self.set_metadata_with(ClientRegistry::builtin(), metadata)
    }

    pub fn set_metadata_with<T: Serialize + ?Sized>(
        &mut self,
        registry: &ClientRegistry,
        metadata: &T,
    ) -> Result<()> {
        let version = self.payload_version(registry)?;
        let encoded = version.encode_payload(metadata)?;
        self.meta.get_or_insert_with(LinkMeta::default).data = encoded;
        Ok(())
    }

    pub fn structurize_metadata<T: DeserializeOwned>(&self) -> Result<T> {
        self.structurize_metadata_with(ClientRegistry::builtin())
    }

    pub fn structurize_metadata_with<T: DeserializeOwned>(
        &self,
        registry: &ClientRegistry,
    ) -> Result<T> {
        let version = self.payload_version(registry)?;
        let bytes = self.meta.as_ref().map(|m| m.data.as_slice()).unwrap_or_default();
        version.decode_payload(bytes)
    }

    fn payload_version(&self, registry: &ClientRegistry) -> Result<LinkVersion> {
        registry.check(self)?;
        LinkVersion::parse(&self.version)
    }

    /// Structural validation. Same-process references are checked against
    /// `resolver` when one is given; references to other processes never are.
    #[cfg_attr(feature = "obs", tracing::instrument(level = "debug", skip_all, err))]
    pub fn validate(&self, resolver: Option<&dyn SegmentResolver>) -> Result<()> {
        if self.version.is_empty() {
            return Err(Error::MissingVersion);
        }
        let meta = self.meta.as_ref().ok_or(Error::MissingProcess)?;
        let process = match &meta.process {
            Some(p) if !p.name.is_empty() => p,
            _ => return Err(Error::MissingProcess),
        };
        if meta.map_id.is_empty() {
            return Err(Error::MissingMapId);
        }

        self.hash()?;

        for r in &meta.refs {
            if r.process.is_empty() {
                return Err(Error::MissingProcess);
            }
            if r.link_hash.is_empty() {
                return Err(Error::MissingLinkHash);
            }
            if r.process != process.name {
                continue;
            }
            let Some(resolver) = resolver else {
                continue;
            };
            let hex_hash = hex::encode(&r.link_hash);
            match resolver.get_segment(&r.link_hash) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::debug!(link_hash = %hex_hash, process = %r.process, "referenced segment not found");
                    return Err(Error::RefNotFound(hex_hash));
                }
                Err(e) => {
                    tracing::debug!(link_hash = %hex_hash, error = %e, "segment resolver failed");
                    return Err(Error::RefNotFound(hex_hash));
                }
            }
        }

        for signature in &self.signatures {
            signature.validate(self)?;
        }
        Ok(())
    }
}
