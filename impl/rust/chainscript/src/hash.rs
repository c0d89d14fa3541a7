use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const LINK_HASH_SIZE: usize = 32;

/// SHA-256 digest identifying a link.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHash([u8; LINK_HASH_SIZE]);

impl LinkHash {
    pub const fn new(bytes: [u8; LINK_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Fails with `InvalidLinkHash` unless `bytes` is exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; LINK_HASH_SIZE] = bytes.try_into().map_err(|_| Error::InvalidLinkHash)?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; LINK_HASH_SIZE] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for LinkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for LinkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkHash({})", self.to_hex())
    }
}

impl FromStr for LinkHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidLinkHash)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for LinkHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<LinkHash> for Vec<u8> {
    fn from(h: LinkHash) -> Self {
        h.to_vec()
    }
}
