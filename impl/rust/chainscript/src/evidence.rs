use crate::error::{Error, Result};
use crate::types::Evidence;

impl Evidence {
    /// Build an evidence, rejecting it if any field is empty.
    pub fn new(
        version: impl Into<String>,
        backend: impl Into<String>,
        provider: impl Into<String>,
        proof: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let e = Evidence {
            version: version.into(),
            backend: backend.into(),
            provider: provider.into(),
            proof: proof.into(),
        };
        e.validate()?;
        Ok(e)
    }

    /// Proof bytes are opaque here; only presence is checked.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(Error::MissingVersion);
        }
        if self.backend.is_empty() {
            return Err(Error::MissingBackend);
        }
        if self.provider.is_empty() {
            return Err(Error::MissingProvider);
        }
        if self.proof.is_empty() {
            return Err(Error::MissingProof);
        }
        Ok(())
    }
}
