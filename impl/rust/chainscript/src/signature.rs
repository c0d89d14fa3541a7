use std::fmt;
use std::str::FromStr;

use chainscript_signers::{
    scheme_for_algorithm, scheme_for_private_key, scheme_for_public_key, SignatureScheme,
};

use crate::error::{Error, Result};
use crate::path::PayloadPath;
use crate::types::{Link, Signature};

pub const SIGNATURE_VERSION_1_0_0: &str = "1.0.0";

/// Version written into signatures produced by this crate.
pub const SIGNATURE_VERSION: &str = SIGNATURE_VERSION_1_0_0;

/// Covers everything but the signature list, so further signatures can be
/// appended without invalidating earlier ones.
pub const DEFAULT_PAYLOAD_PATH: &str = "[version,data,meta]";

/// Prefix of the `type` recorded on each signature, followed by the algorithm.
/// Other clients may prepend a namespace (`stratumn/chainscript/RSA`).
pub const SIGNATURE_TYPE_PREFIX: &str = "chainscript/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureVersion {
    V1_0_0,
}

impl SignatureVersion {
    pub const CURRENT: SignatureVersion = SignatureVersion::V1_0_0;

    pub fn parse(version: &str) -> Result<Self> {
        match version {
            SIGNATURE_VERSION_1_0_0 => Ok(SignatureVersion::V1_0_0),
            other => Err(Error::UnknownSignatureVersion(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureVersion::V1_0_0 => SIGNATURE_VERSION_1_0_0,
        }
    }

    fn signed_bytes(self, link: &Link, payload_path: &str) -> Result<[u8; 32]> {
        match self {
            SignatureVersion::V1_0_0 => {
                let path = PayloadPath::parse(normalize_path(payload_path))?;
                let selected = path.select(link)?;
                let encoded = canon_json::canonical_value_bytes(&selected)
                    .map_err(|e| Error::PayloadEncoding(e.to_string()))?;
                Ok(canon_json::sha256(&encoded))
            }
        }
    }
}

impl FromStr for SignatureVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SignatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_path(payload_path: &str) -> &str {
    if payload_path.is_empty() {
        DEFAULT_PAYLOAD_PATH
    } else {
        payload_path
    }
}

impl Link {
    /// Digest of the sub-document selected by `payload_path` (the default path
    /// when empty), as defined by signature `version`.
    pub fn signed_bytes(&self, version: &str, payload_path: &str) -> Result<[u8; 32]> {
        SignatureVersion::parse(version)?.signed_bytes(self, payload_path)
    }

    /// Sign with an Ed25519 key (PKCS#8 PEM or 32-byte seed) or an RSA key
    /// (PKCS#8 or PKCS#1 PEM). The scheme follows the key encoding.
    pub fn sign(&mut self, private_key: &[u8], payload_path: &str) -> Result<()> {
        let scheme = scheme_for_private_key(private_key)
            .ok_or_else(|| Error::Signing("unsupported private key encoding".into()))?;
        self.sign_with(scheme, private_key, payload_path)
    }

    /// Compute the signed bytes, sign them with `scheme` and append the new
    /// signature. Existing signatures are left untouched; nothing is appended
    /// on failure.
    #[cfg_attr(feature = "obs", tracing::instrument(level = "debug", skip(self, scheme, private_key), err))]
    pub fn sign_with(
        &mut self,
        scheme: &dyn SignatureScheme,
        private_key: &[u8],
        payload_path: &str,
    ) -> Result<()> {
        let payload_path = normalize_path(payload_path);
        let to_sign = self.signed_bytes(SIGNATURE_VERSION, payload_path)?;
        let out = scheme
            .sign(private_key, &to_sign)
            .map_err(|e| Error::Signing(e.to_string()))?;

        self.signatures.push(Signature {
            version: SIGNATURE_VERSION.to_string(),
            r#type: format!("{SIGNATURE_TYPE_PREFIX}{}", out.algorithm),
            payload_path: payload_path.to_string(),
            public_key: out.public_key,
            signature: out.signature,
        });
        tracing::debug!(payload_path, signatures = self.signatures.len(), "link signed");
        Ok(())
    }
}

impl Signature {
    /// The algorithm named by `type`: whatever follows its last `/`.
    pub fn algorithm(&self) -> &str {
        self.r#type.rsplit('/').next().unwrap_or_default()
    }

    /// Verify against the current state of `link`. The verifier is chosen by
    /// [`Signature::algorithm`], or by the public key encoding when the
    /// algorithm is not one this crate knows.
    pub fn validate(&self, link: &Link) -> Result<()> {
        let scheme = scheme_for_algorithm(self.algorithm())
            .or_else(|| scheme_for_public_key(&self.public_key))
            .ok_or_else(|| {
                Error::InvalidSignature(format!("unsupported signature type {:?}", self.r#type))
            })?;
        self.validate_with(scheme, link)
    }

    pub fn validate_with(&self, scheme: &dyn SignatureScheme, link: &Link) -> Result<()> {
        let signed = link.signed_bytes(&self.version, &self.payload_path)?;
        scheme
            .verify(&self.public_key, &signed, &self.signature)
            .map_err(|e| {
                tracing::debug!(
                    payload_path = %self.payload_path,
                    algorithm = scheme.algorithm(),
                    error = %e,
                    "signature rejected"
                );
                Error::InvalidSignature(e.to_string())
            })
    }
}
