use anyhow::{anyhow, Result};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};

mod rsa_scheme;

pub use rsa_scheme::{generate_rsa_pem, RsaScheme};

pub const ED25519: &str = "ED25519";
pub const RSA: &str = "RSA";

const PEM_PREFIX: &[u8] = b"-----BEGIN";

// ---------------------------------------------------------------------------
// Trait: the signing capability consumed by link signatures
// ---------------------------------------------------------------------------

/// Result of signing a message: the algorithm used, the public key that
/// verifies it and the signature itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutput {
    pub algorithm: String,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A signature scheme signs arbitrary messages with an encoded private key and
/// verifies `(public_key, message, signature)` triples. Implementations own the
/// key encodings they accept.
pub trait SignatureScheme {
    /// Algorithm id recorded next to signatures, e.g. `ED25519`.
    fn algorithm(&self) -> &'static str;
    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<SignOutput>;
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

/// Ed25519 over the raw message.
///
/// Private keys: PKCS#8 PEM or a raw 32-byte seed.
/// Public keys: emitted as SPKI PEM, accepted as SPKI PEM or raw 32 bytes.
/// Signatures: raw 64 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Scheme;

impl Ed25519Scheme {
    fn signing_key(private_key: &[u8]) -> Result<ed25519_dalek::SigningKey> {
        if private_key.starts_with(PEM_PREFIX) {
            let pem = std::str::from_utf8(private_key).map_err(|e| anyhow!("private key pem: {e}"))?;
            return ed25519_dalek::SigningKey::from_pkcs8_pem(pem)
                .map_err(|e| anyhow!("pkcs8 parse: {e}"));
        }
        let seed: &[u8; 32] = private_key
            .try_into()
            .map_err(|_| anyhow!("expected a PKCS#8 PEM key or a 32-byte seed, got {} bytes", private_key.len()))?;
        Ok(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    fn verifying_key(public_key: &[u8]) -> Result<ed25519_dalek::VerifyingKey> {
        if public_key.starts_with(PEM_PREFIX) {
            let pem = std::str::from_utf8(public_key).map_err(|e| anyhow!("public key pem: {e}"))?;
            return ed25519_dalek::VerifyingKey::from_public_key_pem(pem)
                .map_err(|e| anyhow!("spki parse: {e}"));
        }
        let raw: &[u8; 32] = public_key
            .try_into()
            .map_err(|_| anyhow!("expected an SPKI PEM key or 32 raw bytes, got {} bytes", public_key.len()))?;
        ed25519_dalek::VerifyingKey::from_bytes(raw).map_err(|e| anyhow!("ed25519 public key: {e}"))
    }
}

impl SignatureScheme for Ed25519Scheme {
    fn algorithm(&self) -> &'static str {
        ED25519
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> Result<SignOutput> {
        use ed25519_dalek::Signer as _;
        let key = Self::signing_key(private_key)?;
        let public_key = key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| anyhow!("spki encode: {e}"))?;
        Ok(SignOutput {
            algorithm: ED25519.into(),
            public_key: public_key.into_bytes(),
            signature: key.sign(message).to_bytes().to_vec(),
        })
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        use ed25519_dalek::Verifier as _;
        let vk = Self::verifying_key(public_key)?;
        let sig = ed25519_dalek::Signature::from_slice(signature)
            .map_err(|e| anyhow!("expected a 64-byte ed25519 signature: {e}"))?;
        vk.verify(message, &sig)
            .map_err(|e| anyhow!("ed25519 verification failed: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Scheme selection
// ---------------------------------------------------------------------------

/// The scheme registered under `algorithm`, ignoring ASCII case.
pub fn scheme_for_algorithm(algorithm: &str) -> Option<&'static dyn SignatureScheme> {
    if algorithm.eq_ignore_ascii_case(ED25519) {
        Some(&Ed25519Scheme)
    } else if algorithm.eq_ignore_ascii_case(RSA) {
        Some(&RsaScheme)
    } else {
        None
    }
}

/// The scheme whose private key encoding `private_key` parses as.
pub fn scheme_for_private_key(private_key: &[u8]) -> Option<&'static dyn SignatureScheme> {
    if Ed25519Scheme::signing_key(private_key).is_ok() {
        Some(&Ed25519Scheme)
    } else if RsaScheme::private_key(private_key).is_ok() {
        Some(&RsaScheme)
    } else {
        None
    }
}

/// The scheme whose public key encoding `public_key` parses as.
pub fn scheme_for_public_key(public_key: &[u8]) -> Option<&'static dyn SignatureScheme> {
    if Ed25519Scheme::verifying_key(public_key).is_ok() {
        Some(&Ed25519Scheme)
    } else if RsaScheme::public_key(public_key).is_ok() {
        Some(&RsaScheme)
    } else {
        None
    }
}

fn pem_str<'a>(key: &'a [u8], what: &str) -> Result<&'a str> {
    if !key.starts_with(PEM_PREFIX) {
        return Err(anyhow!("expected a PEM encoded {what} key"));
    }
    std::str::from_utf8(key).map_err(|e| anyhow!("{what} key pem: {e}"))
}

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// A freshly generated key pair, PEM encoded.
pub struct PemKeyPair {
    pub private_pem: String,
    pub public_pem: String,
}

pub fn generate_ed25519_pem() -> Result<PemKeyPair> {
    let mut rng = rand_core::OsRng;
    let key = ed25519_dalek::SigningKey::generate(&mut rng);
    let private_pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| anyhow!("pkcs8 encode: {e}"))?;
    let public_pem = key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| anyhow!("spki encode: {e}"))?;
    Ok(PemKeyPair {
        private_pem: private_pem.to_string(),
        public_pem,
    })
}
