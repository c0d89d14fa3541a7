use std::path::{Path, PathBuf};

use chainscript_signers::PemKeyPair;
use clap::ValueEnum;

pub const PRIVATE_KEY_FILE: &str = "chainscript.key.pem";
pub const PUBLIC_KEY_FILE: &str = "chainscript.pub.pem";

pub const RSA_BITS: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyAlgorithm {
    Ed25519,
    Rsa,
}

impl KeyAlgorithm {
    fn generate(self) -> anyhow::Result<PemKeyPair> {
        match self {
            KeyAlgorithm::Ed25519 => chainscript_signers::generate_ed25519_pem(),
            KeyAlgorithm::Rsa => chainscript_signers::generate_rsa_pem(RSA_BITS),
        }
    }
}

/// Generate a pair and write it as PEM files under `dir`.
pub fn write_pem_pair(
    dir: &Path,
    algorithm: KeyAlgorithm,
) -> anyhow::Result<(PathBuf, PathBuf)> {
    let kp = algorithm.generate()?;
    std::fs::create_dir_all(dir)?;
    let private_path = dir.join(PRIVATE_KEY_FILE);
    let public_path = dir.join(PUBLIC_KEY_FILE);
    std::fs::write(&private_path, kp.private_pem.as_bytes())?;
    std::fs::write(&public_path, kp.public_pem.as_bytes())?;
    Ok((private_path, public_path))
}

/// A throwaway signing key for generated test cases.
pub fn ephemeral_private_pem(algorithm: KeyAlgorithm) -> anyhow::Result<Vec<u8>> {
    Ok(algorithm.generate()?.private_pem.into_bytes())
}
