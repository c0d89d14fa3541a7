use thiserror::Error;

use crate::path::PathError;

/// Every failure the crate reports. Variants are compared by kind in tests and
/// mapped to stable codes for logs and metrics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Err.Link.MissingVersion: link version is missing")]
    MissingVersion,
    #[error("Err.Link.MissingProcess: link process is missing")]
    MissingProcess,
    #[error("Err.Link.MissingMapId: link map id is missing")]
    MissingMapId,
    #[error("Err.Link.MissingLinkHash: link hash is missing")]
    MissingLinkHash,
    #[error("Err.Evidence.MissingBackend: evidence backend is missing")]
    MissingBackend,
    #[error("Err.Evidence.MissingProvider: evidence provider is missing")]
    MissingProvider,
    #[error("Err.Evidence.MissingProof: evidence proof is missing")]
    MissingProof,
    #[error("Err.Segment.MissingLink: segment link is missing")]
    MissingLink,
    #[error("Err.Link.InvalidPriority: priority needs to be positive")]
    InvalidPriority,
    #[error("Err.Link.InvalidLinkHash: link hash is invalid")]
    InvalidLinkHash,
    #[error("Err.Link.UnknownVersion: unknown link version {0:?}")]
    UnknownLinkVersion(String),
    #[error("Err.Link.UnknownClientId: link was created with an unknown client {0:?}")]
    UnknownClientId(String),
    #[error("Err.Signature.UnknownVersion: unknown signature version {0:?}")]
    UnknownSignatureVersion(String),
    #[error("Err.Signature.Invalid: {0}")]
    InvalidSignature(String),
    #[error("Err.Segment.LinkHashMismatch: link hash mismatch")]
    LinkHashMismatch,
    #[error("Err.Evidence.Duplicate: evidence already exists for backend {backend:?} and provider {provider:?}")]
    DuplicateEvidence { backend: String, provider: String },
    #[error("Err.Link.RefNotFound: referenced link {0} could not be found")]
    RefNotFound(String),
    #[error("Err.Payload.Encoding: {0}")]
    PayloadEncoding(String),
    #[error(transparent)]
    PayloadPath(#[from] PathError),
    #[error("Err.Signature.Signing: {0}")]
    Signing(String),
    #[error("Err.Marshal.Decode: {0}")]
    Decode(String),
}

impl Error {
    /// Stable identifier of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingVersion => "missing_version",
            Error::MissingProcess => "missing_process",
            Error::MissingMapId => "missing_map_id",
            Error::MissingLinkHash => "missing_link_hash",
            Error::MissingBackend => "missing_backend",
            Error::MissingProvider => "missing_provider",
            Error::MissingProof => "missing_proof",
            Error::MissingLink => "missing_link",
            Error::InvalidPriority => "invalid_priority",
            Error::InvalidLinkHash => "invalid_link_hash",
            Error::UnknownLinkVersion(_) => "unknown_link_version",
            Error::UnknownClientId(_) => "unknown_client_id",
            Error::UnknownSignatureVersion(_) => "unknown_signature_version",
            Error::InvalidSignature(_) => "invalid_signature",
            Error::LinkHashMismatch => "link_hash_mismatch",
            Error::DuplicateEvidence { .. } => "duplicate_evidence",
            Error::RefNotFound(_) => "ref_not_found",
            Error::PayloadEncoding(_) => "payload_encoding",
            Error::PayloadPath(_) => "payload_path",
            Error::Signing(_) => "signing",
            Error::Decode(_) => "decode",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
