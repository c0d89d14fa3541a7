//! `chainscript`: tamper-evident process records.
//!
//! A [`Link`] is an immutable step of a process instance (a "map"). Its
//! identity is the SHA-256 of its protobuf encoding. A [`Segment`] pairs a
//! link with mutable metadata: the link hash frozen at creation, and
//! [`Evidence`]s collected afterwards. Signatures cover a sub-document of the
//! link selected by a [`PayloadPath`], canonically JSON-encoded and digested.
//!
//! Build links with [`LinkBuilder`]:
//!
//! ```
//! use chainscript::LinkBuilder;
//!
//! let link = LinkBuilder::new("order", "order-42")
//!     .with_action("create")
//!     .with_tags(["urgent"])
//!     .build()?;
//! let segment = link.segmentify()?;
//! segment.validate(None)?;
//! # Ok::<(), chainscript::Error>(())
//! ```

pub mod builder;
pub mod error;
pub mod evidence;
pub mod hash;
pub mod link;
pub mod marshal;
#[cfg(feature = "metrics")]
mod metrics_support;
pub mod path;
pub mod registry;
pub mod segment;
pub mod signature;
pub mod types;

pub use builder::LinkBuilder;
pub use error::{Error, Result};
pub use hash::{LinkHash, LINK_HASH_SIZE};
pub use link::{LinkVersion, SegmentResolver, LINK_VERSION};
pub use marshal::{
    marshal_evidence, marshal_link, marshal_segment, unmarshal_evidence, unmarshal_link,
    unmarshal_segment,
};
pub use path::{PathError, PayloadPath};
pub use registry::{ClientRegistry, CLIENT_ID};
pub use signature::{SignatureVersion, DEFAULT_PAYLOAD_PATH, SIGNATURE_VERSION};
pub use types::*;

pub use chainscript_signers::{Ed25519Scheme, RsaScheme, SignatureScheme};
