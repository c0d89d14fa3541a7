//! Client compatibility.
//!
//! Payload encodings differ between client libraries, so payload operations
//! only touch links produced by clients known to share this crate's encoding.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::types::Link;

/// Identifier written into `meta.client_id` of every link built here.
pub const CLIENT_ID: &str = "github.com/chainscript/rs-chainscript";

const GO_CLIENT_ID: &str = "github.com/stratumn/go-chainscript";
const JS_CLIENT_ID: &str = "github.com/stratumn/js-chainscript";

static BUILTIN: LazyLock<ClientRegistry> =
    LazyLock::new(|| ClientRegistry::new([CLIENT_ID, GO_CLIENT_ID, JS_CLIENT_ID]));

/// Immutable set of compatible client identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRegistry {
    clients: BTreeSet<String>,
}

impl ClientRegistry {
    pub fn new<I, S>(clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clients: clients.into_iter().map(Into::into).collect(),
        }
    }

    /// The process-wide set: this crate plus the Go and JS reference clients.
    pub fn builtin() -> &'static ClientRegistry {
        &BUILTIN
    }

    /// A copy of `self` that also accepts `client_id`.
    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.clients.insert(client_id.into());
        self
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.contains(client_id)
    }

    pub fn clients(&self) -> impl Iterator<Item = &str> {
        self.clients.iter().map(String::as_str)
    }

    /// `UnknownClientId` if the link has no metadata or an unlisted client.
    pub fn check(&self, link: &Link) -> Result<()> {
        let client_id = link.meta.as_ref().map(|m| m.client_id.as_str()).unwrap_or("");
        if self.contains(client_id) {
            Ok(())
        } else {
            Err(Error::UnknownClientId(client_id.to_string()))
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LinkMeta;

    fn link_from(client_id: &str) -> Link {
        Link {
            meta: Some(LinkMeta {
                client_id: client_id.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn builtin_accepts_reference_clients() {
        let reg = ClientRegistry::builtin();
        assert!(reg.contains(CLIENT_ID));
        assert!(reg.contains(GO_CLIENT_ID));
        assert!(reg.contains(JS_CLIENT_ID));
        assert!(reg.check(&link_from(GO_CLIENT_ID)).is_ok());
    }

    #[test]
    fn unknown_and_missing_clients_rejected() {
        let reg = ClientRegistry::builtin();
        assert_eq!(
            reg.check(&link_from("github.com/someone/else")),
            Err(Error::UnknownClientId("github.com/someone/else".into()))
        );
        assert_eq!(
            reg.check(&Link::default()),
            Err(Error::UnknownClientId(String::new()))
        );
    }

    #[test]
    fn extended_registry_does_not_touch_builtin() {
        let reg = ClientRegistry::default().with_client("acme");
        assert!(reg.check(&link_from("acme")).is_ok());
        assert!(!ClientRegistry::builtin().contains("acme"));
    }
}
