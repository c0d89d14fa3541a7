use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::link::LINK_VERSION;
use crate::registry::CLIENT_ID;
use crate::types::{Link, LinkMeta, LinkReference, Process};

/// Fluent link construction.
///
/// The first failing call poisons the builder: later calls are no-ops and
/// [`LinkBuilder::build`] returns that error.
#[derive(Debug, Clone)]
#[must_use]
pub struct LinkBuilder {
    state: Result<Link>,
}

impl LinkBuilder {
    pub fn new(process: &str, map_id: &str) -> Self {
        let state = if process.is_empty() {
            Err(Error::MissingProcess)
        } else if map_id.is_empty() {
            Err(Error::MissingMapId)
        } else {
            Ok(Link {
                version: LINK_VERSION.to_string(),
                data: Vec::new(),
                meta: Some(LinkMeta {
                    client_id: CLIENT_ID.to_string(),
                    map_id: map_id.to_string(),
                    process: Some(Process {
                        name: process.to_string(),
                        state: String::new(),
                    }),
                    ..Default::default()
                }),
                signatures: Vec::new(),
            })
        };
        Self { state }
    }

    fn update(mut self, f: impl FnOnce(&mut Link) -> Result<()>) -> Self {
        if let Ok(link) = &mut self.state {
            if let Err(e) = f(link) {
                self.state = Err(e);
            }
        }
        self
    }

    fn update_meta(self, f: impl FnOnce(&mut LinkMeta) -> Result<()>) -> Self {
        self.update(|link| f(link.meta.get_or_insert_with(LinkMeta::default)))
    }

    pub fn with_action(self, action: impl Into<String>) -> Self {
        let action = action.into();
        self.update_meta(|m| {
            m.action = action;
            Ok(())
        })
    }

    pub fn with_step(self, step: impl Into<String>) -> Self {
        let step = step.into();
        self.update_meta(|m| {
            m.step = step;
            Ok(())
        })
    }

    pub fn with_process_state(self, state: impl Into<String>) -> Self {
        let state = state.into();
        self.update_meta(|m| {
            m.process.get_or_insert_with(Process::default).state = state;
            Ok(())
        })
    }

    /// Priority must be a non-negative number.
    pub fn with_priority(self, priority: f64) -> Self {
        self.update_meta(|m| {
            if priority.is_nan() || priority < 0.0 {
                return Err(Error::InvalidPriority);
            }
            m.priority = priority;
            Ok(())
        })
    }

    /// Append tags, skipping empty ones.
    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.update_meta(|m| {
            m.tags.extend(tags.into_iter().filter(|t| !t.is_empty()));
            Ok(())
        })
    }

    pub fn with_parent(self, link_hash: impl AsRef<[u8]>) -> Self {
        let link_hash = link_hash.as_ref().to_vec();
        self.update_meta(|m| {
            if link_hash.is_empty() {
                return Err(Error::MissingLinkHash);
            }
            m.prev_link_hash = link_hash;
            Ok(())
        })
    }

    /// Append references. Duplicate link hashes are dropped, keeping the first
    /// occurrence.
    pub fn with_refs<I>(self, refs: I) -> Self
    where
        I: IntoIterator<Item = LinkReference>,
    {
        let refs: Vec<LinkReference> = refs.into_iter().collect();
        self.update_meta(|m| {
            let mut seen: HashSet<String> = m.refs.iter().map(|r| hex::encode(&r.link_hash)).collect();
            for r in refs {
                if r.process.is_empty() {
                    return Err(Error::MissingProcess);
                }
                if r.link_hash.is_empty() {
                    return Err(Error::MissingLinkHash);
                }
                if seen.insert(hex::encode(&r.link_hash)) {
                    m.refs.push(r);
                }
            }
            Ok(())
        })
    }

    pub fn with_data<T: Serialize + ?Sized>(self, data: &T) -> Self {
        self.update(|link| link.set_data(data))
    }

    pub fn with_metadata<T: Serialize + ?Sized>(self, metadata: &T) -> Self {
        self.update(|link| link.set_metadata(metadata))
    }

    pub fn build(self) -> Result<Link> {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_process_reported_before_map_id() {
        assert_eq!(LinkBuilder::new("", "").build(), Err(Error::MissingProcess));
        assert_eq!(LinkBuilder::new("p", "").build(), Err(Error::MissingMapId));
    }

    #[test]
    fn first_error_is_sticky() {
        let res = LinkBuilder::new("p", "m")
            .with_priority(-1.0)
            .with_parent(Vec::<u8>::new())
            .with_action("ignored")
            .build();
        assert_eq!(res, Err(Error::InvalidPriority));
    }

    #[test]
    fn nan_priority_rejected() {
        assert_eq!(
            LinkBuilder::new("p", "m").with_priority(f64::NAN).build(),
            Err(Error::InvalidPriority)
        );
        let link = LinkBuilder::new("p", "m").with_priority(0.0).build().unwrap();
        assert_eq!(link.meta.unwrap().priority, 0.0);
    }

    #[test]
    fn refs_dedup_against_existing_refs() {
        let link = LinkBuilder::new("p", "m")
            .with_refs([LinkReference::new(vec![1], "a")])
            .with_refs([
                LinkReference::new(vec![1], "b"),
                LinkReference::new(vec![2], "c"),
            ])
            .build()
            .unwrap();
        let refs = link.meta.unwrap().refs;
        assert_eq!(
            refs,
            vec![LinkReference::new(vec![1], "a"), LinkReference::new(vec![2], "c")]
        );
    }
}
