use crate::error::{Error, Result};
use crate::link::SegmentResolver;
use crate::types::{Evidence, Segment, SegmentMeta};

#[cfg(feature = "metrics")]
use crate::metrics_support::ensure_exporter;
#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

impl Segment {
    /// The stored link hash, empty if none was set.
    pub fn link_hash(&self) -> &[u8] {
        self.meta.as_ref().map(|m| m.link_hash.as_slice()).unwrap_or_default()
    }

    pub fn link_hash_string(&self) -> String {
        hex::encode(self.link_hash())
    }

    /// Recompute and store the hash of the current link.
    pub fn set_link_hash(&mut self) -> Result<()> {
        let link = self.link.as_ref().ok_or(Error::MissingLink)?;
        let link_hash = link.hash()?;
        self.meta.get_or_insert_with(SegmentMeta::default).link_hash = link_hash.to_vec();
        Ok(())
    }

    #[cfg_attr(feature = "obs", tracing::instrument(level = "debug", skip_all, err))]
    pub fn validate(&self, resolver: Option<&dyn SegmentResolver>) -> Result<()> {
        #[cfg(feature = "metrics")]
        let t0 = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        ensure_exporter();

        let result = self.check(resolver);

        #[cfg(feature = "metrics")]
        {
            let ms = t0.elapsed().as_secs_f64() * 1000.0;
            histogram!("chainscript_segment_validate_ms").record(ms);
            match &result {
                Ok(()) => {
                    counter!("chainscript_segment_validate_ok_total").increment(1);
                }
                Err(e) => {
                    counter!("chainscript_segment_validate_fail_total", "code" => e.code()).increment(1);
                }
            }
        }

        if let Err(e) = &result {
            tracing::debug!(code = e.code(), link_hash = %self.link_hash_string(), "segment validation failed");
        }
        result
    }

    fn check(&self, resolver: Option<&dyn SegmentResolver>) -> Result<()> {
        let stored = self.link_hash();
        if stored.is_empty() {
            return Err(Error::MissingLinkHash);
        }
        let link = self.link.as_ref().ok_or(Error::MissingLink)?;
        if link.hash()?.as_bytes().as_slice() != stored {
            return Err(Error::LinkHashMismatch);
        }
        link.validate(resolver)
    }

    /// Validate `evidence` and append it. Fails with `DuplicateEvidence` if
    /// one with the same backend and provider is already present.
    pub fn add_evidence(&mut self, evidence: Evidence) -> Result<()> {
        evidence.validate()?;
        if self.get_evidence(&evidence.backend, &evidence.provider).is_some() {
            return Err(Error::DuplicateEvidence {
                backend: evidence.backend,
                provider: evidence.provider,
            });
        }
        self.meta
            .get_or_insert_with(SegmentMeta::default)
            .evidences
            .push(evidence);
        Ok(())
    }

    pub fn get_evidence(&self, backend: &str, provider: &str) -> Option<&Evidence> {
        self.evidences()
            .iter()
            .find(|e| e.backend == backend && e.provider == provider)
    }

    /// Evidences from `backend`, in insertion order.
    pub fn find_evidences(&self, backend: &str) -> Vec<&Evidence> {
        self.evidences()
            .iter()
            .filter(|e| e.backend == backend)
            .collect()
    }

    fn evidences(&self) -> &[Evidence] {
        self.meta.as_ref().map(|m| m.evidences.as_slice()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkBuilder;

    fn segment() -> Segment {
        LinkBuilder::new("p", "m").build().unwrap().segmentify().unwrap()
    }

    #[test]
    fn set_link_hash_is_idempotent() {
        let mut s = segment();
        let first = s.link_hash().to_vec();
        s.set_link_hash().unwrap();
        s.set_link_hash().unwrap();
        assert_eq!(s.link_hash(), first.as_slice());
    }

    #[test]
    fn set_link_hash_without_link() {
        let mut s = Segment::default();
        assert_eq!(s.set_link_hash(), Err(Error::MissingLink));
    }

    #[test]
    fn missing_meta_or_link() {
        let mut s = segment();
        s.meta = None;
        assert_eq!(s.validate(None), Err(Error::MissingLinkHash));

        let mut s = segment();
        s.link = None;
        assert_eq!(s.validate(None), Err(Error::MissingLink));
    }

    #[test]
    fn tampered_link_is_detected() {
        let mut s = segment();
        s.link.as_mut().unwrap().meta.as_mut().unwrap().action = "changed".into();
        assert_eq!(s.validate(None), Err(Error::LinkHashMismatch));
    }

    #[test]
    fn duplicate_evidence_keeps_first() {
        let mut s = segment();
        s.add_evidence(Evidence::new("1", "btc", "test", vec![1]).unwrap()).unwrap();
        let err = s
            .add_evidence(Evidence::new("2", "btc", "test", vec![2]).unwrap())
            .unwrap_err();
        assert_eq!(err.code(), "duplicate_evidence");
        assert_eq!(s.get_evidence("btc", "test").unwrap().proof, vec![1]);
    }

    #[test]
    fn invalid_evidence_is_not_added() {
        let mut s = segment();
        let bad = Evidence {
            version: "1".into(),
            ..Default::default()
        };
        assert_eq!(s.add_evidence(bad), Err(Error::MissingBackend));
        assert!(s.find_evidences("").is_empty());
    }
}
