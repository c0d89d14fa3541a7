//! Cross-implementation compatibility cases.
//!
//! Each case generates a segment with known content and checks that a
//! segment produced by any implementation carries exactly that content.

use anyhow::{bail, ensure, Context};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chainscript::{Evidence, Link, LinkBuilder, LinkReference, Segment, DEFAULT_PAYLOAD_PATH};
use serde::{Deserialize, Serialize};

use crate::keys::{self, KeyAlgorithm};

/// One entry of a compatibility file.
#[derive(Debug, Serialize, Deserialize)]
pub struct TestData {
    pub id: String,
    /// Base64 of the protobuf-encoded segment.
    pub data: String,
}

pub trait TestCase {
    fn id(&self) -> &'static str;
    fn generate(&self) -> anyhow::Result<Segment>;
    fn check(&self, segment: &Segment) -> anyhow::Result<()>;
}

pub fn all() -> Vec<Box<dyn TestCase>> {
    vec![
        Box::new(SimpleSegment),
        Box::new(References),
        Box::new(Evidences),
        Box::new(Signatures),
    ]
}

pub fn find(id: &str) -> Option<Box<dyn TestCase>> {
    all().into_iter().find(|c| c.id() == id)
}

pub fn encode(segment: &Segment) -> String {
    STANDARD.encode(chainscript::marshal_segment(segment))
}

pub fn decode(data: &str) -> anyhow::Result<Segment> {
    let bytes = STANDARD.decode(data).context("segment is not valid base64")?;
    Ok(chainscript::unmarshal_segment(&bytes)?)
}

/// Decode, validate and run the case-specific checks.
pub fn run(case: &dyn TestCase, data: &str) -> anyhow::Result<()> {
    let segment = decode(data)?;
    segment.validate(None)?;
    case.check(&segment)
}

fn link_of(segment: &Segment) -> anyhow::Result<&Link> {
    segment.link.as_ref().context("segment has no link")
}

fn expect_eq<T: PartialEq + std::fmt::Debug>(what: &str, got: T, want: T) -> anyhow::Result<()> {
    ensure!(got == want, "invalid {what}: {got:?}");
    Ok(())
}

// ---------------------------------------------------------------------------
// simple-segment
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct CustomData {
    name: String,
    age: u32,
}

const HERO: &str = "ʙᴀᴛᴍᴀɴ";

struct SimpleSegment;

impl TestCase for SimpleSegment {
    fn id(&self) -> &'static str {
        "simple-segment"
    }

    fn generate(&self) -> anyhow::Result<Segment> {
        let link = LinkBuilder::new("test_process", "test_map")
            .with_action("init")
            .with_data(&CustomData {
                name: HERO.into(),
                age: 42,
            })
            .with_metadata(&"bruce wayne")
            .with_parent([42u8, 42])
            .with_priority(42.0)
            .with_process_state("started")
            .with_step("setup")
            .with_tags(["tag1", "tag2"])
            .build()?;
        Ok(link.segmentify()?)
    }

    fn check(&self, segment: &Segment) -> anyhow::Result<()> {
        let link = link_of(segment)?;
        let meta = link.meta.as_ref().context("link has no meta")?;
        let process = meta.process.as_ref().context("link has no process")?;

        expect_eq("action", meta.action.as_str(), "init")?;
        let data: CustomData = link.structurize_data()?;
        expect_eq(
            "data",
            &data,
            &CustomData {
                name: HERO.into(),
                age: 42,
            },
        )?;
        expect_eq("map id", meta.map_id.as_str(), "test_map")?;
        let metadata: String = link.structurize_metadata()?;
        expect_eq("metadata", metadata.as_str(), "bruce wayne")?;
        expect_eq("parent", link.prev_link_hash(), Some(&[42u8, 42][..]))?;
        expect_eq("priority", meta.priority, 42.0)?;
        expect_eq("process name", process.name.as_str(), "test_process")?;
        expect_eq("process state", process.state.as_str(), "started")?;
        expect_eq("step", meta.step.as_str(), "setup")?;
        expect_eq("tags", meta.tags.as_slice(), &["tag1".to_string(), "tag2".to_string()][..])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// segment-references
// ---------------------------------------------------------------------------

struct References;

impl TestCase for References {
    fn id(&self) -> &'static str {
        "segment-references"
    }

    fn generate(&self) -> anyhow::Result<Segment> {
        let link = LinkBuilder::new("test_process", "test_map")
            .with_refs([
                LinkReference::new(vec![42], "p1"),
                LinkReference::new(vec![24], "p2"),
            ])
            .build()?;
        Ok(link.segmentify()?)
    }

    fn check(&self, segment: &Segment) -> anyhow::Result<()> {
        let link = link_of(segment)?;
        let refs = link.meta.as_ref().map(|m| m.refs.as_slice()).unwrap_or_default();
        expect_eq("refs count", refs.len(), 2)?;
        expect_eq("first ref", &refs[0], &LinkReference::new(vec![42], "p1"))?;
        expect_eq("second ref", &refs[1], &LinkReference::new(vec![24], "p2"))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// segment-evidences
// ---------------------------------------------------------------------------

struct Evidences;

impl Evidences {
    fn expected() -> anyhow::Result<[Evidence; 2]> {
        Ok([
            Evidence::new("0.1.0", "bitcoin", "testnet", vec![42])?,
            Evidence::new("1.0.3", "ethereum", "mainnet", vec![24])?,
        ])
    }
}

impl TestCase for Evidences {
    fn id(&self) -> &'static str {
        "segment-evidences"
    }

    fn generate(&self) -> anyhow::Result<Segment> {
        let mut segment = LinkBuilder::new("test_process", "test_map")
            .build()?
            .segmentify()?;
        for e in Self::expected()? {
            segment.add_evidence(e)?;
        }
        Ok(segment)
    }

    fn check(&self, segment: &Segment) -> anyhow::Result<()> {
        let count = segment.meta.as_ref().map_or(0, |m| m.evidences.len());
        expect_eq("evidences count", count, 2)?;
        for want in Self::expected()? {
            match segment.get_evidence(&want.backend, &want.provider) {
                Some(got) => expect_eq("evidence", got, &want)?,
                None => bail!("missing {} evidence on {}", want.backend, want.provider),
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// segment-signatures
// ---------------------------------------------------------------------------

const MAP_ID_PATH: &str = "[version,meta.mapId]";

struct Signatures;

impl TestCase for Signatures {
    fn id(&self) -> &'static str {
        "segment-signatures"
    }

    fn generate(&self) -> anyhow::Result<Segment> {
        let mut link = LinkBuilder::new("test_process", "test_map")
            .with_action(HERO)
            .build()?;
        link.sign(&keys::ephemeral_private_pem(KeyAlgorithm::Ed25519)?, "")?;
        link.sign(&keys::ephemeral_private_pem(KeyAlgorithm::Rsa)?, MAP_ID_PATH)?;
        Ok(link.segmentify()?)
    }

    fn check(&self, segment: &Segment) -> anyhow::Result<()> {
        let link = link_of(segment)?;
        expect_eq("signatures count", link.signatures.len(), 2)?;
        for sig in &link.signatures {
            sig.validate(link)?;
        }
        expect_eq(
            "first signature payload path",
            link.signatures[0].payload_path.as_str(),
            DEFAULT_PAYLOAD_PATH,
        )?;
        expect_eq(
            "second signature payload path",
            link.signatures[1].payload_path.as_str(),
            MAP_ID_PATH,
        )?;
        Ok(())
    }
}
