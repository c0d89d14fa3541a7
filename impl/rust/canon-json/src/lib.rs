//! `canon-json`: deterministic JSON bytes for hashing and signing.
//!
//! Two implementations that serialize the same logical value must produce the
//! same bytes, so this writer pins down every choice `serde_json` leaves open:
//!   - object members sorted by the code points of their names
//!   - no insignificant whitespace
//!   - minimal string escaping (`"`, `\` and control characters only)
//!   - integral numbers without fraction or exponent, other numbers as
//!     `<d>.<digits>E<exp>` (`0.5` → `5.0E-1`)

use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonError {
    #[error("Err.Canon.Serialize: {0}")]
    Serialize(String),
    #[error("Err.Canon.NonFinite: NaN and infinities have no JSON form")]
    NonFinite,
}

pub type Result<T> = std::result::Result<T, CanonError>;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize any value to canonical JSON bytes.
pub fn to_canonical_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let v = serde_json::to_value(value).map_err(|e| CanonError::Serialize(e.to_string()))?;
    canonical_value_bytes(&v)
}

/// Canonical bytes of an already-built JSON value.
pub fn canonical_value_bytes(v: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_value(&mut buf, v)?;
    Ok(buf)
}

fn write_value(buf: &mut Vec<u8>, v: &Value) -> Result<()> {
    match v {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => write_number(buf, n)?,
        Value::String(s) => write_string(buf, s)?,
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item)?;
            }
            buf.push(b']');
        }
        Value::Object(map) => {
            // Sorted here rather than trusting the map type: `preserve_order`
            // may be switched on by another crate in the graph.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            buf.push(b'{');
            for (i, (k, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_string(buf, k)?;
                buf.push(b':');
                write_value(buf, val)?;
            }
            buf.push(b'}');
        }
    }
    Ok(())
}

/// Only `"`, `\\` and C0 controls are escaped. Controls without a short form
/// become `\u00XX` with uppercase hex digits.
fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    buf.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let short: &[u8] = match b {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x08 => b"\\b",
            0x0c => b"\\f",
            0x00..=0x1f => &[],
            _ => continue,
        };
        buf.extend_from_slice(&bytes[start..i]);
        start = i + 1;
        if short.is_empty() {
            buf.extend_from_slice(b"\\u00");
            buf.push(HEX[usize::from(b >> 4)]);
            buf.push(HEX[usize::from(b & 0x0f)]);
        } else {
            buf.extend_from_slice(short);
        }
    }
    buf.extend_from_slice(&bytes[start..]);
    buf.push(b'"');
    Ok(())
}

fn write_number(buf: &mut Vec<u8>, n: &Number) -> Result<()> {
    if let Some(i) = n.as_i64() {
        buf.extend_from_slice(i.to_string().as_bytes());
        return Ok(());
    }
    if let Some(u) = n.as_u64() {
        buf.extend_from_slice(u.to_string().as_bytes());
        return Ok(());
    }
    let f = n.as_f64().ok_or(CanonError::NonFinite)?;
    buf.extend_from_slice(format_float(f)?.as_bytes());
    Ok(())
}

/// Canonical text of a float.
pub fn format_float(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(CanonError::NonFinite);
    }
    if f.fract() == 0.0 {
        if f == 0.0 {
            return Ok("0".into());
        }
        return Ok(format!("{f:.0}"));
    }
    // `{:E}` yields the shortest round-trip digits: "5E-1", "1.25E0".
    let sci = format!("{f:E}");
    let (mantissa, exponent) = sci
        .split_once('E')
        .ok_or_else(|| CanonError::Serialize(format!("unexpected float form {sci}")))?;
    if mantissa.contains('.') {
        Ok(format!("{mantissa}E{exponent}"))
    } else {
        Ok(format!("{mantissa}.0E{exponent}"))
    }
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Canonical-encode then digest. The blessed path for signed payloads.
pub fn canonical_sha256<T: Serialize + ?Sized>(value: &T) -> Result<[u8; 32]> {
    Ok(sha256(&to_canonical_vec(value)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
