//! Value Codec Module
//!
//! Marshals typed values into a self-describing tagged byte sequence shared
//! by both cache tiers, and reverses the process. The last byte of every
//! encoded value is a type tag; "other" values additionally carry a
//! compression marker in the next-to-last byte.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{CacheError, Result};

// == Wire Constants ==
//
// These bytes are the interop contract between every process sharing the
// remote tier. Changing any of them breaks cross-process decoding.

/// Type tag for raw byte values
pub const BYTES_TAG: u8 = 0x00;
/// Type tag for UTF-8 text values
pub const TEXT_TAG: u8 = 0x01;
/// Type tag for serialized "other" values
pub const OTHER_TAG: u8 = 0x02;

/// Compression marker: payload stored uncompressed
pub const NO_COMPRESSION: u8 = 0x00;
/// Compression marker: payload is zlib-compressed
pub const ZLIB_COMPRESSION: u8 = 0x01;

/// Serialized "other" payloads at or above this size are compressed
pub const COMPRESSION_THRESHOLD: usize = 64;

// == Value ==
/// A value carried through the cache.
///
/// Bytes and text travel verbatim (plus their tag); everything else is
/// represented dynamically as JSON and serialized through MessagePack.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Raw bytes, stored as-is
    Bytes(Vec<u8>),
    /// UTF-8 text
    Text(String),
    /// Any other shape, held as a dynamic JSON value
    Other(serde_json::Value),
}

impl Value {
    /// Wraps any serializable value as [`Value::Other`].
    pub fn other<T: serde::Serialize>(value: T) -> Result<Self> {
        Ok(Value::Other(serde_json::to_value(value)?))
    }

    /// Returns the raw bytes when this is a bytes value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the text when this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the dynamic value when this is an "other" value.
    pub fn as_other(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Other(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Other(v)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Other(serde_json::Value::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Other(serde_json::Value::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Other(serde_json::Value::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Other(serde_json::Value::from(b))
    }
}

// == Encode ==
/// Encodes a value into its tagged byte representation.
///
/// Bytes and text get their tag appended directly. Other values are
/// MessagePack-serialized, compressed with zlib once the serialized form
/// reaches [`COMPRESSION_THRESHOLD`], and tagged with their compression
/// marker followed by [`OTHER_TAG`].
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Bytes(b) => {
            let mut out = b.clone();
            out.push(BYTES_TAG);
            Ok(out)
        }
        Value::Text(s) => {
            let mut out = s.as_bytes().to_vec();
            out.push(TEXT_TAG);
            Ok(out)
        }
        Value::Other(v) => {
            let raw = rmp_serde::to_vec(v)?;
            let mut out = if raw.len() < COMPRESSION_THRESHOLD {
                let mut out = raw;
                out.push(NO_COMPRESSION);
                out
            } else {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&raw)?;
                let mut out = encoder.finish()?;
                out.push(ZLIB_COMPRESSION);
                out
            };
            out.push(OTHER_TAG);
            Ok(out)
        }
    }
}

// == Decode ==
/// Decodes a tagged byte representation back into a value.
///
/// An absent or empty input decodes to `None` rather than an error, so
/// callers can tell "no value" from "corrupt value" cheaply. An unknown
/// compression marker is fatal ([`CacheError::UnknownCompression`]).
pub fn decode(bytes: Option<&[u8]>) -> Result<Option<Value>> {
    let Some(b) = bytes else {
        return Ok(None);
    };
    let Some((&tag, rest)) = b.split_last() else {
        return Ok(None);
    };

    match tag {
        BYTES_TAG => Ok(Some(Value::Bytes(rest.to_vec()))),
        TEXT_TAG => Ok(Some(Value::Text(String::from_utf8(rest.to_vec())?))),
        OTHER_TAG => {
            let Some((&marker, payload)) = rest.split_last() else {
                return Ok(None);
            };
            let raw = match marker {
                NO_COMPRESSION => payload.to_vec(),
                ZLIB_COMPRESSION => {
                    let mut decoder = ZlibDecoder::new(payload);
                    let mut out = Vec::new();
                    decoder.read_to_end(&mut out)?;
                    out
                }
                unknown => return Err(CacheError::UnknownCompression(unknown)),
            };
            Ok(Some(Value::Other(rmp_serde::from_slice(&raw)?)))
        }
        unknown => Err(CacheError::UnknownTag(unknown)),
    }
}
