//! Section version hashes
//!
//! A [`DocumentHash`] is the Blake3 digest of a document's canonical JSON,
//! so structurally equal documents share a version regardless of key order.
//! On the wire it is a lowercase hex string.

use crate::document::Document;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Version of a section document (Blake3, 32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentHash([u8; 32]);

impl DocumentHash {
    /// Hash of a document's canonical JSON
    #[must_use]
    pub fn of(doc: &Document) -> Self {
        Self(*blake3::hash(doc.to_canonical_json().as_bytes()).as_bytes())
    }

    /// First 16 hex chars, for logs
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for DocumentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for DocumentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let digest: [u8; 32] = bytes.try_into().map_err(|_| HashError::Length(len))?;
        Ok(Self(digest))
    }
}

impl serde::Serialize for DocumentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for DocumentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Malformed version string
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Decoded to the wrong number of bytes
    #[error("version hash must be 32 bytes, got {0}")]
    Length(usize),

    /// Not hex
    #[error("version hash is not hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_version() {
        let a = Document::from(json!({"x": 1, "y": [true]}));
        let b = Document::from(json!({"y": [true], "x": 1}));
        assert_eq!(DocumentHash::of(&a), DocumentHash::of(&b));
        assert_ne!(DocumentHash::of(&a), DocumentHash::of(&Document::from(json!({"x": 2}))));
    }

    #[test]
    fn wire_form_is_hex() {
        let h = DocumentHash::of(&Document::from(json!({"bp": "120/80"})));
        let wire = serde_json::to_value(h).unwrap();
        assert_eq!(wire.as_str().map(str::len), Some(64));
        assert_eq!(serde_json::from_value::<DocumentHash>(wire).unwrap(), h);
        assert!(h.to_string().starts_with(&h.short()));
    }

    #[test]
    fn short_or_non_hex_rejected() {
        assert!(matches!("abcd".parse::<DocumentHash>(), Err(HashError::Length(2))));
        assert!(matches!("zz".parse::<DocumentHash>(), Err(HashError::Hex(_))));
    }
}
