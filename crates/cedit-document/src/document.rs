//! Document value model
//!
//! [`Document`] is a closed tagged union over JSON values backed by
//! persistent collections. Cloning is cheap and [`Document::set`] shares every
//! subtree it does not touch. Conversion to and from `serde_json::Value`
//! happens at the boundary; the serde impls keep the wire format plain JSON.
//!
//! [`Document::set`]: crate::Document::set

use im::{OrdMap, Vector};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};
use std::fmt::{self, Display, Formatter};

/// Object members, ordered by key
pub type ObjectMap = OrdMap<String, Document>;

/// Array elements
pub type ArrayVec = Vector<Document>;

/// JSON document with structural sharing
///
/// # Invariants
/// - Object keys are unique and iterate in sorted order
/// - Immutable: every edit produces a new value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Document {
    /// `null`
    #[default]
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any JSON number
    Number(Number),
    /// UTF-8 string
    String(String),
    /// Ordered list
    Array(ArrayVec),
    /// Key/value object
    Object(ObjectMap),
}

/// Kind tag of a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `null`
    Null,
    /// Boolean
    Bool,
    /// Number
    Number,
    /// String
    String,
    /// Array
    Array,
    /// Object
    Object,
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

impl Document {
    /// Empty object `{}`
    #[inline]
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object(OrdMap::new())
    }

    /// Empty array `[]`
    #[inline]
    #[must_use]
    pub fn empty_array() -> Self {
        Self::Array(Vector::new())
    }

    /// Kind tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Null => DocumentKind::Null,
            Self::Bool(_) => DocumentKind::Bool,
            Self::Number(_) => DocumentKind::Number,
            Self::String(_) => DocumentKind::String,
            Self::Array(_) => DocumentKind::Array,
            Self::Object(_) => DocumentKind::Object,
        }
    }

    /// Check for `null`
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String contents, if a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements, if an array
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayVec> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Members, if an object
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Canonical JSON text (sorted keys, no whitespace)
    #[must_use]
    pub fn to_canonical_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for Document {
    fn from(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.to_json()
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Document {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for Document {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_json())
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}
