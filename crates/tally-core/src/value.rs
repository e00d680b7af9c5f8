//! Typed column values shared by the snapshot writer and the live comparator.
//!
//! Every value carries its kind explicitly: the enum variant *is* the kind, so
//! a payload can never disagree with its tag. On disk a value is written as
//! `{ type: <kind>, value: <payload> }` with the tag vocabulary of
//! [`ValueKind`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ValueKind
// ---------------------------------------------------------------------------

/// Semantic kind of a [`TypedValue`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Integer,
    Blob,
    Timestamp,
    Float,
    Text,
    Other,
}

impl ValueKind {
    /// All kinds, in tag-vocabulary order.
    pub const ALL: [Self; 6] = [
        Self::Integer,
        Self::Blob,
        Self::Timestamp,
        Self::Float,
        Self::Text,
        Self::Other,
    ];

    /// Return the tag written to snapshot files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Blob => "blob",
            Self::Timestamp => "timestamp",
            Self::Float => "float",
            Self::Text => "text",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// NativeValue
// ---------------------------------------------------------------------------

/// Payload of [`TypedValue::Other`]: whatever the driver handed back that has
/// no dedicated kind, kept in its native shape and compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Unsigned(u64),
    Text(String),
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Unsigned(u) => write!(f, "{u}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// TypedValue
// ---------------------------------------------------------------------------

/// A column value tagged with its semantic kind.
///
/// Equality is kind-aware (see [`TypedValue::matches`]): values of different
/// kinds are never equal, timestamps compare as instants and floats compare
/// strictly with no epsilon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Integer(i64),
    Blob(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Float(f64),
    Text(String),
    Other(NativeValue),
}

impl TypedValue {
    /// The kind tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Blob(_) => ValueKind::Blob,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::Other(_) => ValueKind::Other,
        }
    }

    /// Kind-aware equality used by the result matcher.
    ///
    /// Floats are compared on their raw value. `NaN` is the one exception to
    /// IEEE semantics: it equals `NaN`, so that every row matches itself.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Other(a), Self::Other(b)) => a == b,
            _ => false,
        }
    }

    /// Shorthand for `Other(NativeValue::Null)`.
    #[must_use]
    pub const fn null() -> Self {
        Self::Other(NativeValue::Null)
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Blob(b) => {
                f.write_str("X'")?;
                for byte in b {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Other(n) => write!(f, "{n}"),
        }
    }
}
