use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable application identity. Accepts both numeric and string ids on the wire.
///
/// A string holding a canonical integer (`"1"`, not `"01"`) is the same id as the
/// number, so `"1"` and `1` compare and hash equal.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(untagged, from = "WireUserId")]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireUserId {
    Numeric(i64),
    Text(String),
}

impl From<WireUserId> for UserId {
    fn from(id: WireUserId) -> Self {
        match id {
            WireUserId::Numeric(id) => Self::Numeric(id),
            WireUserId::Text(id) => Self::from(id),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) if n.to_string() == id => Self::Numeric(n),
            _ => Self::Text(id.to_owned()),
        }
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        match id.parse::<i64>() {
            Ok(n) if n.to_string() == id => Self::Numeric(n),
            _ => Self::Text(id),
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}
