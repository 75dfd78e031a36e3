use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Twelve-byte document id, rendered as 24 lowercase hex characters.
///
/// Used for products, orders and users alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId([u8; 12]);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid id {0:?}: expected 24 hexadecimal characters")]
pub struct InvalidId(pub String);

impl ObjectId {
    /// Seconds since epoch (4 bytes), random (5 bytes), process counter (3 bytes).
    pub fn new() -> Self {
        let secs = Utc::now().timestamp() as u32;
        let random = Uuid::new_v4();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&random.as_bytes()[..5]);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidId> {
        let input = raw.as_bytes();
        if input.len() != 24 {
            return Err(InvalidId(raw.to_string()));
        }
        let mut bytes = [0u8; 12];
        for (slot, pair) in bytes.iter_mut().zip(input.chunks(2)) {
            let hi = nibble(pair[0]).ok_or_else(|| InvalidId(raw.to_string()))?;
            let lo = nibble(pair[1]).ok_or_else(|| InvalidId(raw.to_string()))?;
            *slot = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_string()
    }
}
