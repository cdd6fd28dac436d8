use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a post.
///
/// Identifiers are allocated densely starting at zero and never reused. They
/// double as file names (decimal) and as time-index entries (8 bytes,
/// big-endian).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(u64);

impl PostId {
    /// Width of an encoded identifier in the time index.
    pub const ENCODED_LEN: usize = 8;

    /// The first identifier ever allocated.
    pub const FIRST: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier allocated after this one, `None` once the id space
    /// is used up.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Convert an externally supplied signed identifier.
    ///
    /// Negative values never name a post.
    pub fn from_raw(raw: i64) -> Result<Self, TypeError> {
        u64::try_from(raw)
            .map(Self)
            .map_err(|_| TypeError::NegativeId(raw))
    }

    /// Big-endian encoding used by the time index.
    pub fn to_be_bytes(self) -> [u8; Self::ENCODED_LEN] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; Self::ENCODED_LEN]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostId({})", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = TypeError;

    /// Parse a decimal file name. Signs, whitespace and leading `+` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidId(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidId(s.to_string()))
    }
}

impl From<u64> for PostId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<PostId> for u64 {
    fn from(id: PostId) -> Self {
        id.0
    }
}
