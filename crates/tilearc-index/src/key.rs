//! Path keys: MD5 digests of normalized archive entry paths
//!
//! A [`PathKey`] is the 16-byte MD5 digest of an entry path exactly as it is
//! stored in the archive (forward slashes, original case). Keys order by their
//! two little-endian 64-bit halves, low half first. Every sort and every
//! binary search in this crate goes through [`PathKey::cmp`], so build-time
//! order and query-time order cannot drift apart.

use binrw::{BinRead, BinWrite};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Size of a path key in bytes
pub const KEY_SIZE: usize = 16;

/// 128-bit key derived from an archive entry path
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathKey([u8; KEY_SIZE]);

impl PathKey {
    /// Create path key from raw bytes
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derive the key for an entry path
    ///
    /// The path is hashed as given. Callers that accept user input should run
    /// it through [`normalize_path`] first.
    pub fn from_path(path: &str) -> Self {
        Self(md5::compute(path.as_bytes()).into())
    }

    /// Parse path key from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; KEY_SIZE];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Low 64-bit half (bytes 0..8, little-endian)
    pub fn low(&self) -> u64 {
        let mut half = [0u8; 8];
        half.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(half)
    }

    /// High 64-bit half (bytes 8..16, little-endian)
    pub fn high(&self) -> u64 {
        let mut half = [0u8; 8];
        half.copy_from_slice(&self.0[8..]);
        u64::from_le_bytes(half)
    }
}

impl Ord for PathKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.low()
            .cmp(&other.low())
            .then_with(|| self.high().cmp(&other.high()))
    }
}

impl PartialOrd for PathKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<&str> for PathKey {
    fn from(path: &str) -> Self {
        Self::from_path(path)
    }
}

/// Normalize an entry path the way archive entries are named
///
/// Backslashes become forward slashes, leading `./` and `/` are dropped, and
/// repeated separators collapse. Case is preserved.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut trimmed = unified.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }

    let mut normalized = String::with_capacity(trimmed.len());
    let mut previous_slash = false;
    for ch in trimmed.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(ch);
    }
    normalized
}
