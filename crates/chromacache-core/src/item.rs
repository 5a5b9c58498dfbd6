//! Media item identity and fingerprint value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Stable unique identifier for a media item, used as the cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(u128);

impl ItemId {
    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Fixed-width 32-digit lowercase hex token, safe for use as a filename.
    /// Distinct ids always produce distinct tokens.
    pub fn cache_token(&self) -> String {
        format!("{:032x}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid item id {input:?}")]
pub struct ParseItemIdError {
    input: String,
}

impl FromStr for ItemId {
    type Err = ParseItemIdError;

    /// Parses a hex token, tolerating GUID-style hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.is_empty() || hex.len() > 32 {
            return Err(ParseItemIdError {
                input: s.to_string(),
            });
        }
        u128::from_str_radix(&hex, 16)
            .map(ItemId)
            .map_err(|_| ParseItemIdError {
                input: s.to_string(),
            })
    }
}

/// An item queued for fingerprinting. Owned by the caller; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedItem {
    pub id: ItemId,
    pub media_path: PathBuf,
    /// Length, in seconds, of the media segment to analyze
    pub fingerprint_duration_s: u32,
}

impl QueuedItem {
    pub fn new(id: ItemId, media_path: impl Into<PathBuf>, fingerprint_duration_s: u32) -> Self {
        Self {
            id,
            media_path: media_path.into(),
            fingerprint_duration_s,
        }
    }
}

/// Ordered sequence of unsigned 32-bit values summarizing acoustic content.
///
/// Order is the temporal sequence of feature windows and is semantically
/// significant. The sequence is immutable once produced; there is no mutable
/// access. Empty fingerprints are legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint(Vec<u32>);

impl Fingerprint {
    pub fn new(values: Vec<u32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Fingerprint {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
