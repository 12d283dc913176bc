//! Wire-format record types: the raw exchange feed consumed by the
//! Compressor, and the compressed transcript produced by it and consumed
//! by the Traverser.
//!
//! Both are explicit, validated types rather than untyped JSON maps: an
//! absent side on a delta is `None`, not a missing key probed for at each
//! use site.

use super::price::{Price, Size};
use serde::{Deserialize, Serialize};

/// A single `[price, size]` level entry as it appears inside `b`/`a`
/// arrays on the wire.
pub type LevelEntry = (Price, Size);

/// A raw message from the upstream exchange feed:
/// `{"type": ..., "ts": ..., "data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    /// `"snapshot"` or `"delta"`.
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Millisecond upstream timestamp.
    pub ts: i64,
    /// The payload.
    pub data: RawData,
}

/// The `data` payload of a [`RawMessage`].
///
/// `b` and `a` are `None` when the key is absent from the JSON object
/// (legal on a delta, a protocol error on the first/snapshot message),
/// distinct from `Some(vec![])` when the key is present but empty.
#[derive(Debug, Clone, Deserialize)]
pub struct RawData {
    /// Upstream sequence number.
    pub seq: i64,
    /// Bid-side level updates, if present.
    #[serde(default)]
    pub b: Option<Vec<LevelEntry>>,
    /// Ask-side level updates, if present.
    #[serde(default)]
    pub a: Option<Vec<LevelEntry>>,
}

/// One line of the compressed transcript: a snapshot (line 1, both sides
/// always present) or a delta (sides present only if they changed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedRecord {
    /// Millisecond upstream timestamp.
    pub t: i64,
    /// Upstream sequence number.
    pub s: i64,
    /// Bid-side top-N changes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Vec<LevelEntry>>,
    /// Ask-side top-N changes, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Vec<LevelEntry>>,
}

impl CompressedRecord {
    /// A snapshot record: both sides always present, even if empty.
    pub fn snapshot(t: i64, s: i64, bids: Vec<LevelEntry>, asks: Vec<LevelEntry>) -> Self {
        CompressedRecord {
            t,
            s,
            b: Some(bids),
            a: Some(asks),
        }
    }

    /// Whether this record carries no changes on either side.
    pub fn is_empty(&self) -> bool {
        self.b.as_ref().is_none_or(Vec::is_empty) && self.a.as_ref().is_none_or(Vec::is_empty)
    }
}
