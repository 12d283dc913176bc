//! Streaming delta compression against the previous top-N view.

use super::config::CompressorConfig;
use super::halfbook::{Halfbook, Side};
use super::price::{ParseError, Price, Size};
use super::records::{CompressedRecord, LevelEntry, RawMessage};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Errors raised while compressing a raw exchange feed.
#[derive(Debug)]
#[non_exhaustive]
pub enum CompressorError {
    /// The first message processed was not a snapshot, or a snapshot was
    /// missing a required field.
    Protocol(String),
    /// A price or size string did not parse as a decimal.
    Parse(ParseError),
    /// The raw message line was not valid JSON.
    Deserialize(serde_json::Error),
    /// An I/O error occurred while reading input or writing output.
    Io(io::Error),
}

impl fmt::Display for CompressorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressorError::Protocol(message) => write!(f, "protocol error: {message}"),
            CompressorError::Parse(err) => write!(f, "parse error: {err}"),
            CompressorError::Deserialize(err) => write!(f, "malformed input line: {err}"),
            CompressorError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for CompressorError {}

impl From<ParseError> for CompressorError {
    fn from(err: ParseError) -> Self {
        CompressorError::Parse(err)
    }
}

impl From<serde_json::Error> for CompressorError {
    fn from(err: serde_json::Error) -> Self {
        CompressorError::Deserialize(err)
    }
}

impl From<io::Error> for CompressorError {
    fn from(err: io::Error) -> Self {
        CompressorError::Io(err)
    }
}

/// Computes the minimal set of `(price, size)` entries needed to move a
/// consumer who last saw `old_top` to `new_top`.
///
/// - a price in `new_top` but not `old_top` entered the top-N: emitted as-is.
/// - a price in both with a changed size: emitted as-is.
/// - a price in `old_top` but not `new_top` left the top-N: emitted with
///   size `"0"`, regardless of whether it still exists deeper in the book.
/// - unchanged prices are omitted.
///
/// Emission order within the returned vector is unspecified.
fn compute_delta(new_top: &[LevelEntry], old_top: &[LevelEntry]) -> Vec<LevelEntry> {
    let old_map: HashMap<Price, &Size> = old_top.iter().map(|(p, q)| (*p, q)).collect();
    let new_prices: std::collections::HashSet<Price> = new_top.iter().map(|(p, _)| *p).collect();

    let mut changes = Vec::new();
    for (price, size) in new_top {
        match old_map.get(price) {
            None => changes.push((*price, size.clone())),
            Some(old_size) if *old_size != size => changes.push((*price, size.clone())),
            Some(_) => {}
        }
    }
    for (price, _) in old_top {
        if !new_prices.contains(price) {
            changes.push((*price, Size::new("0")));
        }
    }
    changes
}

/// A streaming transducer that consumes raw snapshot/delta messages and
/// emits the minimum delta against the previous top-N view.
///
/// Maintains a full internal book per side; only the top
/// [`CompressorConfig::max_output_depth`] levels are ever compared or
/// emitted.
pub struct Compressor {
    bids: Halfbook,
    asks: Halfbook,
    config: CompressorConfig,
    first_message: bool,
}

impl Compressor {
    /// Creates a new compressor with the given configuration.
    pub fn new(config: CompressorConfig) -> Self {
        Compressor {
            bids: Halfbook::new(Side::Bid),
            asks: Halfbook::new(Side::Ask),
            config,
            first_message: true,
        }
    }

    /// Processes one raw message, returning the compressed record to emit
    /// for it, or `None` if the message produced no change to either
    /// side's top-N view.
    ///
    /// # Errors
    /// Returns [`CompressorError::Protocol`] if the first message is not a
    /// snapshot, or if a snapshot is missing `b`/`a`. Returns
    /// [`CompressorError::Parse`] on a non-numeric price or size.
    pub fn process_message(
        &mut self,
        message: &RawMessage,
    ) -> Result<Option<CompressedRecord>, CompressorError> {
        if self.first_message {
            return self.process_snapshot(message).map(Some);
        }

        let depth = self.config.max_output_depth;

        let bid_deltas = match &message.data.b {
            Some(updates) if !updates.is_empty() => {
                let mut new_bids = self.bids.copy();
                for (price, size) in updates {
                    new_bids.update(*price, size.clone())?;
                }
                let deltas = compute_delta(new_bids.top_n(depth), self.bids.top_n(depth));
                self.bids = new_bids;
                Some(deltas)
            }
            _ => None,
        };

        let ask_deltas = match &message.data.a {
            Some(updates) if !updates.is_empty() => {
                let mut new_asks = self.asks.copy();
                for (price, size) in updates {
                    new_asks.update(*price, size.clone())?;
                }
                let deltas = compute_delta(new_asks.top_n(depth), self.asks.top_n(depth));
                self.asks = new_asks;
                Some(deltas)
            }
            _ => None,
        };

        let bid_deltas = bid_deltas.filter(|d| !d.is_empty());
        let ask_deltas = ask_deltas.filter(|d| !d.is_empty());

        let record = CompressedRecord {
            t: message.ts,
            s: message.data.seq,
            b: bid_deltas,
            a: ask_deltas,
        };

        if record.is_empty() {
            tracing::debug!(t = message.ts, "no top-N change, emitting nothing");
            return Ok(None);
        }

        tracing::debug!(t = message.ts, s = message.data.seq, "emitting delta record");
        Ok(Some(record))
    }

    fn process_snapshot(
        &mut self,
        message: &RawMessage,
    ) -> Result<CompressedRecord, CompressorError> {
        if message.msg_type != "snapshot" {
            return Err(CompressorError::Protocol(format!(
                "first message must be a snapshot, got {:?}",
                message.msg_type
            )));
        }
        let bids = message
            .data
            .b
            .clone()
            .ok_or_else(|| CompressorError::Protocol("snapshot missing 'b'".into()))?;
        let asks = message
            .data
            .a
            .clone()
            .ok_or_else(|| CompressorError::Protocol("snapshot missing 'a'".into()))?;

        self.bids.set(bids);
        self.asks.set(asks);
        self.first_message = false;

        let depth = self.config.max_output_depth;
        tracing::debug!(t = message.ts, "emitting initial snapshot");
        Ok(CompressedRecord::snapshot(
            message.ts,
            message.data.seq,
            self.bids.top_n(depth).to_vec(),
            self.asks.top_n(depth).to_vec(),
        ))
    }

    /// Reads line-delimited [`RawMessage`]s from `input` and writes
    /// line-delimited [`CompressedRecord`]s to `output`, flushing after
    /// every emitted record so a failing line leaves all prior output
    /// durable on disk.
    ///
    /// # Errors
    /// Propagates the same errors as [`Compressor::process_message`], plus
    /// I/O errors from the reader/writer.
    pub fn compress_transcript(
        &mut self,
        input: impl BufRead,
        mut output: impl Write,
    ) -> Result<(), CompressorError> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let message: RawMessage = serde_json::from_str(&line)?;
            if let Some(record) = self.process_message(&message)? {
                let serialized = serde_json::to_string(&record)
                    .map_err(CompressorError::Deserialize)?;
                writeln!(output, "{serialized}")?;
                output.flush()?;
            }
        }
        Ok(())
    }
}

/// Rewrites an input filename's `ob500` depth token to `ob<max_levels>`
/// for the compressed output path, per the `YYYY-MM-DD_<SYMBOL>_ob<depth>.data`
/// filesystem layout.
pub fn compressed_output_path(input: &Path, max_levels: usize) -> PathBuf {
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let rewritten = file_name.replace("ob500", &format!("ob{max_levels}"));
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(rewritten),
        _ => PathBuf::from(rewritten),
    }
}
