//! `ob-history`: streaming delta compression of exchange order-book feeds,
//! and cache-accelerated random-access replay of the reconstructed book.
//!
//! The crate is built around two independent pieces:
//!
//! - [`engine::compressor::Compressor`] consumes raw exchange
//!   snapshot/delta messages and emits the minimum delta against the
//!   previously emitted top-N view, one line of compressed JSON per
//!   emitted change.
//! - [`engine::traverser::Traverser`] reads a compressed transcript back
//!   and replays it: step one update-set at a time, skip forward or
//!   backward by a duration, seek to a timestamp, or scan an interval
//!   while tracking its best-bid/best-ask extremes.
//!
//! Both are built on [`engine::halfbook::Halfbook`], a price-ordered level
//! container with a fixed bid/ask polarity, and share the exact-decimal
//! [`engine::price::Price`]/[`engine::price::Size`] scalar types.
//!
//! See [`prelude`] for the common import set.

pub mod engine;
pub mod prelude;

pub use engine::{
    compressed_output_path, CompressedRecord, Compressor, CompressorConfig, CompressorError,
    FPCache, Halfbook, LevelEntry, OrderBook, OrderbookState, ParseError, Price, PriceRange,
    RawData, RawMessage, Side, Size, Traverser, TraverserConfig, TraverserError,
};
