//! Convenience re-export of the crate's common types.
//!
//! ```
//! use ob_history::prelude::*;
//! ```

pub use crate::engine::{
    CompressedRecord, Compressor, CompressorConfig, CompressorError, FPCache, Halfbook,
    OrderBook, OrderbookState, ParseError, Price, PriceRange, RawMessage, Side, Size, Traverser,
    TraverserConfig, TraverserError,
};
