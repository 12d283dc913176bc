//! The reconstructed book's internal and external representations.

use super::halfbook::Halfbook;
use super::price::Price;

/// The full reconstructed state at a point in the transcript: both
/// halfbooks plus the upstream timestamp/sequence pair they were built
/// from.
#[derive(Debug, Clone)]
pub struct OrderbookState {
    /// Bid-side levels, best-first (highest price at index 0).
    pub bids: Halfbook,
    /// Ask-side levels, best-first (lowest price at index 0).
    pub asks: Halfbook,
    /// Millisecond upstream timestamp of the last record applied.
    pub timestamp: i64,
    /// Upstream sequence number of the last record applied.
    pub sequence: i64,
}

/// The float-valued replay-time projection delivered to consumers.
///
/// Internal decimal exactness is intentionally discarded at this
/// boundary: downstream analytics work in float. Per the legacy
/// convention consumers rely on, `asks` is stored best-*last*:
/// `asks.last()` is the lowest (best) ask, the mirror image of `bids[0]`
/// being the highest (best) bid.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBook {
    /// The instrument this book is for.
    pub symbol: String,
    /// `(price, volume)` pairs, ascending price — best ask is `.last()`.
    pub asks: Vec<(f64, f64)>,
    /// `(price, volume)` pairs, descending price — best bid is `[0]`.
    pub bids: Vec<(f64, f64)>,
    /// Millisecond timestamp this view was observed at.
    pub timestamp: i64,
}

impl OrderBook {
    /// The highest bid price, if any bids are present.
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|(p, _)| *p)
    }

    /// The lowest ask price, if any asks are present.
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.last().map(|(p, _)| *p)
    }

    /// The size resting at the best bid, if any bids are present.
    pub fn bid_volume(&self) -> Option<f64> {
        self.bids.first().map(|(_, q)| *q)
    }

    /// The size resting at the best ask, if any asks are present.
    pub fn ask_volume(&self) -> Option<f64> {
        self.asks.last().map(|(_, q)| *q)
    }

    /// The mean of best bid and best ask, if both sides are present.
    pub fn midprice(&self) -> Option<f64> {
        Some((self.best_bid()? + self.best_ask()?) / 2.0)
    }

    /// `best_ask - best_bid`, if both sides are present.
    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()? - self.best_bid()?)
    }
}

/// The best-bid/best-ask extremes observed while `Traverser::move`d across
/// an interval, since `move` does not consult the checkpoint cache and
/// must see every intermediate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    /// The lowest best-ask price seen over the interval.
    pub lowest_ask: Option<Price>,
    /// The highest best-bid price seen over the interval.
    pub highest_bid: Option<Price>,
    /// Logical timestamp the interval started at.
    pub start_time: i64,
    /// Logical timestamp the interval ended at.
    pub end_time: i64,
}
