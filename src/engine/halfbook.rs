//! Price-ordered level container with a fixed bid/ask polarity.
//!
//! `Halfbook` is the primitive underlying every other operation in this
//! crate: the Compressor diffs two of them, the Traverser mutates two of
//! them in place, and a Checkpoint is, at heart, two cloned `Halfbook`s.

use super::price::{ParseError, Price, Size};
use std::cmp::Ordering;
use std::ops::{Index, Range};

/// The fixed orientation of a [`Halfbook`], chosen at construction.
///
/// Bids sort by descending price (index 0 is the highest bid); asks sort
/// by ascending price (index 0 is the lowest ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Descending price order.
    Bid,
    /// Ascending price order.
    Ask,
}

/// A finite, price-ordered sequence of `(price, size)` levels with a fixed
/// polarity.
///
/// Invariants upheld by every public method:
/// - prices are unique within the halfbook;
/// - entries are sorted best-first according to `side`;
/// - no entry ever has a size that parses to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halfbook {
    side: Side,
    levels: Vec<(Price, Size)>,
}

impl Halfbook {
    /// Creates an empty halfbook with the given polarity.
    pub fn new(side: Side) -> Self {
        Halfbook {
            side,
            levels: Vec::new(),
        }
    }

    /// This halfbook's fixed polarity.
    pub fn side(&self) -> Side {
        self.side
    }

    /// The best-first ordering comparator for this polarity.
    fn order(&self, a: &Price, b: &Price) -> Ordering {
        match self.side {
            Side::Bid => b.cmp(a),
            Side::Ask => a.cmp(b),
        }
    }

    /// Locates `price`'s position. `Ok(i)` means an entry already exists at
    /// index `i`; `Err(i)` means `price` belongs at index `i` to keep the
    /// sequence ordered.
    fn locate(&self, price: &Price) -> Result<usize, usize> {
        self.levels
            .binary_search_by(|(p, _)| self.order(p, price))
    }

    /// Replaces the halfbook's contents from an unsorted batch, sorting
    /// once by polarity.
    pub fn set(&mut self, entries: Vec<(Price, Size)>) {
        let mut levels = entries;
        levels.sort_by(|(a, _), (b, _)| self.order(a, b));
        self.levels = levels;
    }

    /// Applies a single level update.
    ///
    /// - present + nonzero size: replace the size.
    /// - present + zero size: remove the level.
    /// - absent + nonzero size: insert at the polarity-correct position.
    /// - absent + zero size: a delete for a level that never existed; this
    ///   is tolerated upstream noise, logged at `warn` and otherwise a
    ///   no-op.
    ///
    /// # Errors
    /// Returns [`ParseError`] if `size` is not a valid decimal string.
    pub fn update(&mut self, price: Price, size: Size) -> Result<(), ParseError> {
        let is_zero = size.is_zero()?;
        match self.locate(&price) {
            Ok(idx) => {
                if is_zero {
                    self.levels.remove(idx);
                } else {
                    self.levels[idx].1 = size;
                }
            }
            Err(idx) => {
                if is_zero {
                    tracing::warn!(
                        price = %price,
                        "Halfbook::update: delete requested for a level that does not exist"
                    );
                } else {
                    self.levels.insert(idx, (price, size));
                }
            }
        }
        Ok(())
    }

    /// Returns the size at `price`, or the empty sentinel if absent.
    pub fn qty_at(&self, price: Price) -> Size {
        match self.locate(&price) {
            Ok(idx) => self.levels[idx].1.clone(),
            Err(_) => Size::empty(),
        }
    }

    /// Returns the best `n` entries, best-first.
    pub fn top_n(&self, n: usize) -> &[(Price, Size)] {
        &self.levels[..n.min(self.levels.len())]
    }

    /// All entries, best-first.
    pub fn levels(&self) -> &[(Price, Size)] {
        &self.levels
    }

    /// Number of levels currently held.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether this halfbook holds no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Produces an independent clone, for the Compressor's copy-on-write
    /// diffing and the Traverser's checkpoint snapshots.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl Index<usize> for Halfbook {
    type Output = (Price, Size);

    fn index(&self, i: usize) -> &Self::Output {
        &self.levels[i]
    }
}

impl Index<Range<usize>> for Halfbook {
    type Output = [(Price, Size)];

    fn index(&self, r: Range<usize>) -> &Self::Output {
        &self.levels[r]
    }
}
