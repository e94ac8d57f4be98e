//! Undo journal for one placement.
//!
//! Every ladder and ledger mutation made while a placement is in flight
//! records the state it overwrote. Committing drops the journal; a failure
//! replays the entries newest-first through
//! [`OrderBook`](crate::orderbook::OrderBook), restoring the book exactly.

use crate::orderbook::PriceStep;
use crate::types::{Price, Side};

/// State overwritten by a single mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Undo {
    /// Step at `price` before the write; `None` if it did not exist
    Step {
        side: Side,
        price: Price,
        previous: Option<PriceStep>,
    },
    /// Ladder ends before a link or unlink
    Ends {
        side: Side,
        lowest: Price,
        highest: Price,
    },
    /// `amount_matched` of order `index` before a fill
    Matched {
        side: Side,
        price: Price,
        index: u64,
        previous: u128,
    },
    /// Unfilled cursor of a bucket before it advanced
    Cursor {
        side: Side,
        price: Price,
        previous: usize,
    },
    /// An order appended to the bucket at `price`
    Appended { side: Side, price: Price },
}

impl Undo {
    /// Side of the book the entry belongs to
    pub fn side(&self) -> Side {
        match *self {
            Undo::Step { side, .. }
            | Undo::Ends { side, .. }
            | Undo::Matched { side, .. }
            | Undo::Cursor { side, .. }
            | Undo::Appended { side, .. } => side,
        }
    }
}

#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<Undo>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, undo: Undo) {
        self.entries.push(undo);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newest-first, consuming the journal
    pub fn into_rollback(self) -> impl Iterator<Item = Undo> {
        self.entries.into_iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_order_is_reversed() {
        let mut journal = Journal::new();
        journal.record(Undo::Appended { side: Side::Buy, price: 1 });
        journal.record(Undo::Appended { side: Side::Buy, price: 2 });

        let prices: Vec<Price> = journal
            .into_rollback()
            .map(|undo| match undo {
                Undo::Appended { price, .. } => price,
                _ => 0,
            })
            .collect();

        assert_eq!(prices, vec![2, 1]);
    }

    #[test]
    fn test_empty_journal() {
        let journal = Journal::new();
        assert!(journal.is_empty());
        assert_eq!(journal.len(), 0);
    }
}
