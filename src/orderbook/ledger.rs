//! Order ledger: the append-only order history for one side.
//!
//! ## Design
//!
//! All orders of a side live in one slab arena. Each (price) bucket holds the
//! slab keys of its orders in arrival order, so an order's 1-based position
//! in the bucket is its stable index:
//!
//! ```text
//! bucket @ 2:  keys [k0, k1, k2, k3]        indices 1..=4
//!                         ^
//!                   next_unfilled = 1       (order #1 fully matched)
//! ```
//!
//! - Appending never shifts or reuses an index
//! - `next_unfilled` only moves forward, past every fully matched order,
//!   so matching never rescans exhausted history
//! - Orders are only removed from the arena when a failed placement
//!   rolls back its own append
//!
//! Per slab docs (https://docs.rs/slab/0.4.11), keys freed by a rollback may
//! be handed out again; buckets only ever reference live keys.

use std::collections::HashMap;

use slab::Slab;

use crate::error::{BookError, InvariantViolation, Result};
use crate::orderbook::journal::{Journal, Undo};
use crate::types::{Order, Price, Side};

/// Orders recorded at one price.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    /// Slab keys in arrival order; position + 1 is the order index
    keys: Vec<usize>,

    /// Position of the earliest order not yet fully matched
    next_unfilled: usize,
}

impl Bucket {
    /// Number of orders ever placed at this price
    #[inline]
    pub fn counter(&self) -> u64 {
        self.keys.len() as u64
    }

    /// 1-based index of the earliest unfilled order, if any
    #[inline]
    pub fn next_unfilled_index(&self) -> Option<u64> {
        (self.next_unfilled < self.keys.len()).then(|| self.next_unfilled as u64 + 1)
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.next_unfilled
    }
}

/// Append-only per-price order sequences for one side.
#[derive(Debug, Clone)]
pub struct OrderLedger {
    side: Side,
    orders: Slab<Order>,
    buckets: HashMap<Price, Bucket>,
}

impl OrderLedger {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            orders: Slab::new(),
            buckets: HashMap::new(),
        }
    }

    /// Create a ledger with room for `capacity` orders before reallocating
    pub fn with_capacity(side: Side, capacity: usize) -> Self {
        Self {
            side,
            orders: Slab::with_capacity(capacity),
            buckets: HashMap::new(),
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Total orders recorded on this side
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[inline]
    pub fn bucket(&self, price: Price) -> Option<&Bucket> {
        self.buckets.get(&price)
    }

    /// Orders ever placed at `price`
    #[inline]
    pub fn counter(&self, price: Price) -> u64 {
        self.buckets.get(&price).map_or(0, Bucket::counter)
    }

    /// Order `index` (1-based) at `price`
    pub fn get(&self, price: Price, index: u64) -> Option<&Order> {
        let key = self.key(price, index)?;
        self.orders.get(key)
    }

    /// Orders at `price` in index order
    pub fn orders_at(&self, price: Price) -> impl Iterator<Item = &Order> + '_ {
        self.buckets
            .get(&price)
            .into_iter()
            .flat_map(|bucket| bucket.keys.iter())
            .filter_map(|&key| self.orders.get(key))
    }

    /// Prices that have ever held an order, ascending
    pub fn prices(&self) -> Vec<Price> {
        let mut prices: Vec<Price> = self.buckets.keys().copied().collect();
        prices.sort_unstable();
        prices
    }

    /// Unmatched volume over every order at `price`, `None` on overflow
    pub fn resting_amount(&self, price: Price) -> Option<u128> {
        self.orders_at(price)
            .try_fold(0u128, |acc, order| acc.checked_add(order.remaining()))
    }

    /// Earliest order at `price` that still has volume, with its index
    pub fn next_unfilled(&self, price: Price) -> Option<(u64, &Order)> {
        let bucket = self.buckets.get(&price)?;
        let index = bucket.next_unfilled_index()?;
        let order = self.orders.get(bucket.keys[bucket.next_unfilled])?;
        Some((index, order))
    }

    fn key(&self, price: Price, index: u64) -> Option<usize> {
        let position = usize::try_from(index.checked_sub(1)?).ok()?;
        self.buckets.get(&price)?.keys.get(position).copied()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Append `order` to the bucket at `price` and return its 1-based index
    pub fn append(&mut self, price: Price, order: Order, journal: &mut Journal) -> u64 {
        let key = self.orders.insert(order);
        let bucket = self.buckets.entry(price).or_default();
        bucket.keys.push(key);

        journal.record(Undo::Appended {
            side: self.side,
            price,
        });
        bucket.counter()
    }

    /// Mark `fill` more units of order `index` at `price` as matched.
    ///
    /// Advances the bucket cursor past every fully matched order. Returns
    /// whether the order is now filled.
    pub fn record_match(&mut self, price: Price, index: u64, fill: u128, journal: &mut Journal) -> Result<bool> {
        let side = self.side;
        let key = self
            .key(price, index)
            .ok_or_else(|| BookError::arithmetic(side, price, "matched order index out of range"))?;
        let order = self
            .orders
            .get_mut(key)
            .ok_or_else(|| BookError::arithmetic(side, price, "matched order missing from arena"))?;

        let previous = order.amount_matched;
        order
            .record_match(fill)
            .ok_or_else(|| BookError::arithmetic(side, price, "amount_matched would exceed amount"))?;
        journal.record(Undo::Matched {
            side,
            price,
            index,
            previous,
        });

        let filled = order.is_filled();
        if filled {
            self.advance_cursor(price, journal);
        }
        Ok(filled)
    }

    fn advance_cursor(&mut self, price: Price, journal: &mut Journal) {
        let Some(bucket) = self.buckets.get_mut(&price) else {
            return;
        };

        let previous = bucket.next_unfilled;
        let mut cursor = previous;
        while let Some(&key) = bucket.keys.get(cursor) {
            match self.orders.get(key) {
                Some(order) if !order.is_filled() => break,
                _ => cursor += 1,
            }
        }

        if cursor != previous {
            journal.record(Undo::Cursor {
                side: self.side,
                price,
                previous,
            });
            bucket.next_unfilled = cursor;
        }
    }

    /// Revert one journaled ledger write. Ladder entries are ignored.
    pub(crate) fn undo(&mut self, undo: &Undo) {
        match *undo {
            Undo::Matched {
                price,
                index,
                previous,
                ..
            } => {
                if let Some(order) = self.key(price, index).and_then(|key| self.orders.get_mut(key)) {
                    order.amount_matched = previous;
                }
            }
            Undo::Cursor { price, previous, .. } => {
                if let Some(bucket) = self.buckets.get_mut(&price) {
                    bucket.next_unfilled = previous;
                }
            }
            Undo::Appended { price, .. } => {
                let Some(bucket) = self.buckets.get_mut(&price) else {
                    return;
                };
                if let Some(key) = bucket.keys.pop() {
                    self.orders.remove(key);
                }
                if bucket.keys.is_empty() {
                    self.buckets.remove(&price);
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Verify the cursor and per-order bounds of the bucket at `price`.
    pub fn check_bucket(&self, price: Price) -> std::result::Result<(), InvariantViolation> {
        let violation = |detail| InvariantViolation::Bucket {
            side: self.side,
            price,
            detail,
        };
        let Some(bucket) = self.buckets.get(&price) else {
            return Ok(());
        };

        if bucket.next_unfilled > bucket.keys.len() {
            return Err(violation("cursor past end of bucket"));
        }
        for (position, &key) in bucket.keys.iter().enumerate() {
            let order = self
                .orders
                .get(key)
                .ok_or_else(|| violation("bucket references freed key"))?;
            if order.amount_matched > order.amount {
                return Err(violation("amount_matched exceeds amount"));
            }
            if position < bucket.next_unfilled && !order.is_filled() {
                return Err(violation("unfilled order behind cursor"));
            }
        }
        if let Some(&key) = bucket.keys.get(bucket.next_unfilled) {
            if self.orders.get(key).is_some_and(Order::is_filled) {
                return Err(violation("cursor rests on a filled order"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(orders: &[(Price, u64, u128)]) -> OrderLedger {
        let mut ledger = OrderLedger::new(Side::Buy);
        let mut journal = Journal::new();
        for &(price, maker, amount) in orders {
            ledger.append(price, Order::new(maker, amount), &mut journal);
        }
        ledger
    }

    #[test]
    fn test_append_assigns_stable_indices() {
        let mut ledger = OrderLedger::new(Side::Sell);
        let mut journal = Journal::new();

        assert_eq!(ledger.append(2, Order::new(10, 1_000), &mut journal), 1);
        assert_eq!(ledger.append(3, Order::new(11, 1_000), &mut journal), 1);
        assert_eq!(ledger.append(2, Order::new(12, 500), &mut journal), 2);

        assert_eq!(ledger.counter(2), 2);
        assert_eq!(ledger.counter(3), 1);
        assert_eq!(ledger.counter(4), 0);
        assert_eq!(ledger.get(2, 1), Some(&Order::new(10, 1_000)));
        assert_eq!(ledger.get(2, 2), Some(&Order::new(12, 500)));
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_get_out_of_range() {
        let ledger = ledger_with(&[(2, 1, 10)]);

        assert!(ledger.get(2, 0).is_none());
        assert!(ledger.get(2, 2).is_none());
        assert!(ledger.get(5, 1).is_none());
    }

    #[test]
    fn test_partial_match_keeps_cursor() {
        let mut ledger = ledger_with(&[(2, 1, 100), (2, 2, 50)]);
        let mut journal = Journal::new();

        let filled = ledger.record_match(2, 1, 40, &mut journal).unwrap();

        assert!(!filled);
        let (index, order) = ledger.next_unfilled(2).unwrap();
        assert_eq!(index, 1);
        assert_eq!(order.amount_matched, 40);
        assert_eq!(ledger.resting_amount(2), Some(110));
    }

    #[test]
    fn test_full_match_advances_cursor() {
        let mut ledger = ledger_with(&[(2, 1, 100), (2, 2, 50)]);
        let mut journal = Journal::new();

        assert!(ledger.record_match(2, 1, 100, &mut journal).unwrap());
        assert_eq!(ledger.next_unfilled(2).map(|(i, _)| i), Some(2));

        assert!(ledger.record_match(2, 2, 50, &mut journal).unwrap());
        assert!(ledger.next_unfilled(2).is_none());

        // History is kept
        assert_eq!(ledger.counter(2), 2);
        assert_eq!(ledger.get(2, 1).unwrap().amount_matched, 100);
        ledger.check_bucket(2).unwrap();
    }

    #[test]
    fn test_overmatch_is_violation() {
        let mut ledger = ledger_with(&[(2, 1, 100)]);
        let mut journal = Journal::new();

        let err = ledger.record_match(2, 1, 101, &mut journal).unwrap_err();

        assert!(matches!(err, BookError::ArithmeticViolation { price: 2, .. }));
        assert_eq!(ledger.get(2, 1).unwrap().amount_matched, 0);
        assert!(journal.is_empty());
    }

    #[test]
    fn test_match_unknown_index() {
        let mut ledger = ledger_with(&[(2, 1, 100)]);
        let mut journal = Journal::new();

        assert!(ledger.record_match(2, 3, 1, &mut journal).is_err());
        assert!(ledger.record_match(7, 1, 1, &mut journal).is_err());
    }

    #[test]
    fn test_undo_restores_ledger() {
        let mut ledger = ledger_with(&[(2, 1, 100), (2, 2, 50)]);
        let mut journal = Journal::new();

        ledger.record_match(2, 1, 100, &mut journal).unwrap();
        ledger.record_match(2, 2, 20, &mut journal).unwrap();
        ledger.append(2, Order::new(3, 70), &mut journal);
        ledger.append(9, Order::new(4, 70), &mut journal);

        for undo in journal.into_rollback() {
            ledger.undo(&undo);
        }

        assert_eq!(ledger.counter(2), 2);
        assert_eq!(ledger.counter(9), 0);
        assert!(ledger.bucket(9).is_none());
        assert_eq!(ledger.get(2, 1).unwrap().amount_matched, 0);
        assert_eq!(ledger.get(2, 2).unwrap().amount_matched, 0);
        assert_eq!(ledger.next_unfilled(2).map(|(i, _)| i), Some(1));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_prices_sorted() {
        let ledger = ledger_with(&[(9, 1, 1), (2, 1, 1), (5, 1, 1)]);
        assert_eq!(ledger.prices(), vec![2, 5, 9]);
    }

    #[test]
    fn test_check_bucket_detects_bad_cursor() {
        let mut ledger = ledger_with(&[(2, 1, 100)]);
        ledger.buckets.get_mut(&2).unwrap().next_unfilled = 1;

        let err = ledger.check_bucket(2).unwrap_err();
        assert!(matches!(err, InvariantViolation::Bucket { price: 2, .. }));
    }
}
