//! Price ladder: the sorted chain of occupied steps for one side.
//!
//! ## Design
//!
//! Steps live in a sparse map keyed by price. Order comes from the links
//! each step carries, not from the map, so the price domain is unbounded and
//! only occupied prices cost memory.
//!
//! ```text
//! lowest                                   highest
//!   |                                         |
//!   v                                         v
//!  [1] <-> [2] <-> [3] <-> ... <-> [n]        (0 terminates both ends)
//! ```
//!
//! - Bids expose `highest` as the best price, asks expose `lowest`
//! - Inserting a new price walks from whichever end is closer in price,
//!   so the cost is the number of occupied levels crossed
//! - A step is unlinked the moment its volume reaches zero
//!
//! Every mutation records what it overwrote in the caller's [`Journal`].

use std::collections::HashMap;

use crate::error::{BookError, InvariantViolation, Result};
use crate::orderbook::journal::{Journal, Undo};
use crate::orderbook::PriceStep;
use crate::types::{Price, Side, NULL_PRICE};

/// Sorted, doubly-linked set of price steps for one side of the book.
#[derive(Debug, Clone)]
pub struct PriceLadder {
    side: Side,

    /// Occupied steps by price
    steps: HashMap<Price, PriceStep>,

    /// Lowest occupied price, `0` when empty
    lowest: Price,

    /// Highest occupied price, `0` when empty
    highest: Price,
}

impl PriceLadder {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            steps: HashMap::new(),
            lowest: NULL_PRICE,
            highest: NULL_PRICE,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of occupied prices
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn lowest(&self) -> Option<Price> {
        (self.lowest != NULL_PRICE).then_some(self.lowest)
    }

    #[inline]
    pub fn highest(&self) -> Option<Price> {
        (self.highest != NULL_PRICE).then_some(self.highest)
    }

    /// Best price for this side: highest bid or lowest ask
    #[inline]
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.highest(),
            Side::Sell => self.lowest(),
        }
    }

    #[inline]
    pub fn get(&self, price: Price) -> Option<&PriceStep> {
        self.steps.get(&price)
    }

    /// Step at `price`, or the all-zero step if the price is unoccupied
    #[inline]
    pub fn step(&self, price: Price) -> PriceStep {
        self.steps.get(&price).copied().unwrap_or_default()
    }

    /// Total volume resting on this side, `None` on overflow
    pub fn total_amount(&self) -> Option<u128> {
        self.steps
            .values()
            .try_fold(0u128, |acc, step| acc.checked_add(step.amount))
    }

    /// Occupied steps in ascending price order
    pub fn iter(&self) -> LadderIter<'_> {
        LadderIter {
            ladder: self,
            next: self.lowest,
        }
    }

    /// `(price, amount)` pairs in ascending price order
    pub fn levels(&self) -> Vec<(Price, u128)> {
        self.iter().map(|(price, step)| (price, step.amount)).collect()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add `volume` at `price`, creating and linking the step if needed.
    ///
    /// Adding zero volume to an unoccupied price is a no-op: an empty step
    /// is never linked.
    pub fn insert_or_grow(&mut self, price: Price, volume: u128, journal: &mut Journal) -> Result<()> {
        if price == NULL_PRICE {
            return Err(BookError::ZeroPrice);
        }

        let side = self.side;
        if let Some(step) = self.steps.get_mut(&price) {
            let previous = *step;
            let amount = previous
                .amount
                .checked_add(volume)
                .ok_or_else(|| BookError::arithmetic(side, price, "step volume overflow"))?;
            journal.record(Undo::Step {
                side,
                price,
                previous: Some(previous),
            });
            step.amount = amount;
            return Ok(());
        }

        if volume == 0 {
            return Ok(());
        }

        let (lower, higher) = self.bracket(price);
        self.record_ends(journal);
        journal.record(Undo::Step {
            side,
            price,
            previous: None,
        });

        if lower != NULL_PRICE {
            self.relink(lower, journal, |step| step.higher_price = price);
        } else {
            self.lowest = price;
        }
        if higher != NULL_PRICE {
            self.relink(higher, journal, |step| step.lower_price = price);
        } else {
            self.highest = price;
        }

        self.steps.insert(price, PriceStep::new(volume, lower, higher));
        Ok(())
    }

    /// Remove up to `volume` from the step at `price`.
    ///
    /// Returns the amount actually drained. A step drained to zero is
    /// unlinked and its neighbors are spliced together.
    pub fn drain(&mut self, price: Price, volume: u128, journal: &mut Journal) -> u128 {
        let side = self.side;
        let Some(step) = self.steps.get_mut(&price) else {
            return 0;
        };

        let previous = *step;
        let drained = volume.min(previous.amount);
        if drained == 0 {
            return 0;
        }

        journal.record(Undo::Step {
            side,
            price,
            previous: Some(previous),
        });

        if drained == previous.amount {
            self.unlink(price, previous, journal);
        } else {
            step.amount = previous.amount - drained;
        }
        drained
    }

    /// Find the occupied prices bracketing an unoccupied `price`.
    fn bracket(&self, price: Price) -> (Price, Price) {
        if self.lowest == NULL_PRICE {
            return (NULL_PRICE, NULL_PRICE);
        }
        if price < self.lowest {
            return (NULL_PRICE, self.lowest);
        }
        if price > self.highest {
            return (self.highest, NULL_PRICE);
        }

        if price - self.lowest <= self.highest - price {
            // Walk up from the low end
            let mut cursor = self.lowest;
            loop {
                let next = self.step(cursor).higher_price;
                if next == NULL_PRICE || next > price {
                    return (cursor, next);
                }
                cursor = next;
            }
        } else {
            // Walk down from the high end
            let mut cursor = self.highest;
            loop {
                let next = self.step(cursor).lower_price;
                if next == NULL_PRICE || next < price {
                    return (next, cursor);
                }
                cursor = next;
            }
        }
    }

    /// Splice `removed` (already journaled) out of the chain.
    fn unlink(&mut self, price: Price, removed: PriceStep, journal: &mut Journal) {
        self.record_ends(journal);

        if removed.has_lower() {
            self.relink(removed.lower_price, journal, |step| {
                step.higher_price = removed.higher_price
            });
        } else {
            self.lowest = removed.higher_price;
        }
        if removed.has_higher() {
            self.relink(removed.higher_price, journal, |step| {
                step.lower_price = removed.lower_price
            });
        } else {
            self.highest = removed.lower_price;
        }

        self.steps.remove(&price);
    }

    fn relink(&mut self, price: Price, journal: &mut Journal, update: impl FnOnce(&mut PriceStep)) {
        let side = self.side;
        if let Some(step) = self.steps.get_mut(&price) {
            journal.record(Undo::Step {
                side,
                price,
                previous: Some(*step),
            });
            update(step);
        }
    }

    fn record_ends(&self, journal: &mut Journal) {
        journal.record(Undo::Ends {
            side: self.side,
            lowest: self.lowest,
            highest: self.highest,
        });
    }

    /// Revert one journaled ladder write. Ledger entries are ignored.
    pub(crate) fn undo(&mut self, undo: &Undo) {
        match *undo {
            Undo::Step {
                price, previous, ..
            } => match previous {
                Some(step) => {
                    self.steps.insert(price, step);
                }
                None => {
                    self.steps.remove(&price);
                }
            },
            Undo::Ends {
                lowest, highest, ..
            } => {
                self.lowest = lowest;
                self.highest = highest;
            }
            _ => {}
        }
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Walk the chain and verify links, ordering and ends.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        let violation = |price, detail| InvariantViolation::Ladder {
            side: self.side,
            price,
            detail,
        };

        if self.steps.is_empty() {
            if self.lowest != NULL_PRICE || self.highest != NULL_PRICE {
                return Err(violation(self.lowest, "empty ladder with non-null ends"));
            }
            return Ok(());
        }

        let mut previous = NULL_PRICE;
        let mut cursor = self.lowest;
        let mut visited = 0usize;

        while cursor != NULL_PRICE {
            let step = self
                .steps
                .get(&cursor)
                .ok_or_else(|| violation(cursor, "linked price has no step"))?;
            if step.lower_price != previous {
                return Err(violation(cursor, "lower link disagrees with walk"));
            }
            if previous != NULL_PRICE && cursor <= previous {
                return Err(violation(cursor, "prices not strictly ascending"));
            }
            if !step.is_occupied() {
                return Err(violation(cursor, "empty step still linked"));
            }

            visited += 1;
            if visited > self.steps.len() {
                return Err(violation(cursor, "cycle in ladder links"));
            }
            previous = cursor;
            cursor = step.higher_price;
        }

        if previous != self.highest {
            return Err(violation(previous, "walk does not end at highest"));
        }
        if visited != self.steps.len() {
            return Err(violation(self.lowest, "step not reachable from lowest"));
        }
        Ok(())
    }
}

/// Ascending iterator over a ladder's occupied steps.
pub struct LadderIter<'a> {
    ladder: &'a PriceLadder,
    next: Price,
}

impl<'a> Iterator for LadderIter<'a> {
    type Item = (Price, &'a PriceStep);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NULL_PRICE {
            return None;
        }
        let price = self.next;
        let step = self.ladder.steps.get(&price)?;
        self.next = step.higher_price;
        Some((price, step))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder_with(side: Side, levels: &[(Price, u128)]) -> PriceLadder {
        let mut ladder = PriceLadder::new(side);
        let mut journal = Journal::new();
        for &(price, volume) in levels {
            ladder.insert_or_grow(price, volume, &mut journal).unwrap();
        }
        ladder
    }

    fn rollback(ladder: &mut PriceLadder, journal: Journal) {
        for undo in journal.into_rollback() {
            ladder.undo(&undo);
        }
    }

    #[test]
    fn test_ladder_new() {
        let ladder = PriceLadder::new(Side::Buy);

        assert!(ladder.is_empty());
        assert_eq!(ladder.len(), 0);
        assert!(ladder.best_price().is_none());
        assert_eq!(ladder.step(1), PriceStep::default());
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_single() {
        let ladder = ladder_with(Side::Buy, &[(1, 1_000)]);

        assert_eq!(ladder.step(1), PriceStep::new(1_000, 0, 0));
        assert_eq!(ladder.best_price(), Some(1));
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_ascending_with_grow() {
        let ladder = ladder_with(Side::Buy, &[(1, 1_000), (2, 1_000), (3, 1_000), (2, 500)]);

        assert_eq!(ladder.step(1), PriceStep::new(1_000, 0, 2));
        assert_eq!(ladder.step(2), PriceStep::new(1_500, 1, 3));
        assert_eq!(ladder.step(3), PriceStep::new(1_000, 2, 0));
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_out_of_order() {
        let ladder = ladder_with(Side::Sell, &[(50, 1), (10, 1), (90, 1), (30, 1), (70, 1), (60, 1)]);

        assert_eq!(
            ladder.levels(),
            vec![(10, 1), (30, 1), (50, 1), (60, 1), (70, 1), (90, 1)]
        );
        assert_eq!(ladder.step(60), PriceStep::new(1, 50, 70));
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_walks_from_high_end() {
        // 95 is closer to the high end, exercises the downward walk
        let ladder = ladder_with(Side::Buy, &[(1, 1), (90, 1), (99, 1), (95, 1)]);

        assert_eq!(ladder.step(95), PriceStep::new(1, 90, 99));
        assert_eq!(ladder.step(90).higher_price, 95);
        assert_eq!(ladder.step(99).lower_price, 95);
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_best_price_per_side() {
        let bids = ladder_with(Side::Buy, &[(5, 1), (7, 1), (3, 1)]);
        let asks = ladder_with(Side::Sell, &[(5, 1), (7, 1), (3, 1)]);

        assert_eq!(bids.best_price(), Some(7));
        assert_eq!(asks.best_price(), Some(3));
    }

    #[test]
    fn test_insert_zero_price_rejected() {
        let mut ladder = PriceLadder::new(Side::Buy);
        let mut journal = Journal::new();

        let err = ladder.insert_or_grow(0, 10, &mut journal).unwrap_err();
        assert_eq!(err, BookError::ZeroPrice);
        assert!(journal.is_empty());
    }

    #[test]
    fn test_insert_zero_volume_is_noop() {
        let mut ladder = PriceLadder::new(Side::Buy);
        let mut journal = Journal::new();

        ladder.insert_or_grow(4, 0, &mut journal).unwrap();
        assert!(ladder.is_empty());
        assert!(journal.is_empty());
    }

    #[test]
    fn test_grow_overflow() {
        let mut ladder = ladder_with(Side::Sell, &[(4, u128::MAX)]);
        let mut journal = Journal::new();

        let err = ladder.insert_or_grow(4, 1, &mut journal).unwrap_err();
        assert!(matches!(err, BookError::ArithmeticViolation { price: 4, .. }));
        assert_eq!(ladder.step(4).amount, u128::MAX);
    }

    #[test]
    fn test_drain_partial() {
        let mut ladder = ladder_with(Side::Sell, &[(1, 100), (2, 100)]);
        let mut journal = Journal::new();

        assert_eq!(ladder.drain(1, 40, &mut journal), 40);
        assert_eq!(ladder.step(1), PriceStep::new(60, 0, 2));
        assert_eq!(ladder.len(), 2);
    }

    #[test]
    fn test_drain_caps_at_step_amount() {
        let mut ladder = ladder_with(Side::Sell, &[(1, 100)]);
        let mut journal = Journal::new();

        assert_eq!(ladder.drain(1, 500, &mut journal), 100);
        assert!(ladder.is_empty());
        assert_eq!(ladder.drain(1, 500, &mut journal), 0);
    }

    #[test]
    fn test_drain_unlinks_middle() {
        let mut ladder = ladder_with(Side::Buy, &[(1, 10), (2, 10), (3, 10)]);
        let mut journal = Journal::new();

        ladder.drain(2, 10, &mut journal);

        assert!(ladder.get(2).is_none());
        assert_eq!(ladder.step(1), PriceStep::new(10, 0, 3));
        assert_eq!(ladder.step(3), PriceStep::new(10, 1, 0));
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_drain_unlinks_ends() {
        let mut ladder = ladder_with(Side::Sell, &[(1, 10), (2, 10), (3, 10)]);
        let mut journal = Journal::new();

        ladder.drain(1, 10, &mut journal);
        assert_eq!(ladder.best_price(), Some(2));
        assert_eq!(ladder.step(2).lower_price, 0);

        ladder.drain(3, 10, &mut journal);
        assert_eq!(ladder.highest(), Some(2));
        assert_eq!(ladder.step(2), PriceStep::new(10, 0, 0));

        ladder.drain(2, 10, &mut journal);
        assert!(ladder.is_empty());
        assert!(ladder.best_price().is_none());
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_reinsert_after_unlink() {
        let mut ladder = ladder_with(Side::Buy, &[(1, 10), (2, 10), (3, 10)]);
        let mut journal = Journal::new();

        ladder.drain(2, 10, &mut journal);
        ladder.insert_or_grow(2, 7, &mut journal).unwrap();

        assert_eq!(ladder.step(2), PriceStep::new(7, 1, 3));
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_undo_restores_ladder() {
        let mut ladder = ladder_with(Side::Buy, &[(1, 10), (3, 10), (5, 10)]);
        let before = ladder.levels();
        let before_steps: Vec<PriceStep> = [1, 3, 5].iter().map(|&p| ladder.step(p)).collect();

        let mut journal = Journal::new();
        ladder.insert_or_grow(2, 4, &mut journal).unwrap();
        ladder.insert_or_grow(9, 4, &mut journal).unwrap();
        ladder.drain(3, 10, &mut journal);
        ladder.drain(1, 3, &mut journal);
        ladder.insert_or_grow(5, 1, &mut journal).unwrap();

        rollback(&mut ladder, journal);

        assert_eq!(ladder.levels(), before);
        let after_steps: Vec<PriceStep> = [1, 3, 5].iter().map(|&p| ladder.step(p)).collect();
        assert_eq!(after_steps, before_steps);
        assert!(ladder.get(2).is_none());
        assert!(ladder.get(9).is_none());
        ladder.check_invariants().unwrap();
    }

    #[test]
    fn test_total_amount() {
        let ladder = ladder_with(Side::Sell, &[(1, 10), (2, 15)]);
        assert_eq!(ladder.total_amount(), Some(25));
    }

    #[test]
    fn test_check_detects_corruption() {
        let mut ladder = ladder_with(Side::Buy, &[(1, 10), (2, 10)]);
        ladder.steps.get_mut(&2).unwrap().lower_price = 7;

        let err = ladder.check_invariants().unwrap_err();
        assert!(matches!(err, InvariantViolation::Ladder { price: 2, .. }));
    }
}
