//! Price step: the aggregate record for one occupied price on one side.
//!
//! ## Design
//!
//! A `PriceStep` stores the total unfilled volume at its price plus the
//! prices of its neighbors in the ladder. Neighbors are referenced by price
//! (the key in the ladder's sparse map), never by pointer.
//!
//! ## Linked List
//!
//! Steps on one side form a strictly ascending doubly-linked chain:
//! - `lower_price`: next occupied price below, or `0` at the low end
//! - `higher_price`: next occupied price above, or `0` at the high end
//!
//! ```text
//! 0 <- [p1] <-> [p2] <-> [p3] -> 0      (p1 < p2 < p3)
//! ```

use ssz_rs::prelude::*;

use crate::types::{Price, NULL_PRICE};

/// Step stored in a price ladder.
///
/// An unoccupied price reads as the all-zero default.
///
/// ## Example
///
/// ```
/// use step_book::orderbook::PriceStep;
///
/// let step = PriceStep::new(1_500, 1, 3);
/// assert!(step.has_lower());
/// assert!(step.has_higher());
/// assert!(!PriceStep::default().is_occupied());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, SimpleSerialize)]
pub struct PriceStep {
    /// Total unfilled volume resting at this price
    pub amount: u128,

    /// Next occupied price below, `0` if none
    pub lower_price: u64,

    /// Next occupied price above, `0` if none
    pub higher_price: u64,
}

impl PriceStep {
    #[inline]
    pub fn new(amount: u128, lower_price: Price, higher_price: Price) -> Self {
        Self {
            amount,
            lower_price,
            higher_price,
        }
    }

    #[inline]
    pub fn has_lower(&self) -> bool {
        self.lower_price != NULL_PRICE
    }

    #[inline]
    pub fn has_higher(&self) -> bool {
        self.higher_price != NULL_PRICE
    }

    /// A step is occupied while it carries volume
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.amount > 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_default_is_unlinked() {
        let step = PriceStep::default();

        assert_eq!(step.amount, 0);
        assert!(!step.has_lower());
        assert!(!step.has_higher());
        assert!(!step.is_occupied());
    }

    #[test]
    fn test_step_links() {
        let head = PriceStep::new(10, NULL_PRICE, 5);
        assert!(!head.has_lower());
        assert!(head.has_higher());

        let tail = PriceStep::new(10, 5, NULL_PRICE);
        assert!(tail.has_lower());
        assert!(!tail.has_higher());
    }

    #[test]
    fn test_step_ssz_size() {
        let step = PriceStep::new(1, 2, 3);
        let bytes = ssz_rs::serialize(&step).expect("Failed to serialize");

        // 16 (amount) + 8 + 8
        assert_eq!(bytes.len(), 32);
    }
}
