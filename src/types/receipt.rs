//! Placement receipt returned by every successful order placement.
//!
//! The receipt summarizes what one call did: how much of the incoming amount
//! crossed, how much came to rest, and where the resting part was recorded.

use ssz_rs::prelude::*;

use crate::types::{Fill, Price, Side};

/// Summary of a committed `place_order` call.
///
/// `filled + rested == amount` always holds for a committed placement.
///
/// ## Example
///
/// ```
/// use step_book::types::{PlacementReceipt, Side};
///
/// let receipt = PlacementReceipt::new(1, Side::Buy, 2, 1_500, 1_000, 500, 3);
/// assert_eq!(receipt.side(), Side::Buy);
/// assert_eq!(receipt.resting_index(), Some(3));
/// assert!(!receipt.is_fully_filled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct PlacementReceipt {
    /// Monotonic sequence number of committed placements
    pub sequence: u64,

    /// Side of the incoming order as u8 (0=Buy, 1=Sell)
    pub side_raw: u8,

    /// Limit price of the incoming order
    pub price: u64,

    /// Amount escrowed from the caller
    pub amount: u128,

    /// Portion matched against resting orders
    pub filled: u128,

    /// Portion left resting in the own-side ladder
    pub rested: u128,

    /// 1-based index of the resting order in its bucket, 0 when nothing rested
    pub resting_index_raw: u64,
}

impl PlacementReceipt {
    /// Create a new placement receipt
    pub fn new(
        sequence: u64,
        side: Side,
        price: Price,
        amount: u128,
        filled: u128,
        rested: u128,
        resting_index: u64,
    ) -> Self {
        Self {
            sequence,
            side_raw: side.to_u8(),
            price,
            amount,
            filled,
            rested,
            resting_index_raw: resting_index,
        }
    }

    /// Side of the incoming order
    pub fn side(&self) -> Side {
        Side::from_u8(self.side_raw).unwrap_or(Side::Buy)
    }

    /// Index of the resting order, if any part of the order came to rest
    pub fn resting_index(&self) -> Option<u64> {
        (self.resting_index_raw != 0).then_some(self.resting_index_raw)
    }

    /// Whether the incoming order crossed completely
    pub fn is_fully_filled(&self) -> bool {
        self.rested == 0
    }
}

/// Receipt plus the per-maker fills produced by the call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Placement {
    pub receipt: PlacementReceipt,
    pub fills: Vec<Fill>,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_new() {
        let receipt = PlacementReceipt::new(9, Side::Sell, 4, 1_000, 1_000, 0, 0);

        assert_eq!(receipt.sequence, 9);
        assert_eq!(receipt.side(), Side::Sell);
        assert_eq!(receipt.price, 4);
        assert_eq!(receipt.filled, 1_000);
        assert!(receipt.is_fully_filled());
        assert_eq!(receipt.resting_index(), None);
    }

    #[test]
    fn test_receipt_ssz_size() {
        let receipt = PlacementReceipt::default();
        let bytes = ssz_rs::serialize(&receipt).expect("Failed to serialize");

        // 8 + 1 + 8 + 16 + 16 + 16 + 8
        assert_eq!(bytes.len(), 73, "PlacementReceipt should serialize to 73 bytes");
    }
}
