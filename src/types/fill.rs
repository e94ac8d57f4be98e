//! Fill type representing one resting order consumed by an incoming order.
//!
//! ## SSZ Serialization
//!
//! Fills derive SSZ like the other book records, giving them a fixed
//! 49-byte encoding for callers that persist or ship them.

use ssz_rs::prelude::*;

use crate::types::{AccountId, Price, Side};

/// A fill is a single match between a resting (maker) order and the
/// incoming (taker) order.
///
/// ## Terminology
///
/// - **Maker**: the resting order's owner, identified by `maker` and the
///   1-based `maker_index` inside its (side, price) bucket
/// - **Taker**: the caller placing the incoming order
///
/// ## Settlement
///
/// A fill of `amount` moves `amount` of the taker's locked currency to the
/// maker and `amount` of the maker's locked currency to the taker. The
/// price decides priority, not the settled amount.
///
/// ## Example
///
/// ```
/// use step_book::types::{Fill, Side};
///
/// let fill = Fill::new(
///     Side::Sell, // maker side
///     3,          // price
///     1,          // maker index in bucket
///     42,         // maker
///     7,          // taker
///     500,        // amount
/// );
/// assert_eq!(fill.maker_side(), Side::Sell);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct Fill {
    /// Side of the resting order as u8 (0=Buy, 1=Sell)
    pub maker_side_raw: u8,

    /// Price of the step the resting order sat in
    pub price: u64,

    /// 1-based index of the resting order within its bucket
    pub maker_index: u64,

    /// Owner of the resting order
    pub maker: u64,

    /// Caller that placed the incoming order
    pub taker: u64,

    /// Matched amount in base units
    pub amount: u128,
}

impl Fill {
    /// Create a new fill record
    pub fn new(
        maker_side: Side,
        price: Price,
        maker_index: u64,
        maker: AccountId,
        taker: AccountId,
        amount: u128,
    ) -> Self {
        Self {
            maker_side_raw: maker_side.to_u8(),
            price,
            maker_index,
            maker,
            taker,
            amount,
        }
    }

    /// Side of the consumed resting order
    pub fn maker_side(&self) -> Side {
        Side::from_u8(self.maker_side_raw).unwrap_or(Side::Buy)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
