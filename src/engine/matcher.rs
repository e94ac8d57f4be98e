//! Price-time priority matching against one side of the book.
//!
//! The matcher consumes the opposite ladder from its best price inward:
//!
//! ```text
//! incoming BUY @ 5, amount 1_800
//!
//! asks:  [3: 1_000] -> [4: 500] -> [6: 900]
//!          #1 1_000     #1 500       (6 > 5, stop)
//!
//! fills: 1_000 @ 3, 500 @ 4       remainder: 300
//! ```
//!
//! Within a price, orders are taken oldest first via the bucket cursor.

use tracing::debug;

use crate::error::{BookError, Result};
use crate::orderbook::{Journal, OrderLedger, PriceLadder};
use crate::types::{AccountId, Fill, Price, Side};

/// Outcome of matching one incoming order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Amount matched against resting orders
    pub filled: u128,

    /// Amount left over for the own-side ladder
    pub remainder: u128,

    /// One entry per resting order touched, in match order
    pub fills: Vec<Fill>,
}

impl MatchResult {
    #[inline]
    pub fn fully_filled(&self) -> bool {
        self.remainder == 0
    }
}

/// Stateless matcher; all state lives in the ladders and ledgers it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingEngine;

impl MatchingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Match an incoming `side` order with limit `limit` and size `amount`
    /// against the opposite ladder and ledger.
    ///
    /// Every write is journaled; on error the caller must roll the journal
    /// back. Failing to cross is not an error, it just leaves a remainder.
    #[allow(clippy::too_many_arguments)]
    pub fn match_order(
        &self,
        taker: AccountId,
        side: Side,
        limit: Price,
        amount: u128,
        opposite: &mut PriceLadder,
        opposite_orders: &mut OrderLedger,
        journal: &mut Journal,
    ) -> Result<MatchResult> {
        let maker_side = side.opposite();
        let mut result = MatchResult {
            remainder: amount,
            ..MatchResult::default()
        };

        while result.remainder > 0 {
            let Some(price) = opposite.best_price() else {
                break;
            };
            if !side.crosses(limit, price) {
                break;
            }

            let (index, maker, available) = match opposite_orders.next_unfilled(price) {
                Some((index, order)) => (index, order.maker, order.remaining()),
                None => {
                    return Err(BookError::arithmetic(
                        maker_side,
                        price,
                        "occupied step has no unfilled order",
                    ))
                }
            };

            let fill = result.remainder.min(available);
            opposite_orders.record_match(price, index, fill, journal)?;

            let drained = opposite.drain(price, fill, journal);
            if drained != fill {
                return Err(BookError::arithmetic(
                    maker_side,
                    price,
                    "step volume below resting orders",
                ));
            }

            result.remainder = result
                .remainder
                .checked_sub(fill)
                .ok_or_else(|| BookError::arithmetic(side, limit, "remainder underflow"))?;
            result.filled = result
                .filled
                .checked_add(fill)
                .ok_or_else(|| BookError::arithmetic(side, limit, "filled overflow"))?;

            debug!(?maker_side, price, index, maker, taker, fill = %fill, "matched resting order");
            result
                .fills
                .push(Fill::new(maker_side, price, index, maker, taker, fill));
        }

        Ok(result)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
