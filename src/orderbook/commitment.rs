//! Deterministic commitment over the book state.
//!
//! The root is SHA-256 over an SSZ stream:
//!
//! ```text
//! sequence
//! for side in [Buy, Sell]:
//!     step count, then (price, PriceStep) lowest -> highest by link
//!     bucket count, then per ascending price:
//!         price, counter, cursor, Order #1 .. Order #counter
//! ```
//!
//! Hash maps never leak iteration order into the root, so two books fed the
//! same calls commit to the same bytes.

use std::fmt;

use sha2::{Digest, Sha256};
use ssz_rs::SimpleSerialize;

use crate::error::{BookError, Result};
use crate::orderbook::{OrderLedger, PriceLadder};

/// 32-byte SHA-256 commitment to a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateRoot(pub [u8; 32]);

impl StateRoot {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for StateRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental SSZ-then-hash writer.
struct RootHasher {
    hasher: Sha256,
}

impl RootHasher {
    fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    fn absorb<T: SimpleSerialize>(&mut self, value: &T) -> Result<()> {
        let bytes = ssz_rs::serialize(value).map_err(|e| BookError::Encoding(format!("{e:?}")))?;
        self.hasher.update(&bytes);
        Ok(())
    }

    fn finish(self) -> StateRoot {
        let digest = self.hasher.finalize();
        let mut root = [0u8; 32];
        root.copy_from_slice(&digest);
        StateRoot(root)
    }
}

/// Hash `sequence` and each (ladder, ledger) pair in the order given.
pub(crate) fn compute(sequence: u64, sides: [(&PriceLadder, &OrderLedger); 2]) -> Result<StateRoot> {
    let mut root = RootHasher::new();
    root.absorb(&sequence)?;

    for (ladder, ledger) in sides {
        root.absorb(&(ladder.len() as u64))?;
        for (price, step) in ladder.iter() {
            root.absorb(&price)?;
            root.absorb(step)?;
        }

        let prices = ledger.prices();
        root.absorb(&(prices.len() as u64))?;
        for price in prices {
            let Some(bucket) = ledger.bucket(price) else {
                continue;
            };
            root.absorb(&price)?;
            root.absorb(&bucket.counter())?;
            root.absorb(&(bucket.cursor() as u64))?;
            for order in ledger.orders_at(price) {
                root.absorb(order)?;
            }
        }
    }

    Ok(root.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::Journal;
    use crate::types::{Order, Side};

    fn side(side: Side, orders: &[(u64, u64, u128)]) -> (PriceLadder, OrderLedger) {
        let mut ladder = PriceLadder::new(side);
        let mut ledger = OrderLedger::new(side);
        let mut journal = Journal::new();
        for &(price, maker, amount) in orders {
            ladder.insert_or_grow(price, amount, &mut journal).unwrap();
            ledger.append(price, Order::new(maker, amount), &mut journal);
        }
        (ladder, ledger)
    }

    #[test]
    fn test_root_independent_of_insertion_path() {
        let (bids_a, bid_orders_a) = side(Side::Buy, &[(1, 1, 10), (3, 2, 10), (2, 3, 10)]);
        let (bids_b, bid_orders_b) = side(Side::Buy, &[(3, 2, 10), (1, 1, 10), (2, 3, 10)]);
        let (asks, ask_orders) = side(Side::Sell, &[]);

        let a = compute(0, [(&bids_a, &bid_orders_a), (&asks, &ask_orders)]).unwrap();
        let b = compute(0, [(&bids_b, &bid_orders_b), (&asks, &ask_orders)]).unwrap();

        // Same ladder shape and same bucket contents
        assert_eq!(a, b);
    }

    #[test]
    fn test_root_covers_sequence_and_sides() {
        let (bids, bid_orders) = side(Side::Buy, &[(2, 1, 10)]);
        let (asks, ask_orders) = side(Side::Sell, &[]);

        let base = compute(0, [(&bids, &bid_orders), (&asks, &ask_orders)]).unwrap();
        let bumped = compute(1, [(&bids, &bid_orders), (&asks, &ask_orders)]).unwrap();
        let swapped = compute(0, [(&asks, &ask_orders), (&bids, &bid_orders)]).unwrap();

        assert_ne!(base, bumped);
        assert_ne!(base, swapped);
    }

    #[test]
    fn test_hex_rendering() {
        let root = StateRoot([0xab; 32]);
        assert_eq!(root.to_hex().len(), 64);
        assert!(root.to_hex().starts_with("abab"));
        assert_eq!(root.to_string(), root.to_hex());
    }
}
