//! Order types for the step book.
//!
//! ## SSZ Serialization
//!
//! `Order` derives `SimpleSerialize` from ssz_rs so the ledgers can be
//! folded into a deterministic state root:
//! - Basic types (u64, u128): direct little-endian encoding
//! - Fixed-size composites: concatenated little-endian fields
//!
//! ## Units
//!
//! Amounts are raw token base units (`u128`, see [`crate::types::units`]).
//! Prices are plain positive integers; `0` is reserved as the null neighbor.

use ssz_rs::prelude::*;

/// Integer price key. `0` is never a valid trading price.
pub type Price = u64;

/// Identity of a trader or of the book's custody account.
pub type AccountId = u64;

/// Sentinel used for "no neighbor" in price ladders.
pub const NULL_PRICE: Price = 0;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy or Sell
///
/// Represented as u8 for SSZ compatibility:
/// - Buy = 0
/// - Sell = 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Buy order (bid) - locks quote currency
    #[default]
    Buy,
    /// Sell order (ask) - locks the traded asset
    Sell,
}

impl Side {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }

    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Currency this side escrows when placing an order
    #[inline]
    pub fn locked_currency(self) -> Currency {
        match self {
            Side::Buy => Currency::Quote,
            Side::Sell => Currency::Asset,
        }
    }

    /// Whether a resting price on the opposite side crosses `limit`.
    ///
    /// An incoming buy crosses asks priced at or below its limit; an
    /// incoming sell crosses bids priced at or above it.
    #[inline]
    pub fn crosses(self, limit: Price, resting: Price) -> bool {
        match self {
            Side::Buy => resting <= limit,
            Side::Sell => resting >= limit,
        }
    }
}

/// The two currencies of the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    /// The traded asset, locked by sells
    Asset,
    /// The quote/settlement currency, locked by buys
    Quote,
}

// ============================================================================
// Order struct
// ============================================================================

/// A resting order recorded in a (side, price) bucket.
///
/// Orders are never deleted. The only mutation after creation is
/// `amount_matched` growing towards `amount` as the order is consumed.
///
/// ## Example
///
/// ```
/// use step_book::types::Order;
///
/// let mut order = Order::new(7, 1_000);
/// assert_eq!(order.remaining(), 1_000);
///
/// order.record_match(400).unwrap();
/// assert_eq!(order.remaining(), 600);
/// assert!(!order.is_filled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct Order {
    /// Account that placed the order
    pub maker: u64,

    /// Amount locked when the order came to rest
    pub amount: u128,

    /// Portion of `amount` already consumed by incoming orders
    pub amount_matched: u128,
}

impl Order {
    /// Create a fresh, unmatched order
    pub fn new(maker: AccountId, amount: u128) -> Self {
        Self {
            maker,
            amount,
            amount_matched: 0,
        }
    }

    /// Unmatched portion of the order
    #[inline]
    pub fn remaining(&self) -> u128 {
        self.amount - self.amount_matched
    }

    /// Check if the order is fully matched
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.amount_matched == self.amount
    }

    /// Record `fill` more units as matched.
    ///
    /// Returns `None` and leaves the order untouched when the fill would
    /// push `amount_matched` past `amount`.
    pub fn record_match(&mut self, fill: u128) -> Option<u128> {
        let matched = self.amount_matched.checked_add(fill)?;
        if matched > self.amount {
            return None;
        }
        self.amount_matched = matched;
        Some(matched)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
