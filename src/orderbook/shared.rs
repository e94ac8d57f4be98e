//! Thread-safe handle around an [`OrderBook`].
//!
//! Placements take the write lock for their whole transaction, so a reader
//! never observes a half-applied placement. Queries share the read lock.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{InvariantViolation, Result};
use crate::orderbook::{OrderBook, PriceStep, StateRoot};
use crate::token::TokenLedger;
use crate::types::{AccountId, Order, Placement, Price, Side};

/// Cloneable handle; all clones address the same book.
#[derive(Debug)]
pub struct SharedOrderBook<T: TokenLedger> {
    inner: Arc<RwLock<OrderBook<T>>>,
}

impl<T: TokenLedger> Clone for SharedOrderBook<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TokenLedger> SharedOrderBook<T> {
    pub fn new(book: OrderBook<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(book)),
        }
    }

    pub fn place_buy_order(&self, caller: AccountId, price: Price, amount: u128) -> Result<Placement> {
        self.inner.write().place_buy_order(caller, price, amount)
    }

    pub fn place_sell_order(&self, caller: AccountId, price: Price, amount: u128) -> Result<Placement> {
        self.inner.write().place_sell_order(caller, price, amount)
    }

    pub fn place_order(&self, caller: AccountId, side: Side, price: Price, amount: u128) -> Result<Placement> {
        self.inner.write().place_order(caller, side, price, amount)
    }

    pub fn steps(&self, side: Side, price: Price) -> PriceStep {
        self.inner.read().steps(side, price)
    }

    pub fn orders_in_step_counter(&self, side: Side, price: Price) -> u64 {
        self.inner.read().orders_in_step_counter(side, price)
    }

    /// Copy of order `index` at `price`; the lock is released on return.
    pub fn orders_in_step(&self, side: Side, price: Price, index: u64) -> Option<Order> {
        self.inner.read().orders_in_step(side, price, index).cloned()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.inner.read().best_bid()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.inner.read().best_ask()
    }

    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        self.inner.read().check_invariants()
    }

    pub fn state_root(&self) -> Result<StateRoot> {
        self.inner.read().state_root()
    }

    /// Run `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&OrderBook<T>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` under the write lock, e.g. to fund accounts.
    pub fn write<R>(&self, f: impl FnOnce(&mut OrderBook<T>) -> R) -> R {
        f(&mut self.inner.write())
    }
}
