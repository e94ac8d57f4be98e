//! Matching engine module.
//!
//! ## Matching Rules
//!
//! - **Buy orders** match against asks (lowest price first)
//! - **Sell orders** match against bids (highest price first)
//! - **FIFO** within a price, through each bucket's unfilled cursor
//! - **Partial fills** are supported on both sides
//! - **Unfilled amount** is returned to the caller to rest on the book
//!
//! ## Example
//!
//! ```
//! use step_book::engine::MatchingEngine;
//! use step_book::orderbook::{Journal, OrderLedger, PriceLadder};
//! use step_book::types::{Order, Side};
//!
//! let mut asks = PriceLadder::new(Side::Sell);
//! let mut ask_orders = OrderLedger::new(Side::Sell);
//! let mut journal = Journal::new();
//!
//! asks.insert_or_grow(10, 500, &mut journal).unwrap();
//! ask_orders.append(10, Order::new(1, 500), &mut journal);
//!
//! let result = MatchingEngine::new()
//!     .match_order(2, Side::Buy, 10, 800, &mut asks, &mut ask_orders, &mut journal)
//!     .unwrap();
//!
//! assert_eq!(result.filled, 500);
//! assert_eq!(result.remainder, 300);
//! assert!(asks.is_empty());
//! ```

pub mod matcher;

pub use matcher::{MatchResult, MatchingEngine};
