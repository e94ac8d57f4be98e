//! # Step Book
//!
//! Single-pair limit order book with linked price ladders and escrowed
//! settlement.
//!
//! ## Architecture
//!
//! - **Types**: Core data structures (Order, Fill, PlacementReceipt)
//! - **OrderBook**: Price ladders, append-only order ledgers, the transactional
//!   book and its shared handle
//! - **Engine**: Price-time priority matching against one side
//! - **Token**: Fallible token collaborator and an in-memory ERC-20 ledger
//! - **Config**: Token descriptors, custody account and seeded accounts
//!
//! ## Design Principles
//!
//! 1. **All or nothing**: A placement either commits every ladder, ledger and
//!    balance change or none of them
//! 2. **No Floating Point**: Amounts are integer base units; decimal strings
//!    go through `rust_decimal`
//! 3. **Stable indices**: Orders are never deleted; `(side, price, index)`
//!    names the same order forever
//! 4. **Determinism**: Identical call sequences produce identical state roots
//!
//! ## Example
//!
//! ```
//! use step_book::{Erc20Ledger, OrderBook, Side};
//!
//! const BOOK: u64 = 0;
//! let (alice, bob) = (1, 2);
//!
//! let mut asset = Erc20Ledger::new("ASSET", 18);
//! let mut quote = Erc20Ledger::new("QUOTE", 18);
//! asset.mint(bob, 500).unwrap();
//! quote.mint(alice, 1_000).unwrap();
//! asset.approve(bob, BOOK, u128::MAX);
//! quote.approve(alice, BOOK, u128::MAX);
//!
//! let mut book = OrderBook::new(asset, quote, BOOK);
//! book.place_buy_order(alice, 2, 1_000).unwrap();
//! let placement = book.place_sell_order(bob, 2, 500).unwrap();
//!
//! assert_eq!(placement.receipt.filled, 500);
//! assert_eq!(book.steps(Side::Buy, 2).amount, 500);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, Fill, PlacementReceipt
pub mod types;

/// Order book: ladders, ledgers, journal and the transactional book
pub mod orderbook;

/// Matching engine: price-time priority against one side
pub mod engine;

/// Error taxonomy
pub mod error;

/// Token collaborator
pub mod token;

/// Configuration loading
pub mod config;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use types::{AccountId, Currency, Fill, Order, Placement, PlacementReceipt, Price, Side};
pub use orderbook::{OrderBook, PriceStep, SharedOrderBook, StateRoot};
pub use engine::{MatchResult, MatchingEngine};
pub use error::{BookError, InvariantViolation, TokenError};
pub use token::{Erc20Ledger, TokenLedger};
pub use config::{BookConfig, SetupError};
