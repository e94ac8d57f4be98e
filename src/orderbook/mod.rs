//! Order book module for the step book.
//!
//! ## Architecture
//!
//! Each side of the book is a pair:
//!
//! - [`PriceLadder`]: sparse `HashMap<Price, PriceStep>` whose steps link to
//!   their lower and higher occupied neighbors, `0` meaning none
//! - [`OrderLedger`]: append-only orders per price, stored in a slab, each
//!   bucket with a cursor at its oldest unfilled order
//!
//! [`OrderBook`] owns both sides and the two token handles, and runs each
//! placement as a transaction over a [`Journal`]. [`SharedOrderBook`] puts
//! it behind an `Arc<RwLock<_>>`.
//!
//! ## Complexity
//!
//! | Operation | Cost |
//! |-----------|------|
//! | Step lookup | O(1) |
//! | Insert new price | O(distance from nearer end) |
//! | Best bid/ask | O(1) |
//! | Append order | O(1) |
//! | Match | O(fills) |
//!
//! ## Example
//!
//! ```
//! use step_book::orderbook::{Journal, PriceLadder};
//! use step_book::types::Side;
//!
//! let mut bids = PriceLadder::new(Side::Buy);
//! let mut journal = Journal::new();
//!
//! bids.insert_or_grow(1, 1_000, &mut journal).unwrap();
//! bids.insert_or_grow(3, 1_000, &mut journal).unwrap();
//! bids.insert_or_grow(2, 1_000, &mut journal).unwrap();
//!
//! assert_eq!(bids.step(2).lower_price, 1);
//! assert_eq!(bids.step(2).higher_price, 3);
//! ```

pub mod step;
pub mod journal;
pub mod ladder;
pub mod ledger;
pub mod commitment;
pub mod book;
pub mod shared;

pub use step::PriceStep;
pub use journal::{Journal, Undo};
pub use ladder::{LadderIter, PriceLadder};
pub use ledger::{Bucket, OrderLedger};
pub use commitment::StateRoot;
pub use book::OrderBook;
pub use shared::SharedOrderBook;
