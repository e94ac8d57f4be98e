//! Core data types for the step book
//!
//! Orders, fills and receipts implement SSZ serialization for deterministic
//! encoding. Amounts are raw token base units.
//!
//! ## Types
//!
//! - [`Order`]: A resting order in a (side, price) bucket
//! - [`Side`]: Buy or Sell
//! - [`Fill`]: One resting order consumed by an incoming order
//! - [`PlacementReceipt`]: Summary of one committed placement
//! - [`units`]: Decimal string ↔ base unit conversion

mod order;
mod fill;
mod receipt;
pub mod units;

pub use order::{AccountId, Currency, Order, Price, Side, NULL_PRICE};
pub use fill::Fill;
pub use receipt::{Placement, PlacementReceipt};
