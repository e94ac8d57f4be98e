//! Error taxonomy for the book and its token collaborator.
//!
//! Every error aborts the enclosing placement with no partial effects.
//! Nothing is retried internally.

use thiserror::Error;

use crate::types::{AccountId, Price, Side};

/// Errors reported by a [`TokenLedger`](crate::token::TokenLedger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("{token}: transfer amount exceeds balance (account {account}, required {required}, available {available})")]
    InsufficientBalance {
        token: String,
        account: AccountId,
        required: u128,
        available: u128,
    },

    #[error("{token}: insufficient allowance (owner {owner}, spender {spender}, required {required}, available {available})")]
    InsufficientAllowance {
        token: String,
        owner: AccountId,
        spender: AccountId,
        required: u128,
        available: u128,
    },

    #[error("{token}: balance overflow for account {account}")]
    Overflow { token: String, account: AccountId },

    #[error("{token}: transfer rejected: {reason}")]
    Rejected { token: String, reason: String },
}

/// Errors returned by order placement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Can not place order with price equal 0")]
    ZeroPrice,

    /// Escrow of the caller's funds failed; the token error is surfaced as is.
    #[error(transparent)]
    InsufficientFunds(TokenError),

    /// A payout from custody failed after matching; the call was rolled back.
    #[error("settlement transfer failed: {0}")]
    Settlement(TokenError),

    #[error("arithmetic violation on {side:?} side at price {price}: {context}")]
    ArithmeticViolation {
        side: Side,
        price: Price,
        context: &'static str,
    },

    /// Rolling back a failed call could not restore token balances.
    #[error("settlement diverged during rollback: {0}")]
    SettlementDiverged(TokenError),

    #[error("state encoding failed: {0}")]
    Encoding(String),
}

impl BookError {
    pub(crate) fn arithmetic(side: Side, price: Price, context: &'static str) -> Self {
        BookError::ArithmeticViolation {
            side,
            price,
            context,
        }
    }
}

pub type Result<T> = std::result::Result<T, BookError>;

/// Structural corruption found by `check_invariants`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("{side:?} ladder at price {price}: {detail}")]
    Ladder {
        side: Side,
        price: Price,
        detail: &'static str,
    },

    #[error("{side:?} step at price {price} holds {step} but its orders rest {resting}")]
    StepAmount {
        side: Side,
        price: Price,
        step: u128,
        resting: u128,
    },

    #[error("{side:?} bucket at price {price}: {detail}")]
    Bucket {
        side: Side,
        price: Price,
        detail: &'static str,
    },

    #[error("custody holds {held} {token} but {locked} is locked")]
    Custody {
        token: String,
        held: u128,
        locked: u128,
    },
}
