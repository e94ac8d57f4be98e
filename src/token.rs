//! Fungible token collaborator.
//!
//! The book never owns balances. It moves funds through a [`TokenLedger`],
//! one for the traded asset and one for the quote currency, and treats every
//! call as fallible.
//!
//! [`Erc20Ledger`] is the in-memory implementation used by the demo binary
//! and the tests: balances by account, allowances by (owner, spender), and
//! the usual ERC-20 failure modes.

use std::collections::HashMap;

use crate::error::TokenError;
use crate::types::AccountId;

/// Synchronous, fallible token transfer capability.
pub trait TokenLedger {
    /// Display name used in errors and logs
    fn symbol(&self) -> &str;

    /// Balance held by `owner`
    fn balance_of(&self, owner: AccountId) -> u128;

    /// Move `amount` from `sender` to `to`, spending the sender's own balance.
    fn transfer(&mut self, sender: AccountId, to: AccountId, amount: u128) -> Result<(), TokenError>;

    /// Move `amount` from `owner` to `to` on behalf of `spender`, consuming
    /// the allowance `owner` granted `spender`.
    ///
    /// The book only ever debits a trader through this call, for escrow and
    /// for reversing a payout during rollback.
    fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), TokenError>;
}

/// In-memory ERC-20 style ledger.
///
/// An allowance of `u128::MAX` is treated as unlimited and never decremented.
#[derive(Debug, Clone, Default)]
pub struct Erc20Ledger {
    symbol: String,
    decimals: u32,
    total_supply: u128,
    balances: HashMap<AccountId, u128>,
    allowances: HashMap<(AccountId, AccountId), u128>,
}

impl Erc20Ledger {
    pub fn new(symbol: impl Into<String>, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            ..Self::default()
        }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Create `amount` new units in `to`'s balance
    pub fn mint(&mut self, to: AccountId, amount: u128) -> Result<(), TokenError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| self.overflow(to))?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| self.overflow(to))?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    /// Set the allowance `owner` grants `spender`
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: u128) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> u128 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    fn overflow(&self, account: AccountId) -> TokenError {
        TokenError::Overflow {
            token: self.symbol.clone(),
            account,
        }
    }

    fn move_balance(&mut self, from: AccountId, to: AccountId, amount: u128) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                token: self.symbol.clone(),
                account: from,
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| self.overflow(to))?;
        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        Ok(())
    }
}

impl TokenLedger for Erc20Ledger {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, owner: AccountId) -> u128 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, sender: AccountId, to: AccountId, amount: u128) -> Result<(), TokenError> {
        self.move_balance(sender, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                token: self.symbol.clone(),
                owner,
                spender,
                required: amount,
                available: allowed,
            });
        }

        self.move_balance(owner, to, amount)?;
        if allowed != u128::MAX {
            self.allowances.insert((owner, spender), allowed - amount);
        }
        Ok(())
    }
}
