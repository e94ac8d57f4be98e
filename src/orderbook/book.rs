//! The order book: two ladders, two ledgers, two tokens.
//!
//! ## Placement
//!
//! Every placement runs as one transaction:
//!
//! 1. Reject `price == 0`.
//! 2. Escrow the side's locked currency from the caller into custody.
//! 3. Match against the opposite side, then rest the remainder on the own side.
//!    Each ladder/ledger write lands in a [`Journal`].
//! 4. Settle: every maker receives its fill in the taker's locked currency and
//!    the taker receives the total fill in the makers' locked currency.
//! 5. Commit by bumping the sequence.
//!
//! Any failure after step 2 replays the journal, reverses the payouts already
//! made and refunds the escrow, so the book and both tokens end as they began.
//!
//! ## Example
//!
//! ```
//! use step_book::orderbook::OrderBook;
//! use step_book::token::Erc20Ledger;
//!
//! const BOOK: u64 = 1;
//! const ALICE: u64 = 2;
//!
//! let asset = Erc20Ledger::new("ASSET", 18);
//! let mut quote = Erc20Ledger::new("QUOTE", 18);
//! quote.mint(ALICE, 1_000).unwrap();
//! quote.approve(ALICE, BOOK, u128::MAX);
//!
//! let mut book = OrderBook::new(asset, quote, BOOK);
//! let placement = book.place_buy_order(ALICE, 1, 1_000).unwrap();
//!
//! assert_eq!(placement.receipt.rested, 1_000);
//! assert_eq!(book.buy_orders_in_step_counter(1), 1);
//! assert_eq!(book.buy_steps(1).amount, 1_000);
//! ```

use tracing::{debug, error, info, warn};

use crate::engine::{MatchResult, MatchingEngine};
use crate::error::{BookError, InvariantViolation, Result, TokenError};
use crate::orderbook::commitment::{self, StateRoot};
use crate::orderbook::{Journal, OrderLedger, PriceLadder, PriceStep};
use crate::token::TokenLedger;
use crate::types::{
    AccountId, Currency, Order, Placement, PlacementReceipt, Price, Side, NULL_PRICE,
};

/// A completed custody payout, kept so it can be reversed.
#[derive(Debug, Clone, Copy)]
struct Payout {
    currency: Currency,
    to: AccountId,
    amount: u128,
}

/// Single-pair limit order book.
#[derive(Debug, Clone)]
pub struct OrderBook<T: TokenLedger> {
    asset: T,
    quote: T,
    custody: AccountId,

    bids: PriceLadder,
    asks: PriceLadder,
    bid_orders: OrderLedger,
    ask_orders: OrderLedger,

    engine: MatchingEngine,

    /// Committed placements so far
    sequence: u64,
}

impl<T: TokenLedger> OrderBook<T> {
    /// Build an empty book settling through `asset` and `quote`, holding
    /// escrow under the `custody` account.
    pub fn new(asset: T, quote: T, custody: AccountId) -> Self {
        Self::with_capacity(asset, quote, custody, 0)
    }

    /// Like [`OrderBook::new`], pre-allocating `capacity` orders per side.
    pub fn with_capacity(asset: T, quote: T, custody: AccountId, capacity: usize) -> Self {
        Self {
            asset,
            quote,
            custody,
            bids: PriceLadder::new(Side::Buy),
            asks: PriceLadder::new(Side::Sell),
            bid_orders: OrderLedger::with_capacity(Side::Buy, capacity),
            ask_orders: OrderLedger::with_capacity(Side::Sell, capacity),
            engine: MatchingEngine::new(),
            sequence: 0,
        }
    }

    // ========================================================================
    // Placement
    // ========================================================================

    pub fn place_buy_order(&mut self, caller: AccountId, price: Price, amount: u128) -> Result<Placement> {
        self.place_order(caller, Side::Buy, price, amount)
    }

    pub fn place_sell_order(&mut self, caller: AccountId, price: Price, amount: u128) -> Result<Placement> {
        self.place_order(caller, Side::Sell, price, amount)
    }

    /// Place a limit order of `amount` at `price` for `caller`.
    ///
    /// On error nothing has changed: not the ladders, not the ledgers, not
    /// any balance, not the sequence. The one exception is
    /// [`BookError::SettlementDiverged`], returned when a compensating
    /// transfer itself fails.
    ///
    /// Escrow and payout reversal both go through `transfer_from` with the
    /// custody account as spender. Besides the escrow allowance on its
    /// locked currency, an account must allow custody to pull back payouts
    /// it received in the other currency, or a rollback that reaches it
    /// ends in `SettlementDiverged`.
    pub fn place_order(
        &mut self,
        caller: AccountId,
        side: Side,
        price: Price,
        amount: u128,
    ) -> Result<Placement> {
        if price == NULL_PRICE {
            warn!(?side, caller, "rejected order with zero price");
            return Err(BookError::ZeroPrice);
        }

        let custody = self.custody;
        let escrow = side.locked_currency();
        if let Err(err) = self
            .token_mut(escrow)
            .transfer_from(custody, caller, custody, amount)
        {
            warn!(?side, caller, price, amount = %amount, error = %err, "escrow failed");
            return Err(BookError::InsufficientFunds(err));
        }

        let mut journal = Journal::new();
        let (result, resting_index) = match self.stage(caller, side, price, amount, &mut journal) {
            Ok(staged) => staged,
            Err(err) => return Err(self.abort(journal, caller, side, amount, &[], err)),
        };

        let mut payouts = Vec::with_capacity(result.fills.len() + 1);
        if let Err(err) = self.settle(caller, side, &result, &mut payouts) {
            let cause = BookError::Settlement(err);
            return Err(self.abort(journal, caller, side, amount, &payouts, cause));
        }

        self.sequence += 1;
        let receipt = PlacementReceipt::new(
            self.sequence,
            side,
            price,
            amount,
            result.filled,
            result.remainder,
            resting_index.unwrap_or(0),
        );
        info!(
            sequence = self.sequence,
            ?side,
            caller,
            price,
            amount = %amount,
            filled = %result.filled,
            rested = %result.remainder,
            fills = result.fills.len(),
            "order placed"
        );

        Ok(Placement {
            receipt,
            fills: result.fills,
        })
    }

    /// Match, then rest whatever is left. Touches book state only.
    fn stage(
        &mut self,
        caller: AccountId,
        side: Side,
        price: Price,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<(MatchResult, Option<u64>)> {
        let engine = self.engine;
        let (opposite, opposite_orders) = self.side_mut(side.opposite());
        let result = engine.match_order(caller, side, price, amount, opposite, opposite_orders, journal)?;

        if result.fully_filled() {
            return Ok((result, None));
        }

        let (ladder, ledger) = self.side_mut(side);
        ladder.insert_or_grow(price, result.remainder, journal)?;
        let index = ledger.append(price, Order::new(caller, result.remainder), journal);
        debug!(?side, price, index, caller, rested = %result.remainder, "order rested");

        Ok((result, Some(index)))
    }

    /// Pay out every fill from custody, recording each completed transfer.
    fn settle(
        &mut self,
        caller: AccountId,
        side: Side,
        result: &MatchResult,
        payouts: &mut Vec<Payout>,
    ) -> std::result::Result<(), TokenError> {
        let custody = self.custody;
        let taker_currency = side.locked_currency();
        let maker_currency = side.opposite().locked_currency();

        for fill in &result.fills {
            self.token_mut(taker_currency)
                .transfer(custody, fill.maker, fill.amount)?;
            payouts.push(Payout {
                currency: taker_currency,
                to: fill.maker,
                amount: fill.amount,
            });
        }

        if result.filled > 0 {
            self.token_mut(maker_currency)
                .transfer(custody, caller, result.filled)?;
            payouts.push(Payout {
                currency: maker_currency,
                to: caller,
                amount: result.filled,
            });
        }

        Ok(())
    }

    /// Undo a failed placement and hand back the error to report.
    fn abort(
        &mut self,
        journal: Journal,
        caller: AccountId,
        side: Side,
        escrowed: u128,
        payouts: &[Payout],
        cause: BookError,
    ) -> BookError {
        let undone = journal.len();
        self.rollback(journal);

        let custody = self.custody;
        for payout in payouts.iter().rev() {
            if let Err(err) = self
                .token_mut(payout.currency)
                .transfer_from(custody, payout.to, custody, payout.amount)
            {
                error!(
                    ?side,
                    caller,
                    to = payout.to,
                    amount = %payout.amount,
                    error = %err,
                    cause = %cause,
                    "failed to reverse payout"
                );
                return BookError::SettlementDiverged(err);
            }
        }

        if let Err(err) = self
            .token_mut(side.locked_currency())
            .transfer(custody, caller, escrowed)
        {
            error!(?side, caller, amount = %escrowed, error = %err, cause = %cause, "failed to refund escrow");
            return BookError::SettlementDiverged(err);
        }

        warn!(?side, caller, undone, reversed = payouts.len(), error = %cause, "placement rolled back");
        cause
    }

    /// Replay `journal` newest-first onto the ladders and ledgers.
    fn rollback(&mut self, journal: Journal) {
        for undo in journal.into_rollback() {
            let (ladder, ledger) = self.side_mut(undo.side());
            ladder.undo(&undo);
            ledger.undo(&undo);
        }
    }

    fn side_mut(&mut self, side: Side) -> (&mut PriceLadder, &mut OrderLedger) {
        match side {
            Side::Buy => (&mut self.bids, &mut self.bid_orders),
            Side::Sell => (&mut self.asks, &mut self.ask_orders),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Step at `price`; all zero when the price is unoccupied
    pub fn steps(&self, side: Side, price: Price) -> PriceStep {
        self.ladder(side).step(price)
    }

    /// Orders ever placed at `price`, including fully matched ones
    pub fn orders_in_step_counter(&self, side: Side, price: Price) -> u64 {
        self.orders(side).counter(price)
    }

    /// Order `index` (1-based) at `price`
    pub fn orders_in_step(&self, side: Side, price: Price, index: u64) -> Option<&Order> {
        self.orders(side).get(price, index)
    }

    pub fn buy_steps(&self, price: Price) -> PriceStep {
        self.steps(Side::Buy, price)
    }

    pub fn sell_steps(&self, price: Price) -> PriceStep {
        self.steps(Side::Sell, price)
    }

    pub fn buy_orders_in_step_counter(&self, price: Price) -> u64 {
        self.orders_in_step_counter(Side::Buy, price)
    }

    pub fn sell_orders_in_step_counter(&self, price: Price) -> u64 {
        self.orders_in_step_counter(Side::Sell, price)
    }

    pub fn buy_orders_in_step(&self, price: Price, index: u64) -> Option<&Order> {
        self.orders_in_step(Side::Buy, price, index)
    }

    pub fn sell_orders_in_step(&self, price: Price, index: u64) -> Option<&Order> {
        self.orders_in_step(Side::Sell, price, index)
    }

    /// Highest resting bid
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.highest()
    }

    /// Lowest resting ask
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.lowest()
    }

    /// `best_ask - best_bid`, `None` when either side is empty or the book
    /// is crossed
    pub fn spread(&self) -> Option<u64> {
        self.best_ask()?.checked_sub(self.best_bid()?)
    }

    /// `(price, amount)` pairs for `side` in ascending price order
    pub fn levels(&self, side: Side) -> Vec<(Price, u128)> {
        self.ladder(side).levels()
    }

    pub fn ladder(&self, side: Side) -> &PriceLadder {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub fn orders(&self, side: Side) -> &OrderLedger {
        match side {
            Side::Buy => &self.bid_orders,
            Side::Sell => &self.ask_orders,
        }
    }

    /// Volume escrowed by resting `side` orders, `None` on overflow
    pub fn locked_total(&self, side: Side) -> Option<u128> {
        self.ladder(side).total_amount()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn custody(&self) -> AccountId {
        self.custody
    }

    pub fn asset(&self) -> &T {
        &self.asset
    }

    pub fn quote(&self) -> &T {
        &self.quote
    }

    /// Mutable token access, for funding accounts between placements.
    pub fn asset_mut(&mut self) -> &mut T {
        &mut self.asset
    }

    pub fn quote_mut(&mut self) -> &mut T {
        &mut self.quote
    }

    pub fn token(&self, currency: Currency) -> &T {
        match currency {
            Currency::Asset => &self.asset,
            Currency::Quote => &self.quote,
        }
    }

    fn token_mut(&mut self, currency: Currency) -> &mut T {
        match currency {
            Currency::Asset => &mut self.asset,
            Currency::Quote => &mut self.quote,
        }
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Walk both sides and check ladder links, step totals against resting
    /// orders, bucket cursors and custody coverage.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        for side in [Side::Buy, Side::Sell] {
            let ladder = self.ladder(side);
            let ledger = self.orders(side);
            ladder.check_invariants()?;

            for price in ledger.prices() {
                ledger.check_bucket(price)?;
                let step = ladder.step(price).amount;
                let resting = ledger.resting_amount(price).unwrap_or(u128::MAX);
                if step != resting {
                    return Err(InvariantViolation::StepAmount {
                        side,
                        price,
                        step,
                        resting,
                    });
                }
            }

            // A step with no bucket behind it has nothing resting
            for (price, step) in ladder.iter() {
                if ledger.bucket(price).is_none() {
                    return Err(InvariantViolation::StepAmount {
                        side,
                        price,
                        step: step.amount,
                        resting: 0,
                    });
                }
            }

            let token = self.token(side.locked_currency());
            let locked = self.locked_total(side).unwrap_or(u128::MAX);
            let held = token.balance_of(self.custody);
            if held < locked {
                return Err(InvariantViolation::Custody {
                    token: token.symbol().to_string(),
                    held,
                    locked,
                });
            }
        }
        Ok(())
    }

    /// SHA-256 commitment over the sequence, both ladders and both ledgers.
    pub fn state_root(&self) -> Result<StateRoot> {
        commitment::compute(
            self.sequence,
            [
                (&self.bids, &self.bid_orders),
                (&self.asks, &self.ask_orders),
            ],
        )
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Erc20Ledger;

    const BOOK: AccountId = 1_000;
    const ALICE: AccountId = 1;
    const BOB: AccountId = 2;
    const CAROL: AccountId = 3;

    fn funded_book() -> OrderBook<Erc20Ledger> {
        let mut asset = Erc20Ledger::new("ASSET", 18);
        let mut quote = Erc20Ledger::new("QUOTE", 18);
        for account in [ALICE, BOB, CAROL] {
            asset.mint(account, 10_000).unwrap();
            quote.mint(account, 10_000).unwrap();
            asset.approve(account, BOOK, u128::MAX);
            quote.approve(account, BOOK, u128::MAX);
        }
        OrderBook::new(asset, quote, BOOK)
    }

    #[test]
    fn test_empty_book() {
        let book = funded_book();

        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.spread(), None);
        assert_eq!(book.sequence(), 0);
        assert_eq!(book.buy_steps(5), PriceStep::default());
        assert_eq!(book.sell_orders_in_step_counter(5), 0);
        assert!(book.buy_orders_in_step(5, 1).is_none());
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_resting_buy_escrows_quote() {
        let mut book = funded_book();

        let placement = book.place_buy_order(ALICE, 3, 400).unwrap();

        assert_eq!(placement.receipt.sequence, 1);
        assert_eq!(placement.receipt.resting_index(), Some(1));
        assert!(placement.fills.is_empty());
        assert_eq!(book.quote().balance_of(ALICE), 9_600);
        assert_eq!(book.quote().balance_of(BOOK), 400);
        assert_eq!(book.asset().balance_of(BOOK), 0);
        assert_eq!(book.best_bid(), Some(3));
        assert_eq!(book.locked_total(Side::Buy), Some(400));
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_spread() {
        let mut book = funded_book();
        book.place_buy_order(ALICE, 3, 100).unwrap();
        book.place_sell_order(BOB, 7, 100).unwrap();

        assert_eq!(book.best_bid(), Some(3));
        assert_eq!(book.best_ask(), Some(7));
        assert_eq!(book.spread(), Some(4));
    }

    #[test]
    fn test_crossing_sell_settles_both_parties() {
        let mut book = funded_book();
        book.place_buy_order(ALICE, 5, 300).unwrap();

        let placement = book.place_sell_order(BOB, 4, 500).unwrap();

        assert_eq!(placement.receipt.filled, 300);
        assert_eq!(placement.receipt.rested, 200);
        assert_eq!(placement.fills.len(), 1);
        assert_eq!(placement.fills[0].maker, ALICE);
        assert_eq!(placement.fills[0].price, 5);

        // Alice: paid 300 quote, received 300 asset
        assert_eq!(book.quote().balance_of(ALICE), 9_700);
        assert_eq!(book.asset().balance_of(ALICE), 10_300);
        // Bob: locked 500 asset, 300 of it went to Alice; received 300 quote
        assert_eq!(book.asset().balance_of(BOB), 9_500);
        assert_eq!(book.quote().balance_of(BOB), 10_300);
        // Custody keeps Bob's unmatched 200 asset
        assert_eq!(book.asset().balance_of(BOOK), 200);
        assert_eq!(book.quote().balance_of(BOOK), 0);

        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), Some(4));
        assert_eq!(book.buy_orders_in_step(5, 1).unwrap().amount_matched, 300);
        assert!(book.check_invariants().is_ok());
    }

    #[test]
    fn test_zero_price_leaves_state() {
        let mut book = funded_book();
        book.place_sell_order(ALICE, 2, 50).unwrap();
        let root = book.state_root().unwrap();

        let err = book.place_buy_order(BOB, 0, 10).unwrap_err();

        assert_eq!(err, BookError::ZeroPrice);
        assert_eq!(book.state_root().unwrap(), root);
        assert_eq!(book.quote().balance_of(BOB), 10_000);
        assert_eq!(book.sequence(), 1);
    }

    #[test]
    fn test_insufficient_funds_leaves_state() {
        let mut book = funded_book();
        let root = book.state_root().unwrap();

        let err = book.place_buy_order(ALICE, 1, 10_001).unwrap_err();

        assert!(matches!(
            err,
            BookError::InsufficientFunds(TokenError::InsufficientBalance { .. })
        ));
        assert_eq!(book.state_root().unwrap(), root);
        assert_eq!(book.buy_orders_in_step_counter(1), 0);
        assert_eq!(book.quote().balance_of(ALICE), 10_000);
    }

    #[test]
    fn test_zero_amount_order_commits_without_resting() {
        let mut book = funded_book();

        let placement = book.place_buy_order(ALICE, 4, 0).unwrap();

        assert_eq!(placement.receipt.resting_index(), None);
        assert_eq!(book.sequence(), 1);
        assert_eq!(book.buy_orders_in_step_counter(4), 0);
        assert!(book.ladder(Side::Buy).is_empty());
    }
}
