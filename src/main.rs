//! Step Book - demo binary
//!
//! Loads the book configuration (optional TOML path as the first argument,
//! `STEPBOOK_*` environment overrides), seeds a ladder on each side and
//! sends one crossing order through it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use step_book::config::{AccountConfig, BookConfig};
use step_book::types::units;
use step_book::{AccountId, OrderBook, Erc20Ledger, Side, TokenLedger};

/// Traders used when the configuration names none
fn default_accounts() -> Vec<AccountConfig> {
    (1..=4)
        .map(|id| AccountConfig {
            id,
            asset: "10000".to_string(),
            quote: "10000".to_string(),
        })
        .collect()
}

fn main() -> Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let mut config = BookConfig::load(path.as_deref()).context("loading book configuration")?;
    if config.accounts.is_empty() {
        config.accounts = default_accounts();
        config.validate().context("validating default accounts")?;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("parsing log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut book = config.build_book().context("building order book")?;
    let traders: Vec<AccountId> = config.accounts.iter().map(|a| a.id).collect();
    let asset_unit = units::unit(config.asset.decimals).context("asset decimals")?;
    let quote_unit = units::unit(config.quote.decimals).context("quote decimals")?;

    println!("===========================================");
    println!("  Step Book - {}/{}", config.asset.symbol, config.quote.symbol);
    println!("===========================================");
    println!();

    // Bids at 1, 2, 3, 2 and asks at 4, 5, 6, 5: both ladders get three steps
    // with two orders in the middle one
    let ladder = [(0usize, 0u64, 1_000u128), (1, 1, 1_000), (2, 2, 1_000), (3, 1, 500)];
    for &(trader, offset, amount) in &ladder {
        let caller = traders[trader % traders.len()];
        book.place_buy_order(caller, 1 + offset, amount * quote_unit)
            .with_context(|| format!("seeding bid for account {caller}"))?;
        book.place_sell_order(caller, 4 + offset, amount * asset_unit)
            .with_context(|| format!("seeding ask for account {caller}"))?;
    }
    print_book(&book, &config);

    // A sell at 2 takes the whole bid at 3 and part of the first bid at 2
    let taker = traders[traders.len() - 1];
    let placement = book
        .place_sell_order(taker, 2, 1_700 * asset_unit)
        .context("crossing sell")?;
    info!(
        sequence = placement.receipt.sequence,
        fills = placement.fills.len(),
        "crossing order settled"
    );

    println!("Crossing sell @ 2 for 1700:");
    for fill in &placement.fills {
        println!(
            "  filled {} against account {} (order #{} @ {})",
            render(fill.amount, config.asset.decimals),
            fill.maker,
            fill.maker_index,
            fill.price
        );
    }
    println!(
        "  rested {}",
        render(placement.receipt.rested, config.asset.decimals)
    );
    println!();
    print_book(&book, &config);

    println!(
        "Taker balances: {} {}, {} {}",
        render(book.asset().balance_of(taker), config.asset.decimals),
        config.asset.symbol,
        render(book.quote().balance_of(taker), config.quote.decimals),
        config.quote.symbol
    );

    book.check_invariants().context("book invariants")?;
    let root = book.state_root().context("computing state root")?;
    println!("State root: {root}");
    Ok(())
}

fn print_book(book: &OrderBook<Erc20Ledger>, config: &BookConfig) {
    for side in [Side::Sell, Side::Buy] {
        // Bids rest quote, asks rest asset
        let decimals = match side {
            Side::Buy => config.quote.decimals,
            Side::Sell => config.asset.decimals,
        };
        println!("{side:?} ladder:");
        for (price, amount) in book.levels(side).into_iter().rev() {
            let step = book.steps(side, price);
            println!(
                "  {price:>4}  {:>12}  orders={}  lower={} higher={}",
                render(amount, decimals),
                book.orders_in_step_counter(side, price),
                step.lower_price,
                step.higher_price
            );
        }
    }
    println!();
}

fn render(amount: u128, decimals: u32) -> String {
    units::format_amount(amount, decimals).unwrap_or_else(|| amount.to_string())
}
