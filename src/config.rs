//! Book configuration.
//!
//! Loaded from an optional TOML file, then overridden by `STEPBOOK_`
//! environment variables (`__` separates nested keys, e.g.
//! `STEPBOOK_QUOTE__SYMBOL=USDC`). Every field has a default.
//!
//! ```toml
//! custody_account = 0
//! log_filter = "step_book=debug"
//!
//! [asset]
//! symbol = "ASSET"
//! decimals = 18
//!
//! [[accounts]]
//! id = 1
//! asset = "1000"
//! quote = "2500.5"
//! ```

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::TokenError;
use crate::orderbook::OrderBook;
use crate::token::Erc20Ledger;
use crate::types::units::{self, MAX_DECIMALS};
use crate::types::AccountId;

pub const ENV_PREFIX: &str = "STEPBOOK";

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("{symbol}: {decimals} decimals exceeds the supported {max}", max = MAX_DECIMALS)]
    InvalidDecimals { symbol: String, decimals: u32 },

    #[error("account {account}: invalid {symbol} amount {value:?}")]
    InvalidAmount {
        account: AccountId,
        symbol: String,
        value: String,
    },

    #[error("account {0} is the custody account")]
    CustodyAccount(AccountId),

    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    #[serde(default = "max_decimals")]
    pub decimals: u32,
}

fn max_decimals() -> u32 {
    MAX_DECIMALS
}

impl TokenConfig {
    fn named(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals: MAX_DECIMALS,
        }
    }
}

/// A funded account; balances are decimal strings in whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: AccountId,
    #[serde(default = "zero")]
    pub asset: String,
    #[serde(default = "zero")]
    pub quote: String,
}

fn zero() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub asset: TokenConfig,
    pub quote: TokenConfig,
    /// Account that holds escrowed funds
    pub custody_account: AccountId,
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub log_filter: String,
    pub accounts: Vec<AccountConfig>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            asset: TokenConfig::named("ASSET"),
            quote: TokenConfig::named("QUOTE"),
            custody_account: 0,
            log_filter: "info".to_string(),
            accounts: Vec::new(),
        }
    }
}

impl BookConfig {
    /// Load from `path` (if given) layered under the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SetupError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: BookConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document, ignoring the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, SetupError> {
        let config: BookConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        for token in [&self.asset, &self.quote] {
            if token.decimals > MAX_DECIMALS {
                return Err(SetupError::InvalidDecimals {
                    symbol: token.symbol.clone(),
                    decimals: token.decimals,
                });
            }
        }
        for account in &self.accounts {
            if account.id == self.custody_account {
                return Err(SetupError::CustodyAccount(account.id));
            }
            self.balances(account)?;
        }
        Ok(())
    }

    /// `(asset, quote)` base-unit balances for `account`
    fn balances(&self, account: &AccountConfig) -> Result<(u128, u128), SetupError> {
        let parse = |token: &TokenConfig, value: &str| {
            units::parse_amount(value, token.decimals).ok_or_else(|| SetupError::InvalidAmount {
                account: account.id,
                symbol: token.symbol.clone(),
                value: value.to_string(),
            })
        };
        Ok((
            parse(&self.asset, &account.asset)?,
            parse(&self.quote, &account.quote)?,
        ))
    }

    /// Token ledgers with every configured account funded and the custody
    /// account approved to escrow from them without limit.
    pub fn build_tokens(&self) -> Result<(Erc20Ledger, Erc20Ledger), SetupError> {
        let mut asset = Erc20Ledger::new(self.asset.symbol.clone(), self.asset.decimals);
        let mut quote = Erc20Ledger::new(self.quote.symbol.clone(), self.quote.decimals);

        for account in &self.accounts {
            let (asset_balance, quote_balance) = self.balances(account)?;
            asset.mint(account.id, asset_balance)?;
            quote.mint(account.id, quote_balance)?;
            asset.approve(account.id, self.custody_account, u128::MAX);
            quote.approve(account.id, self.custody_account, u128::MAX);
        }

        Ok((asset, quote))
    }

    pub fn build_book(&self) -> Result<OrderBook<Erc20Ledger>, SetupError> {
        let (asset, quote) = self.build_tokens()?;
        Ok(OrderBook::new(asset, quote, self.custody_account))
    }
}
