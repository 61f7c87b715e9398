//! Core types - Quotes, trade results and read-only state views

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::milestone::MilestoneEvent;

/// Token identity used to key curves in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Trade direction against the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Result of pricing a buy without committing it.
///
/// `price_before_trade` is the spot price of the curve *before* the buy is
/// applied. It is not the post-trade price; read
/// [`TradeResult::price_after`] from an executed buy for that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyQuote {
    /// Gross currency paid in
    pub amount_in: Decimal,
    /// Fee withheld from `amount_in`
    pub fee: Decimal,
    /// Currency that reaches the pool
    pub net_in: Decimal,
    /// Tokens minted to the buyer
    pub tokens_out: Decimal,
    pub price_before_trade: Decimal,
}

/// Result of pricing a sell without committing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellQuote {
    /// Tokens returned to the curve
    pub amount_tokens: Decimal,
    /// Currency released by the pool before fees
    pub gross_out: Decimal,
    /// Fee withheld from `gross_out`
    pub fee: Decimal,
    /// Currency paid to the seller
    pub net_out: Decimal,
    /// Spot price once the sell has been applied
    pub price_after_trade: Decimal,
}

/// Realized outcome of an executed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeResult {
    pub side: Side,
    /// Currency for a buy, tokens for a sell
    pub amount_in: Decimal,
    /// Tokens for a buy, net currency for a sell
    pub amount_out: Decimal,
    pub fee: Decimal,
    /// Spot price recomputed from the post-trade ledger
    pub price_after: Decimal,
    pub current_supply: Decimal,
    pub pool_balance: Decimal,
    /// Milestones that fired as a consequence of this trade
    pub events: Vec<MilestoneEvent>,
}

/// Display-friendly copy of every curve field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    pub initial_supply: String,
    pub reserve_ratio: String,
    pub initial_price: String,
    pub fee_rate: String,
    pub current_supply: String,
    pub pool_balance: String,
    pub current_price: String,
    pub market_cap: String,
    pub listing_threshold: String,
    pub first_burn_threshold: String,
    pub second_burn_threshold: String,
    pub first_burn_fraction: String,
    pub second_burn_fraction: String,
    pub listing_ready: bool,
    pub first_burn_executed: bool,
    pub second_burn_executed: bool,
}
