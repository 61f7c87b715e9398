//! Error handling - One flat error type for every curve operation

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Curve engine error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Non-positive or non-numeric trade amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Sell amount exceeds circulating supply
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Result outside the decimal range
    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),

    /// Pool or supply has reached zero, the curve can no longer price buys
    #[error("Curve depleted: pool {pool_balance}, supply {current_supply}")]
    Depleted { pool_balance: Decimal, current_supply: Decimal },

    /// Realized output below the caller's minimum
    #[error("Slippage exceeded: expected at least {min_out}, quoted {quoted}")]
    SlippageExceeded { min_out: Decimal, quoted: Decimal },

    /// Registry lookup for a token that was never launched
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// Registry launch for a token that already has a curve
    #[error("Token already launched: {0}")]
    TokenExists(String),
}
