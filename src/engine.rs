//! Curve Engine - constant-power bonding curve with liquidity milestones
//!
//! Price is never stored; it is always `pool / (supply * reserve_ratio)`
//! read off the two mutable ledger fields. Quotes are pure. Executes run
//! the quote path first and only then touch the ledger, so a failed execute
//! leaves every field exactly as it was.
//!
//! The engine holds no locks. Callers sharing one curve between threads
//! must serialize quote + execute per token (see [`crate::registry`]).

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::core::{
    BuyQuote, CurveParams, Error, Result, SellQuote, Side, StateView, TradeResult,
};
use crate::math;
use crate::milestone::{Milestone, MilestoneEvent, MilestoneTracker};

/// Single token's curve state and pricing logic
#[derive(Debug)]
pub struct CurveEngine {
    initial_supply: Decimal,
    reserve_ratio: Decimal,
    initial_price: Decimal,
    fee_rate: Decimal,
    current_supply: Decimal,
    pool_balance: Decimal,
    milestones: MilestoneTracker,
    subscribers: Vec<flume::Sender<MilestoneEvent>>,
}

impl CurveEngine {
    pub fn new(params: CurveParams) -> Result<Self> {
        params.validate()?;

        let pool_balance = math::mul(
            math::mul(params.initial_supply, params.initial_price)?,
            params.reserve_ratio,
        )?;
        let current_supply = math::trunc(params.current_supply.unwrap_or(params.initial_supply));

        info!(
            "Curve launched: supply={} pool={} ratio={} fee={}",
            current_supply, pool_balance, params.reserve_ratio, params.fee_rate
        );

        Ok(Self {
            initial_supply: params.initial_supply,
            reserve_ratio: params.reserve_ratio,
            initial_price: params.initial_price,
            fee_rate: params.fee_rate,
            current_supply,
            pool_balance,
            milestones: MilestoneTracker::new(params.milestones),
            subscribers: Vec::new(),
        })
    }

    pub fn reserve_ratio(&self) -> Decimal {
        self.reserve_ratio
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    pub fn current_supply(&self) -> Decimal {
        self.current_supply
    }

    pub fn pool_balance(&self) -> Decimal {
        self.pool_balance
    }

    pub fn is_fired(&self, milestone: Milestone) -> bool {
        self.milestones.flags().is_fired(milestone)
    }

    /// Receive every milestone event this curve emits from now on.
    pub fn subscribe(&mut self) -> flume::Receiver<MilestoneEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    // ─────────────────────────────────────────────────────────────
    // Curve math
    // ─────────────────────────────────────────────────────────────

    /// Spot price for `supply` against `pool`. Zero once supply is gone.
    fn price_at(&self, pool: Decimal, supply: Decimal) -> Result<Decimal> {
        if supply.is_zero() {
            return Ok(Decimal::ZERO);
        }
        math::div(pool, math::mul(supply, self.reserve_ratio)?)
    }

    /// Market cap `supply * price` for a ledger, reduced to `pool / reserve_ratio`.
    fn market_cap_at(&self, pool: Decimal, supply: Decimal) -> Result<Decimal> {
        if supply.is_zero() {
            return Ok(Decimal::ZERO);
        }
        math::div(pool, self.reserve_ratio).map(math::trunc)
    }

    /// `pool * (target_supply / supply) ^ reserve_ratio`, rounded up so the
    /// pool keeps any rounding remainder.
    fn pool_for_supply(&self, target_supply: Decimal) -> Result<Decimal> {
        if target_supply.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let ratio = math::div(target_supply, self.current_supply)?;
        let scaled = math::pow(ratio, self.reserve_ratio)?
            .checked_mul(self.pool_balance)
            .ok_or(Error::Overflow("multiplication"))?;
        Ok(math::ceil(scaled))
    }

    /// `supply * (target_pool / pool) ^ (1 / reserve_ratio)`
    fn supply_for_pool(&self, target_pool: Decimal) -> Result<Decimal> {
        let ratio = math::div(target_pool, self.pool_balance)?;
        let exponent = math::div(Decimal::ONE, self.reserve_ratio)?;
        math::mul(self.current_supply, math::pow(ratio, exponent)?)
    }

    // ─────────────────────────────────────────────────────────────
    // Quotes
    // ─────────────────────────────────────────────────────────────

    pub fn quote_buy(&self, amount_in: Decimal) -> Result<BuyQuote> {
        let amount_in = math::ensure_positive(math::trunc(amount_in))?;
        if self.pool_balance.is_zero() || self.current_supply.is_zero() {
            return Err(Error::Depleted {
                pool_balance: self.pool_balance,
                current_supply: self.current_supply,
            });
        }

        let fee = math::mul(amount_in, self.fee_rate)?;
        let net_in = amount_in - fee;
        let target_pool = math::add(self.pool_balance, net_in)?;
        let tokens_out = (self.supply_for_pool(target_pool)? - self.current_supply).max(Decimal::ZERO);

        let quote = BuyQuote {
            amount_in,
            fee,
            net_in,
            tokens_out,
            price_before_trade: self.current_price(),
        };
        debug!("quote_buy {} -> {} tokens (fee {})", amount_in, quote.tokens_out, fee);
        Ok(quote)
    }

    pub fn quote_sell(&self, amount_tokens: Decimal) -> Result<SellQuote> {
        let amount_tokens = math::ensure_positive(math::trunc(amount_tokens))?;
        if amount_tokens > self.current_supply {
            return Err(Error::InsufficientBalance {
                requested: amount_tokens,
                available: self.current_supply,
            });
        }

        let target_supply = self.current_supply - amount_tokens;
        // Rounding up may land a hair above the pool
        let target_pool = self.pool_for_supply(target_supply)?.min(self.pool_balance);
        let gross_out = self.pool_balance - target_pool;
        let fee = math::mul(gross_out, self.fee_rate)?;
        let net_out = gross_out - fee;

        let quote = SellQuote {
            amount_tokens,
            gross_out,
            fee,
            net_out,
            price_after_trade: self.price_at(target_pool, target_supply)?,
        };
        debug!("quote_sell {} -> {} currency (fee {})", amount_tokens, net_out, fee);
        Ok(quote)
    }

    // ─────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────

    pub fn execute_buy(&mut self, amount_in: Decimal) -> Result<TradeResult> {
        let quote = self.quote_buy(amount_in).inspect_err(|e| warn!("buy rejected: {}", e))?;
        self.apply_buy(quote)
    }

    pub fn execute_sell(&mut self, amount_tokens: Decimal) -> Result<TradeResult> {
        let quote = self.quote_sell(amount_tokens).inspect_err(|e| warn!("sell rejected: {}", e))?;
        self.apply_sell(quote)
    }

    /// Buy, failing without side effects if fewer than `min_tokens_out` would be minted.
    pub fn execute_buy_with_min_out(&mut self, amount_in: Decimal, min_tokens_out: Decimal) -> Result<TradeResult> {
        let quote = self.quote_buy(amount_in)?;
        if quote.tokens_out < min_tokens_out {
            warn!("buy rejected: {} tokens quoted, minimum {}", quote.tokens_out, min_tokens_out);
            return Err(Error::SlippageExceeded {
                min_out: min_tokens_out,
                quoted: quote.tokens_out,
            });
        }
        self.apply_buy(quote)
    }

    /// Sell, failing without side effects if less than `min_currency_out` would be paid.
    pub fn execute_sell_with_min_out(&mut self, amount_tokens: Decimal, min_currency_out: Decimal) -> Result<TradeResult> {
        let quote = self.quote_sell(amount_tokens)?;
        if quote.net_out < min_currency_out {
            warn!("sell rejected: {} quoted, minimum {}", quote.net_out, min_currency_out);
            return Err(Error::SlippageExceeded {
                min_out: min_currency_out,
                quoted: quote.net_out,
            });
        }
        self.apply_sell(quote)
    }

    fn apply_buy(&mut self, quote: BuyQuote) -> Result<TradeResult> {
        let pool_balance = math::add(self.pool_balance, quote.net_in)?;
        let current_supply = math::add(self.current_supply, quote.tokens_out)?;
        self.commit(Side::Buy, quote.amount_in, quote.tokens_out, quote.fee, pool_balance, current_supply)
    }

    fn apply_sell(&mut self, quote: SellQuote) -> Result<TradeResult> {
        let pool_balance = self.pool_balance - (quote.net_out + quote.fee);
        let current_supply = self.current_supply - quote.amount_tokens;
        self.commit(Side::Sell, quote.amount_tokens, quote.net_out, quote.fee, pool_balance, current_supply)
    }

    /// Write the new ledger, then run milestones against it.
    ///
    /// Milestone evaluation is computed on a scratch copy first so an error
    /// there cannot leave a half-applied trade behind.
    fn commit(
        &mut self,
        side: Side,
        amount_in: Decimal,
        amount_out: Decimal,
        fee: Decimal,
        pool_balance: Decimal,
        current_supply: Decimal,
    ) -> Result<TradeResult> {
        let market_cap = self.market_cap_at(pool_balance, current_supply)?;
        let mut milestones = self.milestones.clone();
        let mut pool_after_burns = pool_balance;
        let events = milestones.evaluate(market_cap, &mut pool_after_burns)?;

        self.pool_balance = pool_after_burns;
        self.current_supply = current_supply;
        self.milestones = milestones;

        info!(
            "{} {} -> {} (fee {}) supply={} pool={}",
            side, amount_in, amount_out, fee, self.current_supply, self.pool_balance
        );
        self.publish(&events);

        Ok(TradeResult {
            side,
            amount_in,
            amount_out,
            fee,
            price_after: self.current_price(),
            current_supply: self.current_supply,
            pool_balance: self.pool_balance,
            events,
        })
    }

    fn publish(&mut self, events: &[MilestoneEvent]) {
        for event in events {
            info!("🎯 Milestone {} fired: {:?}", event.milestone(), event);
            self.subscribers.retain(|tx| match tx.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    warn!("Dropping disconnected milestone subscriber");
                    false
                }
            });
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────

    pub fn current_price(&self) -> Decimal {
        // Both fields already passed checked arithmetic on the way in
        self.price_at(self.pool_balance, self.current_supply)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn market_cap(&self) -> Decimal {
        self.market_cap_at(self.pool_balance, self.current_supply)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn snapshot(&self) -> StateView {
        let cfg = self.milestones.config();
        let flags = self.milestones.flags();
        StateView {
            initial_supply: self.initial_supply.normalize().to_string(),
            reserve_ratio: self.reserve_ratio.normalize().to_string(),
            initial_price: self.initial_price.normalize().to_string(),
            fee_rate: self.fee_rate.normalize().to_string(),
            current_supply: self.current_supply.normalize().to_string(),
            pool_balance: self.pool_balance.normalize().to_string(),
            current_price: self.current_price().normalize().to_string(),
            market_cap: self.market_cap().normalize().to_string(),
            listing_threshold: cfg.listing_threshold.normalize().to_string(),
            first_burn_threshold: cfg.first_burn_threshold.normalize().to_string(),
            second_burn_threshold: cfg.second_burn_threshold.normalize().to_string(),
            first_burn_fraction: cfg.first_burn_fraction.normalize().to_string(),
            second_burn_fraction: cfg.second_burn_fraction.normalize().to_string(),
            listing_ready: flags.is_fired(Milestone::Listing),
            first_burn_executed: flags.is_fired(Milestone::FirstBurn),
            second_burn_executed: flags.is_fired(Milestone::SecondBurn),
        }
    }
}
