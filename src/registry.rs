//! Curve Registry - one engine per launched token
//!
//! Map lookups take a short read lock; every trade then holds that token's
//! own mutex for the whole quote + execute, so two callers can never
//! interleave against one curve while different tokens trade in parallel.

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::core::{BuyQuote, CurveParams, Error, Result, SellQuote, StateView, TokenId, TradeResult};
use crate::engine::CurveEngine;
use crate::milestone::MilestoneEvent;

type SharedCurve = Arc<Mutex<CurveEngine>>;

/// Keyed store of live curves
#[derive(Default)]
pub struct CurveRegistry {
    curves: RwLock<HashMap<TokenId, SharedCurve>>,
}

impl CurveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the curve for a new token.
    pub fn launch(&self, token: TokenId, params: CurveParams) -> Result<()> {
        let mut curves = self.curves.write();
        if curves.contains_key(&token) {
            return Err(Error::TokenExists(token.to_string()));
        }
        let engine = CurveEngine::new(params)?;
        info!("🚀 Launched curve for {}", token);
        curves.insert(token, Arc::new(Mutex::new(engine)));
        Ok(())
    }

    fn curve(&self, token: &TokenId) -> Result<SharedCurve> {
        self.curves
            .read()
            .get(token)
            .cloned()
            .ok_or_else(|| Error::UnknownToken(token.to_string()))
    }

    /// Run `f` with exclusive access to the token's engine.
    pub fn with_curve<R>(&self, token: &TokenId, f: impl FnOnce(&mut CurveEngine) -> Result<R>) -> Result<R> {
        let curve = self.curve(token)?;
        let mut engine = curve.lock();
        f(&mut engine)
    }

    pub fn quote_buy(&self, token: &TokenId, amount_in: Decimal) -> Result<BuyQuote> {
        self.with_curve(token, |e| e.quote_buy(amount_in))
    }

    pub fn quote_sell(&self, token: &TokenId, amount_tokens: Decimal) -> Result<SellQuote> {
        self.with_curve(token, |e| e.quote_sell(amount_tokens))
    }

    pub fn buy(&self, token: &TokenId, amount_in: Decimal) -> Result<TradeResult> {
        self.with_curve(token, |e| e.execute_buy(amount_in))
    }

    pub fn sell(&self, token: &TokenId, amount_tokens: Decimal) -> Result<TradeResult> {
        self.with_curve(token, |e| e.execute_sell(amount_tokens))
    }

    pub fn snapshot(&self, token: &TokenId) -> Result<StateView> {
        self.with_curve(token, |e| Ok(e.snapshot()))
    }

    pub fn subscribe(&self, token: &TokenId) -> Result<flume::Receiver<MilestoneEvent>> {
        self.with_curve(token, |e| Ok(e.subscribe()))
    }

    /// Registered tokens, sorted
    pub fn tokens(&self) -> Vec<TokenId> {
        let mut tokens: Vec<TokenId> = self.curves.read().keys().cloned().collect();
        tokens.sort();
        tokens
    }

    pub fn len(&self) -> usize {
        self.curves.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MilestoneConfig;

    fn token(s: &str) -> TokenId {
        TokenId::new(s)
    }

    #[test]
    fn test_launch_and_lookup() {
        let registry = CurveRegistry::new();
        assert!(registry.is_empty());

        registry.launch(token("MOON"), CurveParams::default()).unwrap();
        registry.launch(token("DOGE"), CurveParams::default()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tokens(), vec![token("DOGE"), token("MOON")]);

        let err = registry.launch(token("MOON"), CurveParams::default()).unwrap_err();
        assert!(matches!(err, Error::TokenExists(_)));
    }

    #[test]
    fn test_invalid_params_not_registered() {
        let registry = CurveRegistry::new();
        let params = CurveParams {
            fee_rate: Decimal::ONE,
            ..CurveParams::default()
        };
        assert!(matches!(registry.launch(token("BAD"), params), Err(Error::Config(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_token() {
        let registry = CurveRegistry::new();
        assert!(matches!(
            registry.buy(&token("NOPE"), Decimal::ONE),
            Err(Error::UnknownToken(_))
        ));
        assert!(matches!(registry.snapshot(&token("NOPE")), Err(Error::UnknownToken(_))));
    }

    #[test]
    fn test_curves_are_independent() {
        let registry = CurveRegistry::new();
        registry.launch(token("A"), CurveParams::default()).unwrap();
        registry.launch(token("B"), CurveParams::default()).unwrap();

        registry.buy(&token("A"), Decimal::from(100)).unwrap();
        assert_eq!(registry.snapshot(&token("A")).unwrap().pool_balance, "115");
        assert_eq!(registry.snapshot(&token("B")).unwrap().pool_balance, "16");
    }

    #[test]
    fn test_quote_then_execute_under_one_lock() {
        let registry = CurveRegistry::new();
        registry.launch(token("A"), CurveParams::default()).unwrap();

        let (quote, trade) = registry
            .with_curve(&token("A"), |e| {
                let q = e.quote_buy(Decimal::from(25))?;
                let t = e.execute_buy_with_min_out(Decimal::from(25), q.tokens_out)?;
                Ok((q, t))
            })
            .unwrap();
        assert_eq!(quote.tokens_out, trade.amount_out);
    }

    #[test]
    fn test_concurrent_buys_serialize_per_token() {
        let registry = CurveRegistry::new();
        registry.launch(token("A"), CurveParams::default()).unwrap();
        registry.launch(token("B"), CurveParams::default()).unwrap();

        std::thread::scope(|s| {
            for i in 0..8 {
                let registry = &registry;
                let id = if i % 2 == 0 { token("A") } else { token("B") };
                s.spawn(move || {
                    for _ in 0..5 {
                        registry.buy(&id, Decimal::from(2)).unwrap();
                    }
                });
            }
        });

        // 4 threads x 5 buys x (2 - 0.02 fee) on top of the initial 16
        for id in [token("A"), token("B")] {
            let pool = registry.with_curve(&id, |e| Ok(e.pool_balance())).unwrap();
            assert_eq!(pool, Decimal::from(16) + Decimal::new(198, 2) * Decimal::from(20));
        }
    }

    #[test]
    fn test_subscribe_through_registry() {
        let registry = CurveRegistry::new();
        registry
            .launch(
                token("A"),
                CurveParams {
                    milestones: MilestoneConfig {
                        listing_threshold: Decimal::from(100),
                        ..MilestoneConfig::default()
                    },
                    ..CurveParams::default()
                },
            )
            .unwrap();
        let rx = registry.subscribe(&token("A")).unwrap();

        registry.buy(&token("A"), Decimal::from(10)).unwrap();
        let event = rx.try_recv().unwrap();
        assert!(matches!(event, MilestoneEvent::ListingReady { .. }));
    }
}
