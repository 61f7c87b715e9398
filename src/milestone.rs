//! Liquidity milestones - one-shot actions keyed on market cap
//!
//! Each milestone moves `pending -> fired` exactly once. Re-crossing a
//! threshold after a drop never fires it again.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{MilestoneConfig, Result};
use crate::math;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Listing,
    FirstBurn,
    SecondBurn,
}

impl Milestone {
    pub const ALL: [Milestone; 3] = [Milestone::Listing, Milestone::FirstBurn, Milestone::SecondBurn];
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Milestone::Listing => write!(f, "LISTING"),
            Milestone::FirstBurn => write!(f, "FIRST_BURN"),
            Milestone::SecondBurn => write!(f, "SECOND_BURN"),
        }
    }
}

/// Signal for the external liquidity collaborator.
///
/// The engine never touches a chain. `ListingReady` asks the integration
/// layer to list the token; the burn events report how much currency was
/// removed from the engine's own pool ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MilestoneEvent {
    ListingReady { market_cap: Decimal },
    FirstBurnExecuted { amount: Decimal },
    SecondBurnExecuted { amount: Decimal },
}

impl MilestoneEvent {
    pub fn milestone(&self) -> Milestone {
        match self {
            MilestoneEvent::ListingReady { .. } => Milestone::Listing,
            MilestoneEvent::FirstBurnExecuted { .. } => Milestone::FirstBurn,
            MilestoneEvent::SecondBurnExecuted { .. } => Milestone::SecondBurn,
        }
    }
}

/// Which milestones have already fired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneFlags {
    listing: bool,
    first_burn: bool,
    second_burn: bool,
}

impl MilestoneFlags {
    pub fn is_fired(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::Listing => self.listing,
            Milestone::FirstBurn => self.first_burn,
            Milestone::SecondBurn => self.second_burn,
        }
    }

    fn fire(&mut self, milestone: Milestone) {
        match milestone {
            Milestone::Listing => self.listing = true,
            Milestone::FirstBurn => self.first_burn = true,
            Milestone::SecondBurn => self.second_burn = true,
        }
    }
}

/// Milestone state machine for a single curve
#[derive(Debug, Clone)]
pub struct MilestoneTracker {
    config: MilestoneConfig,
    flags: MilestoneFlags,
}

impl MilestoneTracker {
    pub fn new(config: MilestoneConfig) -> Self {
        Self {
            config,
            flags: MilestoneFlags::default(),
        }
    }

    pub fn config(&self) -> &MilestoneConfig {
        &self.config
    }

    pub fn flags(&self) -> MilestoneFlags {
        self.flags
    }

    fn threshold(&self, milestone: Milestone) -> Decimal {
        match milestone {
            Milestone::Listing => self.config.listing_threshold,
            Milestone::FirstBurn => self.config.first_burn_threshold,
            Milestone::SecondBurn => self.config.second_burn_threshold,
        }
    }

    /// Fire every pending milestone whose threshold `market_cap` has reached.
    ///
    /// Burns are taken from `pool_balance` in order, so the second burn is
    /// sized against what the first one left. `pool_balance` is only written
    /// once all burn amounts are known.
    pub fn evaluate(&mut self, market_cap: Decimal, pool_balance: &mut Decimal) -> Result<Vec<MilestoneEvent>> {
        let mut pool = *pool_balance;
        let mut fired = Vec::new();
        let mut events = Vec::new();

        for milestone in Milestone::ALL {
            if self.flags.is_fired(milestone) || market_cap < self.threshold(milestone) {
                continue;
            }
            let event = match milestone {
                Milestone::Listing => MilestoneEvent::ListingReady { market_cap },
                Milestone::FirstBurn => {
                    let amount = math::mul(pool, self.config.first_burn_fraction)?;
                    pool -= amount;
                    MilestoneEvent::FirstBurnExecuted { amount }
                }
                Milestone::SecondBurn => {
                    let amount = math::mul(pool, self.config.second_burn_fraction)?;
                    pool -= amount;
                    MilestoneEvent::SecondBurnExecuted { amount }
                }
            };
            fired.push(milestone);
            events.push(event);
        }

        for milestone in fired {
            self.flags.fire(milestone);
        }
        *pool_balance = pool;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> MilestoneTracker {
        MilestoneTracker::new(MilestoneConfig {
            listing_threshold: Decimal::from(100),
            first_burn_threshold: Decimal::from(200),
            second_burn_threshold: Decimal::from(300),
            first_burn_fraction: Decimal::new(10, 2),
            second_burn_fraction: Decimal::new(50, 2),
        })
    }

    #[test]
    fn test_below_all_thresholds() {
        let mut t = tracker();
        let mut pool = Decimal::from(1000);
        let events = t.evaluate(Decimal::from(99), &mut pool).unwrap();
        assert!(events.is_empty());
        assert_eq!(pool, Decimal::from(1000));
        assert_eq!(t.flags(), MilestoneFlags::default());
    }

    #[test]
    fn test_listing_does_not_touch_pool() {
        let mut t = tracker();
        let mut pool = Decimal::from(1000);
        let events = t.evaluate(Decimal::from(100), &mut pool).unwrap();
        assert_eq!(events, vec![MilestoneEvent::ListingReady { market_cap: Decimal::from(100) }]);
        assert_eq!(pool, Decimal::from(1000));
        assert!(t.flags().is_fired(Milestone::Listing));
        assert!(!t.flags().is_fired(Milestone::FirstBurn));
    }

    #[test]
    fn test_all_fire_together_in_order() {
        let mut t = tracker();
        let mut pool = Decimal::from(1000);
        let events = t.evaluate(Decimal::from(1_000), &mut pool).unwrap();

        // 1000 - 10% = 900, then 900 - 50% = 450
        assert_eq!(
            events,
            vec![
                MilestoneEvent::ListingReady { market_cap: Decimal::from(1_000) },
                MilestoneEvent::FirstBurnExecuted { amount: Decimal::from(100) },
                MilestoneEvent::SecondBurnExecuted { amount: Decimal::from(450) },
            ]
        );
        assert_eq!(pool, Decimal::from(450));
        for m in Milestone::ALL {
            assert!(t.flags().is_fired(m), "{} should have fired", m);
        }
    }

    #[test]
    fn test_never_refires() {
        let mut t = tracker();
        let mut pool = Decimal::from(1000);
        t.evaluate(Decimal::from(250), &mut pool).unwrap();
        assert_eq!(pool, Decimal::from(900));

        // Drop below, then cross again
        assert!(t.evaluate(Decimal::from(10), &mut pool).unwrap().is_empty());
        let events = t.evaluate(Decimal::from(250), &mut pool).unwrap();
        assert!(events.is_empty());
        assert_eq!(pool, Decimal::from(900));

        // Only the still-pending one fires
        let events = t.evaluate(Decimal::from(300), &mut pool).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].milestone(), Milestone::SecondBurn);
        assert_eq!(pool, Decimal::from(450));
    }

    #[test]
    fn test_event_json_shape() {
        let event = MilestoneEvent::FirstBurnExecuted { amount: Decimal::new(15, 1) };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"first_burn_executed","amount":"1.5"}"#);
    }
}
