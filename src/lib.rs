//! curve-engine - Core Library
//! Deterministic bonding-curve pricing with one-shot liquidity milestones

// Public modules
pub mod core;
pub mod math;
pub mod milestone;
pub mod engine;
pub mod registry;

// Re-exports
pub use crate::core::{Config, CurveParams, Error, Result};
pub use engine::CurveEngine;
pub use milestone::{Milestone, MilestoneEvent};
pub use registry::CurveRegistry;
