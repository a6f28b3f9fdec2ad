//! Tiered financial data store and coverage validator.
//!
//! Three tiers of the same ledger, from small to complete:
//!   - Tier 1: annual summary, always resident
//!   - Tier 2: one detail file per category, loaded on demand
//!   - Tier 3: the full account database, queried one account at a time
//!
//! `query` answers lookups without materializing Tier 3 for the caller.
//! `validation` proves every tier reconciles with the one below it.

pub mod classify;
pub mod config;
pub mod error;
pub mod query;
pub mod raw_source;
pub mod report;
pub mod schema;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{TierError, TierResult};
