//! Shared primitive types used across every tier.

use std::collections::BTreeMap;

/// A period key: a calendar year (`"2021"`) or a half-year (`"2023_h1"`).
pub type Period = String;

/// A currency amount as it appears in the tier files.
pub type Amount = f64;

/// A ledger account identifier, always compared as a trimmed string.
pub type AccountId = String;

/// One amount per period.
pub type TotalsMap = BTreeMap<Period, Amount>;

/// year → month name → amount.
pub type MonthlyData = BTreeMap<String, BTreeMap<String, Amount>>;
