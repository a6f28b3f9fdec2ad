//! Tier data contracts.
//!
//! Field names here are the wire contract with the extraction pipeline.
//! Absent optional fields are defaulted at deserialization so nothing
//! downstream has to reason about missing keys.

use crate::{
    error::{TierError, TierResult},
    types::{AccountId, Amount, MonthlyData, Period, TotalsMap},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};

// ── Tier 1: summary ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier1Summary {
    pub annual_summary: BTreeMap<Period, AnnualFigures>,
    #[serde(default)]
    pub key_findings: Value,
    #[serde(default)]
    pub data_available: Value,
}

impl Tier1Summary {
    pub fn period(&self, period: &str) -> Option<&AnnualFigures> {
        self.annual_summary.get(period)
    }

    pub fn periods(&self) -> Vec<Period> {
        self.annual_summary.keys().cloned().collect()
    }
}

/// Annual aggregates for one period.
///
/// `revenue` stays optional so a single incomplete period degrades only
/// the checks that need it instead of rejecting the whole summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnualFigures {
    #[serde(default)]
    pub revenue: Option<Amount>,
    #[serde(default)]
    pub ebit: Amount,
    #[serde(default)]
    pub ebitda: Amount,
    #[serde(default)]
    pub depreciation_amortization: Amount,
    #[serde(default)]
    pub ebitda_margin_pct: Option<f64>,
    #[serde(default)]
    pub nwc_pct_revenue: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AnnualFigures {
    /// EBIT plus the absolute D&A charge. D&A is booked negative in some
    /// extracts and positive in others.
    pub fn derived_ebitda(&self) -> Amount {
        self.ebit + self.depreciation_amortization.abs()
    }
}

// ── Tier 2: category detail ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier2Category {
    Revenue,
    Expense,
    WorkingCapital,
    BalanceSheet,
}

impl Tier2Category {
    pub const ALL: [Tier2Category; 4] = [
        Tier2Category::Revenue,
        Tier2Category::Expense,
        Tier2Category::WorkingCapital,
        Tier2Category::BalanceSheet,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Tier2Category::Revenue        => "revenue",
            Tier2Category::Expense        => "expense",
            Tier2Category::WorkingCapital => "working_capital",
            Tier2Category::BalanceSheet   => "balance_sheet",
        }
    }

    /// File name under `<root>/tier2/`.
    pub fn file_name(self) -> &'static str {
        match self {
            Tier2Category::Revenue        => "revenue_detail.json",
            Tier2Category::Expense        => "expense_detail.json",
            Tier2Category::WorkingCapital => "working_capital_detail.json",
            Tier2Category::BalanceSheet   => "balance_sheet_detail.json",
        }
    }
}

impl fmt::Display for Tier2Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Tier2Category {
    type Err = TierError;

    /// Accepts either the slug (`revenue`) or the file name (`revenue_detail.json`).
    fn from_str(s: &str) -> TierResult<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s || c.file_name() == s)
            .ok_or_else(|| {
                TierError::InvalidArgument(format!(
                    "unknown Tier 2 category '{s}' (expected one of: revenue, expense, working_capital, balance_sheet)"
                ))
            })
    }
}

/// One Tier 2 line: period keys mapped to amounts, plus whatever
/// descriptive metadata the extractor attached (label, accounts, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl LineItem {
    /// Numeric amount for `period`, if the line carries one.
    pub fn amount(&self, period: &str) -> Option<Amount> {
        self.fields.get(period).and_then(Value::as_f64)
    }

    pub fn label(&self) -> Option<&str> {
        ["line_item", "label", "description", "name"]
            .iter()
            .find_map(|k| self.fields.get(*k).and_then(Value::as_str))
    }
}

/// Sum of every line's amount for `period`; lines without one count as zero.
pub fn sum_line_items(items: &[LineItem], period: &str) -> Amount {
    items.iter().map(|i| i.amount(period).unwrap_or(0.0)).sum()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueDetail {
    #[serde(default)]
    pub revenue_by_line_item: Vec<LineItem>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RevenueDetail {
    pub fn total(&self, period: &str) -> Amount {
        sum_line_items(&self.revenue_by_line_item, period)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationCandidate {
    #[serde(deserialize_with = "de_account_id")]
    pub account: AccountId,
    pub flag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseDetail {
    #[serde(default)]
    pub normalization_candidates: Vec<NormalizationCandidate>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Categories without a dedicated schema keep their sections as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub sections: BTreeMap<String, Value>,
}

impl CategoryDetail {
    /// Interpret a named section as a list of line items.
    pub fn line_items(&self, section: &str) -> TierResult<Vec<LineItem>> {
        match self.sections.get(section) {
            None => Ok(Vec::new()),
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                TierError::InvalidArgument(format!("section '{section}' is not a line-item list: {e}"))
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", content = "detail", rename_all = "snake_case")]
pub enum Tier2Detail {
    Revenue(RevenueDetail),
    Expense(ExpenseDetail),
    WorkingCapital(CategoryDetail),
    BalanceSheet(CategoryDetail),
}

impl Tier2Detail {
    pub fn category(&self) -> Tier2Category {
        match self {
            Tier2Detail::Revenue(_)        => Tier2Category::Revenue,
            Tier2Detail::Expense(_)        => Tier2Category::Expense,
            Tier2Detail::WorkingCapital(_) => Tier2Category::WorkingCapital,
            Tier2Detail::BalanceSheet(_)   => Tier2Category::BalanceSheet,
        }
    }
}

// ── Tier 3: raw account database ───────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tier3Database {
    #[serde(default)]
    pub pl_accounts: Vec<AccountRecord>,
    #[serde(default)]
    pub balance_sheet_accounts: Vec<AccountRecord>,
    #[serde(default)]
    pub extraction_metadata: ExtractionMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    #[serde(default)]
    pub total_accounts: usize,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(deserialize_with = "de_account_id")]
    pub account: AccountId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub totals: TotalsMap,
    #[serde(default)]
    pub monthly_data: MonthlyData,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAccountId {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Account identifiers arrive as strings or bare numbers depending on the
/// extractor; normalize to a trimmed string.
fn de_account_id<'de, D>(deserializer: D) -> Result<AccountId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawAccountId::deserialize(deserializer)? {
        RawAccountId::Text(s) => s.trim().to_string(),
        RawAccountId::Int(n) => n.to_string(),
        RawAccountId::Float(f) if f.fract() == 0.0 => format!("{}", f as i64),
        RawAccountId::Float(f) => f.to_string(),
    })
}
