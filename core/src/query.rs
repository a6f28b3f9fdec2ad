//! Account query engine — point lookups and keyword search over Tier 3,
//! plus the question → Tier 2 routing table.
//!
//! Tier 1 is loaded once and stays resident in the engine. Tier 2 is
//! fetched only when a question trips one of the trigger phrases below.
//! Tier 3 is only ever asked for a single account or a description search.

use crate::{
    error::{TierError, TierResult},
    schema::{AccountRecord, Tier1Summary, Tier2Category, Tier2Detail, Tier3Database},
    store::TierStore,
    types::{AccountId, Amount, Period, TotalsMap},
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// Approximate context cost of pulling one Tier 2 file.
pub const TIER2_CONTEXT_COST_TOKENS: u32 = 20_000;

/// Ordered trigger table. First category with any matching phrase wins,
/// so the order here is part of the routing contract.
pub const TIER2_TRIGGERS: &[(Tier2Category, &[&str])] = &[
    (
        Tier2Category::Revenue,
        &[
            "revenue breakdown", "revenue quality", "revenue sources",
            "revenue composition", "revenue line items", "revenue concentration",
        ],
    ),
    (
        Tier2Category::Expense,
        &[
            "expense categories", "normalization", "cost structure",
            "expense breakdown", "operating expenses", "personnel costs",
        ],
    ),
    (
        Tier2Category::WorkingCapital,
        &[
            "working capital", "nwc", "dso", "dpo", "cash conversion",
            "receivables", "payables", "inventory",
        ],
    ),
    (
        Tier2Category::BalanceSheet,
        &[
            "balance sheet", "assets", "liabilities", "equity",
            "debt", "cash position",
        ],
    ),
];

// ── Argument types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Pl,
    BalanceSheet,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Pl           => "pl",
            AccountKind::BalanceSheet => "balance_sheet",
        }
    }

    fn accounts(self, db: &Tier3Database) -> &[AccountRecord] {
        match self {
            AccountKind::Pl           => &db.pl_accounts,
            AccountKind::BalanceSheet => &db.balance_sheet_accounts,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = TierError;

    fn from_str(s: &str) -> TierResult<Self> {
        match s.trim() {
            "pl" => Ok(AccountKind::Pl),
            "balance_sheet" => Ok(AccountKind::BalanceSheet),
            other => Err(TierError::InvalidArgument(format!(
                "invalid account kind '{other}' (available: pl, balance_sheet)"
            ))),
        }
    }
}

/// A parsed period filter: `"2022"` or `"2021.march"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodSelector {
    Year(Period),
    Month { year: String, month: String },
}

impl PeriodSelector {
    pub fn parse(period: &str) -> TierResult<Self> {
        let period = period.trim();
        if period.is_empty() {
            return Err(TierError::InvalidArgument("empty period".into()));
        }
        let parts: Vec<&str> = period.split('.').collect();
        match parts.as_slice() {
            [year] => Ok(PeriodSelector::Year(year.to_string())),
            [year, month] if !year.is_empty() && !month.is_empty() => Ok(PeriodSelector::Month {
                year: year.to_string(),
                month: month.to_string(),
            }),
            _ => Err(TierError::InvalidArgument(format!(
                "malformed period '{period}' (expected 'YYYY' or 'YYYY.month')"
            ))),
        }
    }
}

// ── Results ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AccountValue {
    /// Full totals map, returned when no period was requested.
    Totals(TotalsMap),
    /// A single amount. `None` means the account exists but carries no
    /// total for that year, which is not an error.
    Amount(Option<Amount>),
}

impl AccountValue {
    pub fn amount(&self) -> Option<Amount> {
        match self {
            AccountValue::Amount(a) => *a,
            AccountValue::Totals(_) => None,
        }
    }

    pub fn totals(&self) -> Option<&TotalsMap> {
        match self {
            AccountValue::Totals(t) => Some(t),
            AccountValue::Amount(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountMatch {
    pub account: AccountId,
    pub description: String,
    pub totals: TotalsMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Tier1,
    Tier2,
}

/// Which tier a question should be answered from, and what it costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRoute {
    pub question: String,
    pub source_tier: SourceTier,
    pub file_needed: String,
    pub context_cost_tokens: u32,
}

// ── Engine ─────────────────────────────────────────────────────────

pub struct AccountQueryEngine {
    store: TierStore,
    tier1: OnceCell<Tier1Summary>,
}

impl AccountQueryEngine {
    pub fn new(store: TierStore) -> Self {
        Self { store, tier1: OnceCell::new() }
    }

    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(TierStore::open(root))
    }

    pub fn store(&self) -> &TierStore {
        &self.store
    }

    /// The resident Tier 1 summary. Read from disk on first use only;
    /// a failed read is not cached, so the next call tries again.
    pub fn tier1(&self) -> TierResult<&Tier1Summary> {
        self.tier1.get_or_try_init(|| {
            let summary = self.store.load_tier1()?;
            log::debug!("tier 1 resident: {} periods", summary.annual_summary.len());
            Ok(summary)
        })
    }

    /// Look up one account by identifier.
    ///
    /// The account is resolved before the period is inspected, so an
    /// unknown account is always `AccountNotFound` whatever `period` says.
    pub fn query_account(
        &self,
        number: &str,
        period: Option<&str>,
        kind: AccountKind,
    ) -> TierResult<AccountValue> {
        let db = self.store.load_tier3()?;
        let record = find_account(&db, number, kind)?;

        let Some(period) = period else {
            return Ok(AccountValue::Totals(record.totals.clone()));
        };

        match PeriodSelector::parse(period)? {
            PeriodSelector::Year(year) => Ok(AccountValue::Amount(record.totals.get(&year).copied())),
            PeriodSelector::Month { year, month } => {
                let months = record.monthly_data.get(&year).ok_or_else(|| TierError::PeriodNotFound {
                    account: record.account.clone(),
                    period: year.clone(),
                })?;
                let amount = months.get(&month).ok_or_else(|| TierError::PeriodNotFound {
                    account: record.account.clone(),
                    period: format!("{year}.{month}"),
                })?;
                Ok(AccountValue::Amount(Some(*amount)))
            }
        }
    }

    /// Case-insensitive substring search over account descriptions.
    /// Matches keep the ledger's original order.
    pub fn search_accounts(&self, term: &str, kind: AccountKind) -> TierResult<Vec<AccountMatch>> {
        let db = self.store.load_tier3()?;
        let needle = term.to_lowercase();
        let matches: Vec<AccountMatch> = kind
            .accounts(&db)
            .iter()
            .filter(|acc| acc.description.to_lowercase().contains(&needle))
            .map(|acc| AccountMatch {
                account: acc.account.clone(),
                description: acc.description.clone(),
                totals: acc.totals.clone(),
            })
            .collect();
        log::debug!("search '{term}' in {kind}: {} matches", matches.len());
        Ok(matches)
    }

    /// Route a question to Tier 1 or to the Tier 2 file it needs.
    pub fn route_question(&self, question: &str) -> QuestionRoute {
        route_question(question)
    }

    /// Load the Tier 2 detail a question needs. `None` means Tier 1
    /// answers it and nothing was read.
    pub fn detail_for_question(&self, question: &str) -> TierResult<Option<Tier2Detail>> {
        tier2_trigger(question)
            .map(|category| self.store.load_tier2(category))
            .transpose()
    }
}

fn find_account<'a>(
    db: &'a Tier3Database,
    number: &str,
    kind: AccountKind,
) -> TierResult<&'a AccountRecord> {
    let wanted = number.trim();
    let accounts = kind.accounts(db);
    accounts
        .iter()
        .find(|acc| acc.account.trim() == wanted)
        .ok_or_else(|| TierError::AccountNotFound {
            account: wanted.to_string(),
            kind: kind.to_string(),
            available: accounts.len(),
        })
}

/// The Tier 2 category a question needs, or `None` if Tier 1 is enough.
pub fn tier2_trigger(question: &str) -> Option<Tier2Category> {
    let q = question.to_lowercase();
    TIER2_TRIGGERS
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| q.contains(p)))
        .map(|(category, _)| *category)
}

/// The full trigger table, for callers that want to enumerate routing.
pub fn trigger_table() -> &'static [(Tier2Category, &'static [&'static str])] {
    TIER2_TRIGGERS
}

pub fn route_question(question: &str) -> QuestionRoute {
    match tier2_trigger(question) {
        Some(category) => QuestionRoute {
            question: question.to_string(),
            source_tier: SourceTier::Tier2,
            file_needed: category.file_name().to_string(),
            context_cost_tokens: TIER2_CONTEXT_COST_TOKENS,
        },
        None => QuestionRoute {
            question: question.to_string(),
            source_tier: SourceTier::Tier1,
            file_needed: "summary.json".to_string(),
            context_cost_tokens: 0,
        },
    }
}

// ── One-shot helpers ───────────────────────────────────────────────

pub fn query_account(
    root: impl Into<PathBuf>,
    number: &str,
    period: Option<&str>,
    kind: AccountKind,
) -> TierResult<AccountValue> {
    AccountQueryEngine::open(root).query_account(number, period, kind)
}

pub fn search_accounts(
    root: impl Into<PathBuf>,
    term: &str,
    kind: AccountKind,
) -> TierResult<Vec<AccountMatch>> {
    AccountQueryEngine::open(root).search_accounts(term, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_selector_parses_year_and_month() {
        assert_eq!(PeriodSelector::parse("2022").unwrap(), PeriodSelector::Year("2022".into()));
        assert_eq!(
            PeriodSelector::parse("2021.march").unwrap(),
            PeriodSelector::Month { year: "2021".into(), month: "march".into() }
        );
    }

    #[test]
    fn period_selector_rejects_malformed() {
        for bad in ["", "2021.", ".march", "2021.march.extra"] {
            let err = PeriodSelector::parse(bad).unwrap_err();
            assert!(matches!(err, TierError::InvalidArgument(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn account_kind_rejects_unknown() {
        assert_eq!("pl".parse::<AccountKind>().unwrap(), AccountKind::Pl);
        assert_eq!(" balance_sheet ".parse::<AccountKind>().unwrap(), AccountKind::BalanceSheet);
        assert!(matches!(
            "cash_flow".parse::<AccountKind>(),
            Err(TierError::InvalidArgument(_))
        ));
    }
}
