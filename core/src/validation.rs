//! Coverage validator — proves that nothing was lost between the raw
//! ledger and the summarized tiers.
//!
//! Battery order (fixed, matches the report layout):
//!   1. Account count       Tier 3 rows vs extraction metadata
//!   2. Period presence     Tier 1 periods vs configured calendar
//!   3. Per year:
//!        a. Tier 1 revenue  == sum of Tier 2 revenue line items
//!        b. Tier 2 revenue  == sum of Tier 3 revenue accounts
//!        c. Tier 1 EBITDA   == EBIT + |D&A|
//!   4. Raw source          Tier 3 rows vs raw export (only when a path is set)
//!
//! RULES:
//!   - Construction loads the four required tier files once and fails if
//!     any is missing. After that, nothing here returns an error.
//!   - Every check yields a CheckResult. A mismatch is Mismatch, a problem
//!     reading or interpreting input is Error. Neither aborts the battery.

use crate::{
    classify::AccountClassifier,
    config::ValidatorConfig,
    error::TierResult,
    raw_source::{read_raw_source, RawSourceOptions},
    schema::{ExpenseDetail, RevenueDetail, Tier1Summary, Tier3Database},
    store::TierStore,
    types::{Amount, Period},
};
use serde::Serialize;
use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

// ── Check results ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    /// Both sides were computed and they disagree.
    Mismatch,
    /// One side could not be computed at all.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckValue {
    Amount(Amount),
    Count(usize),
    Periods(Vec<Period>),
    Text(String),
}

impl CheckValue {
    pub fn as_amount(&self) -> Option<Amount> {
        match self {
            CheckValue::Amount(a) => Some(*a),
            _ => None,
        }
    }
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckValue::Amount(a)  => write!(f, "{a:.2}"),
            CheckValue::Count(n)   => write!(f, "{n}"),
            CheckValue::Periods(p) => write!(f, "[{}]", p.join(", ")),
            CheckValue::Text(t)    => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub outcome: CheckOutcome,
    pub expected: CheckValue,
    pub actual: CheckValue,
    /// `None` for exact checks (counts, period sets).
    pub tolerance: Option<f64>,
    pub message: String,
}

impl CheckResult {
    fn judged(
        name: String,
        passed: bool,
        expected: CheckValue,
        actual: CheckValue,
        tolerance: Option<f64>,
        message: String,
    ) -> Self {
        Self {
            name,
            passed,
            outcome: if passed { CheckOutcome::Passed } else { CheckOutcome::Mismatch },
            expected,
            actual,
            tolerance,
            message,
        }
    }

    fn errored(name: String, message: String) -> Self {
        Self {
            name,
            passed: false,
            outcome: CheckOutcome::Error,
            expected: CheckValue::Text("Complete validation".into()),
            actual: CheckValue::Text("Error occurred".into()),
            tolerance: None,
            message,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            return write!(f, "✓ {}", self.name);
        }
        writeln!(f, "✗ {}", self.name)?;
        writeln!(f, "  Expected: {}", self.expected)?;
        writeln!(f, "  Actual:   {}", self.actual)?;
        write!(f, "  {}", self.message)
    }
}

pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.passed)
}

// ── Validator ──────────────────────────────────────────────────────

pub struct CoverageValidator {
    config: ValidatorConfig,
    classifier: Box<dyn AccountClassifier>,
    raw_source: Option<PathBuf>,
    tier1: Tier1Summary,
    tier2_revenue: RevenueDetail,
    tier2_expense: ExpenseDetail,
    tier3: Tier3Database,
}

impl CoverageValidator {
    /// Load tiers 1, 2 (revenue + expense) and 3 from `root`.
    /// Fails with NotFound if any of them is absent.
    pub fn new(root: impl Into<PathBuf>, config: ValidatorConfig) -> TierResult<Self> {
        let store = TierStore::open(root);
        Self::from_store(&store, config)
    }

    pub fn from_store(store: &TierStore, config: ValidatorConfig) -> TierResult<Self> {
        let tier1 = store.load_tier1()?;
        let tier2_revenue = store.load_revenue_detail()?;
        let tier2_expense = store.load_expense_detail()?;
        let tier3 = store.load_tier3()?;
        log::debug!("validator ready over {}", store.root().display());
        Ok(Self {
            classifier: Box::new(config.revenue_rule.clone()),
            config,
            raw_source: None,
            tier1,
            tier2_revenue,
            tier2_expense,
            tier3,
        })
    }

    /// Add the raw tabular export to the battery.
    pub fn with_raw_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_source = Some(path.into());
        self
    }

    /// Replace the configured prefix rule with another chart of accounts.
    pub fn with_classifier(mut self, classifier: impl AccountClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn tier1(&self) -> &Tier1Summary {
        &self.tier1
    }

    pub fn tier2_expense(&self) -> &ExpenseDetail {
        &self.tier2_expense
    }

    fn values_match(&self, expected: Amount, actual: Amount) -> bool {
        (expected - actual).abs() < self.config.tolerance
    }

    fn tier2_revenue_total(&self, year: &str) -> Amount {
        self.tier2_revenue.total(year)
    }

    fn tier3_revenue_total(&self, year: &str) -> Amount {
        self.tier3
            .pl_accounts
            .iter()
            .filter(|acc| self.classifier.is_revenue(&acc.account))
            .map(|acc| acc.totals.get(year).copied().unwrap_or(0.0))
            .sum()
    }

    // ── Individual checks ──────────────────────────────────────

    pub fn validate_tier1_tier2_revenue(&self, year: &str) -> CheckResult {
        let name = format!("Tier 1/2 Revenue Match ({year})");
        let Some(figures) = self.tier1.period(year) else {
            return CheckResult::errored(name, format!("Period {year} not in Tier 1 annual_summary"));
        };
        let Some(tier1_revenue) = figures.revenue else {
            return CheckResult::errored(name, format!("Tier 1 has no revenue for {year}"));
        };

        let tier2_total = self.tier2_revenue_total(year);
        let passed = self.values_match(tier1_revenue, tier2_total);

        CheckResult::judged(
            name,
            passed,
            CheckValue::Amount(tier1_revenue),
            CheckValue::Amount(tier2_total),
            Some(self.config.tolerance),
            if passed { String::new() } else { "Revenue totals don't match between tiers".into() },
        )
    }

    pub fn validate_tier2_tier3_revenue(&self, year: &str) -> CheckResult {
        let tier2_total = self.tier2_revenue_total(year);
        let tier3_total = self.tier3_revenue_total(year);
        let passed = self.values_match(tier2_total, tier3_total);

        CheckResult::judged(
            format!("Tier 2/3 Revenue Match ({year})"),
            passed,
            CheckValue::Amount(tier2_total),
            CheckValue::Amount(tier3_total),
            Some(self.config.tolerance),
            if passed {
                String::new()
            } else {
                "Revenue totals don't match between Tier 2 and Tier 3".into()
            },
        )
    }

    pub fn validate_ebitda(&self, year: &str) -> CheckResult {
        let name = format!("EBITDA Calculation ({year})");
        let Some(figures) = self.tier1.period(year) else {
            return CheckResult::errored(name, format!("Period {year} not in Tier 1 annual_summary"));
        };

        let calculated = figures.derived_ebitda();
        let reported = figures.ebitda;
        let passed = self.values_match(reported, calculated);

        CheckResult::judged(
            name,
            passed,
            CheckValue::Amount(reported),
            CheckValue::Amount(calculated),
            Some(self.config.tolerance),
            if passed { String::new() } else { "EBITDA != EBIT + |D&A|".into() },
        )
    }

    pub fn validate_account_count(&self) -> CheckResult {
        let tier3_count = self.tier3.pl_accounts.len();
        let metadata_count = self.tier3.extraction_metadata.total_accounts;
        let passed = tier3_count == metadata_count;

        CheckResult::judged(
            "Account Count Match".into(),
            passed,
            CheckValue::Count(metadata_count),
            CheckValue::Count(tier3_count),
            None,
            if passed { String::new() } else { "Tier 3 account count doesn't match metadata".into() },
        )
    }

    /// Missing periods fail the check. Extra periods are reported but
    /// do not fail it on their own.
    pub fn validate_no_missing_periods(&self) -> CheckResult {
        let expected: BTreeSet<&str> =
            self.config.expected_periods.iter().map(String::as_str).collect();
        let actual: BTreeSet<&str> = self.tier1.annual_summary.keys().map(String::as_str).collect();

        let missing: Vec<&str> = expected.difference(&actual).copied().collect();
        let extra: Vec<&str> = actual.difference(&expected).copied().collect();

        let mut notes = Vec::new();
        if !missing.is_empty() {
            notes.push(format!("Missing periods: {}", missing.join(", ")));
        }
        if !extra.is_empty() {
            notes.push(format!("Extra periods: {}", extra.join(", ")));
        }

        CheckResult::judged(
            "All Periods Present".into(),
            missing.is_empty(),
            CheckValue::Periods(expected.iter().map(|p| p.to_string()).collect()),
            CheckValue::Periods(actual.iter().map(|p| p.to_string()).collect()),
            None,
            notes.join(". "),
        )
    }

    /// Compare Tier 3 against the raw export: same row count, same first
    /// account. Any read or parse problem becomes a failed result.
    pub fn validate_tier3_vs_raw_source(&self, path: &Path) -> CheckResult {
        let name = "Tier 3 vs Raw Source Coverage".to_string();
        let options = RawSourceOptions {
            sheet: self.config.raw_sheet.as_deref(),
            delimiter: self.config.raw_delimiter,
        };
        let raw = match read_raw_source(path, options) {
            Ok(raw) => raw,
            Err(e) => return CheckResult::errored(name, format!("Validation error: {e}")),
        };

        let accounts = &self.tier3.pl_accounts;
        let tier3_count = accounts.len();
        let mut passed = raw.row_count == tier3_count;

        let message = if !passed {
            format!("Row count mismatch: raw={}, Tier3={tier3_count}", raw.row_count)
        } else {
            match (raw.first_account.as_deref(), accounts.first()) {
                (Some(raw_first), Some(tier3_first)) if raw_first != tier3_first.account.trim() => {
                    passed = false;
                    format!(
                        "First account mismatch: raw='{raw_first}' vs Tier3='{}'",
                        tier3_first.account.trim()
                    )
                }
                _ => format!("Row count matches: {} accounts", raw.row_count),
            }
        };

        CheckResult::judged(
            name,
            passed,
            CheckValue::Count(raw.row_count),
            CheckValue::Count(tier3_count),
            None,
            message,
        )
    }

    // ── Battery ────────────────────────────────────────────────

    /// Run every check. `years` overrides the configured list.
    pub fn validate_all(&self, years: Option<&[Period]>) -> Vec<CheckResult> {
        let years = years.unwrap_or(self.config.years.as_slice());
        let mut results = Vec::with_capacity(3 + years.len() * 3);

        results.push(self.validate_account_count());
        results.push(self.validate_no_missing_periods());

        for year in years {
            results.push(self.validate_tier1_tier2_revenue(year));
            results.push(self.validate_tier2_tier3_revenue(year));
            results.push(self.validate_ebitda(year));
        }

        if let Some(path) = &self.raw_source {
            results.push(self.validate_tier3_vs_raw_source(path));
        }

        for r in results.iter().filter(|r| !r.passed) {
            log::warn!("check failed: {} ({})", r.name, r.message);
        }
        log::info!(
            "coverage validation: {}/{} checks passed",
            results.iter().filter(|r| r.passed).count(),
            results.len()
        );

        results
    }
}

// ── One-shot helpers ───────────────────────────────────────────────

/// Validate a store with the given config and log the full report.
pub fn validate_extraction(
    root: impl Into<PathBuf>,
    raw_source: Option<&Path>,
    years: Option<&[Period]>,
    config: ValidatorConfig,
) -> TierResult<bool> {
    let mut validator = CoverageValidator::new(root, config)?;
    if let Some(raw) = raw_source {
        validator = validator.with_raw_source(raw);
    }
    let report = crate::report::ValidationReport::new(validator.validate_all(years));
    log::info!("\n{report}");
    Ok(report.all_passed())
}

/// Default config, no raw source, no output.
pub fn validate_quick(root: impl Into<PathBuf>) -> TierResult<bool> {
    let validator = CoverageValidator::new(root, ValidatorConfig::default())?;
    Ok(all_passed(&validator.validate_all(None)))
}
