use crate::{classify::PrefixClassifier, types::Period};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default equality band for amount checks, in currency units.
pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// Everything the coverage validator needs to know about the deal it is
/// checking. Passed in explicitly so validators for different fiscal
/// calendars or charts of accounts can run side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Amount checks pass when `|expected - actual| < tolerance`.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Full years reconciled by `validate_all` when no years are given.
    /// Half-year keys are usually left out since Tier 2 may not split them.
    #[serde(default = "default_years")]
    pub years: Vec<Period>,
    /// Periods that must be present in the Tier 1 summary.
    #[serde(default = "default_expected_periods")]
    pub expected_periods: Vec<Period>,
    #[serde(default)]
    pub revenue_rule: PrefixClassifier,
    /// Field delimiter of the raw tabular export.
    #[serde(default = "default_delimiter")]
    pub raw_delimiter: char,
    /// Worksheet of a raw workbook; the first sheet when unset.
    #[serde(default)]
    pub raw_sheet: Option<String>,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_years() -> Vec<Period> {
    vec!["2020".into(), "2021".into(), "2022".into()]
}

fn default_expected_periods() -> Vec<Period> {
    vec!["2020".into(), "2021".into(), "2022".into(), "2023_h1".into()]
}

fn default_delimiter() -> char {
    ','
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            years: default_years(),
            expected_periods: default_expected_periods(),
            revenue_rule: PrefixClassifier::default(),
            raw_delimiter: default_delimiter(),
            raw_sheet: None,
        }
    }
}

impl ValidatorConfig {
    /// Load from a JSON file. Missing keys fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: ValidatorConfig = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Same defaults, different calendar.
    pub fn with_periods(years: Vec<Period>, expected_periods: Vec<Period>) -> Self {
        Self {
            years,
            expected_periods,
            ..Self::default()
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            anyhow::bail!("tolerance must be a positive number, got {}", self.tolerance);
        }
        if !self.raw_delimiter.is_ascii() {
            anyhow::bail!("raw_delimiter must be a single ASCII character");
        }
        if self.revenue_rule.include.is_empty() {
            anyhow::bail!("revenue_rule.include must name at least one prefix");
        }
        Ok(())
    }
}
