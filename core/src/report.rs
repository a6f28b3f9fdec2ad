//! Human- and machine-readable views over a validation run.

use crate::validation::{all_passed, CheckResult};
use serde::Serialize;
use std::fmt;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub results: Vec<CheckResult>,
    pub passed: usize,
    pub total: usize,
    pub all_passed: bool,
}

impl ValidationReport {
    pub fn new(results: Vec<CheckResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            all_passed: all_passed(&results),
            passed,
            results,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.passed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn all_passed(&self) -> bool {
        self.all_passed
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Failures only. A clean run renders as a single line.
    pub fn render_failures(&self) -> String {
        let failures: Vec<&CheckResult> = self.failures().collect();
        if failures.is_empty() {
            return "✓ All validations passed".to_string();
        }
        let bang = "!".repeat(RULE_WIDTH);
        let mut out = format!("{bang}\nVALIDATION FAILURES ({})\n{bang}\n", failures.len());
        for f in failures {
            out.push('\n');
            out.push_str(&f.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "VALIDATION RESULTS - 100% Coverage Check")?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;
        for r in &self.results {
            writeln!(f, "{r}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(f, "Summary: {}/{} checks passed", self.passed, self.total)?;
        writeln!(f)?;
        if self.all_passed {
            writeln!(f, "✓ 100% COVERAGE VALIDATED")?;
            writeln!(f, "  - All tiers mathematically consistent")?;
            writeln!(f, "  - Zero information loss confirmed")?;
        } else {
            writeln!(f, "✗ VALIDATION FAILED")?;
            writeln!(f, "  - Do NOT proceed with analysis")?;
            writeln!(f, "  - Review failed checks above")?;
            writeln!(f, "  - Re-run extraction workflow")?;
        }
        write!(f, "{rule}")
    }
}
