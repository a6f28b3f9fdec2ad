//! Account classification.
//!
//! Which ledger accounts count as revenue depends on the chart of
//! accounts in use. The validator takes any `AccountClassifier`; the
//! shipped `PrefixClassifier::default()` encodes the German SKR-style
//! convention (revenue accounts start with "4", the "47" block is a
//! different account family). Other charts must supply their own rule.

use serde::{Deserialize, Serialize};

pub trait AccountClassifier: Send + Sync {
    /// True if `account` belongs to the revenue family.
    fn is_revenue(&self, account: &str) -> bool;
}

/// Revenue iff the identifier starts with one of `include` and none of `exclude`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixClassifier {
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for PrefixClassifier {
    fn default() -> Self {
        Self {
            include: vec!["4".into()],
            exclude: vec!["47".into()],
        }
    }
}

impl AccountClassifier for PrefixClassifier {
    fn is_revenue(&self, account: &str) -> bool {
        let account = account.trim();
        self.include.iter().any(|p| account.starts_with(p.as_str()))
            && !self.exclude.iter().any(|p| account.starts_with(p.as_str()))
    }
}

impl<F> AccountClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_revenue(&self, account: &str) -> bool {
        self(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_excludes_47_block() {
        let c = PrefixClassifier::default();
        assert!(c.is_revenue("440000"));
        assert!(c.is_revenue(" 4000 "));
        assert!(!c.is_revenue("473600"));
        assert!(!c.is_revenue("602000"));
        assert!(!c.is_revenue(""));
    }

    #[test]
    fn closures_are_classifiers() {
        let c = |a: &str| a.starts_with('8');
        assert!(c.is_revenue("8400"));
        assert!(!c.is_revenue("4400"));
    }
}
