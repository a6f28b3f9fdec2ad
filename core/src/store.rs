//! Tier file store.
//!
//! RULE: Only store.rs touches the tier files.
//! The query engine and the validator call store methods, they never
//! resolve paths or parse JSON themselves.
//!
//! Layout under the store root:
//!   tier1/summary.json
//!   tier2/<category>_detail.json
//!   tier3/raw_accounts_database.json
//!
//! Every load re-reads the file. The only state kept between calls is the
//! set of Tier 2 categories seen so far, which is cost bookkeeping and
//! never feeds back into a result.

use crate::{
    error::{TierError, TierResult},
    schema::{
        CategoryDetail, ExpenseDetail, RevenueDetail, Tier1Summary, Tier2Category, Tier2Detail,
        Tier3Database,
    },
};
use serde::de::DeserializeOwned;
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

pub const TIER1_FILE: &str = "tier1/summary.json";
pub const TIER2_DIR: &str = "tier2";
pub const TIER3_FILE: &str = "tier3/raw_accounts_database.json";

#[derive(Debug)]
pub struct TierStore {
    root: PathBuf,
    tier2_loaded: Mutex<BTreeSet<Tier2Category>>,
}

impl TierStore {
    /// Point a store at `root`. Nothing is read until a load is requested.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tier2_loaded: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Paths ──────────────────────────────────────────────────

    pub fn tier1_path(&self) -> PathBuf {
        self.root.join(TIER1_FILE)
    }

    pub fn tier2_dir(&self) -> PathBuf {
        self.root.join(TIER2_DIR)
    }

    pub fn tier2_path(&self, category: Tier2Category) -> PathBuf {
        self.tier2_dir().join(category.file_name())
    }

    pub fn tier3_path(&self) -> PathBuf {
        self.root.join(TIER3_FILE)
    }

    // ── Tier 1 ─────────────────────────────────────────────────

    pub fn load_tier1(&self) -> TierResult<Tier1Summary> {
        read_json(&self.tier1_path(), "Tier 1 summary")
    }

    // ── Tier 2 ─────────────────────────────────────────────────

    pub fn load_tier2(&self, category: Tier2Category) -> TierResult<Tier2Detail> {
        let detail = match category {
            Tier2Category::Revenue => Tier2Detail::Revenue(self.read_tier2(category)?),
            Tier2Category::Expense => Tier2Detail::Expense(self.read_tier2(category)?),
            Tier2Category::WorkingCapital => {
                Tier2Detail::WorkingCapital(self.read_tier2::<CategoryDetail>(category)?)
            }
            Tier2Category::BalanceSheet => {
                Tier2Detail::BalanceSheet(self.read_tier2::<CategoryDetail>(category)?)
            }
        };
        Ok(detail)
    }

    pub fn load_revenue_detail(&self) -> TierResult<RevenueDetail> {
        self.read_tier2(Tier2Category::Revenue)
    }

    pub fn load_expense_detail(&self) -> TierResult<ExpenseDetail> {
        self.read_tier2(Tier2Category::Expense)
    }

    /// Whether `category` has been loaded through this store instance.
    pub fn is_tier2_loaded(&self, category: Tier2Category) -> bool {
        self.loaded_set().contains(&category)
    }

    /// Every Tier 2 category loaded so far, in declaration order.
    pub fn loaded_tier2(&self) -> Vec<Tier2Category> {
        self.loaded_set().iter().copied().collect()
    }

    /// JSON file names currently present in the tier2 directory, sorted.
    pub fn available_tier2_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.tier2_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".json"))
            .collect();
        names.sort();
        names
    }

    fn read_tier2<T: DeserializeOwned>(&self, category: Tier2Category) -> TierResult<T> {
        let path = self.tier2_path(category);
        if !path.exists() {
            let available = self.available_tier2_files();
            return Err(TierError::NotFound {
                what: format!(
                    "Tier 2 file {} (available: [{}])",
                    category.file_name(),
                    available.join(", ")
                ),
                path,
            });
        }
        let detail = read_json(&path, category.file_name())?;
        self.mark_loaded(category);
        Ok(detail)
    }

    fn mark_loaded(&self, category: Tier2Category) {
        if self.loaded_set().insert(category) {
            log::debug!("tier2 {category} now in context");
        }
    }

    // A poisoned lock only means another reader panicked mid-insert;
    // the set is still usable.
    fn loaded_set(&self) -> std::sync::MutexGuard<'_, BTreeSet<Tier2Category>> {
        self.tier2_loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Tier 3 ─────────────────────────────────────────────────

    pub fn load_tier3(&self) -> TierResult<Tier3Database> {
        let db: Tier3Database = read_json(&self.tier3_path(), "Tier 3 database")?;
        log::debug!(
            "tier3 loaded: {} P&L accounts, {} balance sheet accounts",
            db.pl_accounts.len(),
            db.balance_sheet_accounts.len()
        );
        Ok(db)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> TierResult<T> {
    if !path.exists() {
        return Err(TierError::NotFound {
            what: what.to_string(),
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|source| TierError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("read {} ({} bytes)", path.display(), content.len());
    serde_json::from_str(&content).map_err(|source| TierError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}
