//! Integration tests for the tier store.
//!
//! 1. Each tier loads from its documented location
//! 2. Missing files surface as NotFound naming the path
//! 3. Tier 2 loads are tracked per category, and only on success
//! 4. Loads always reflect the file on disk at call time

mod common;

use common::{build_store, consistent_store, expense_fixture, revenue_fixture, tier1_fixture, tier3_fixture, write_json};
use serde_json::json;
use tierdata_core::{
    error::TierError,
    schema::{Tier2Category, Tier2Detail},
    store::TierStore,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: every tier loads
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn loads_all_three_tiers() {
    let dir = consistent_store();
    let store = TierStore::open(dir.path());

    let tier1 = store.load_tier1().unwrap();
    assert_eq!(tier1.periods(), vec!["2020", "2021", "2022", "2023_h1"]);
    let y2020 = tier1.period("2020").unwrap();
    assert_eq!(y2020.revenue, Some(1000.0));
    assert_eq!(y2020.ebitda_margin_pct, Some(20.0));
    assert_eq!(tier1.period("2021").unwrap().nwc_pct_revenue, None);

    let revenue = store.load_revenue_detail().unwrap();
    assert_eq!(revenue.revenue_by_line_item.len(), 2);
    assert_eq!(revenue.total("2021"), 1200.0);

    let expense = store.load_expense_detail().unwrap();
    assert_eq!(expense.normalization_candidates[1].account, "630000");

    let tier3 = store.load_tier3().unwrap();
    assert_eq!(tier3.pl_accounts.len(), 7);
    assert_eq!(tier3.balance_sheet_accounts.len(), 2);
    assert_eq!(tier3.extraction_metadata.total_accounts, 7);
}

#[test]
fn load_tier2_tags_detail_with_its_category() {
    let dir = consistent_store();
    write_json(
        dir.path(),
        "tier2/working_capital_detail.json",
        &json!({ "nwc_items": [ { "line_item": "Receivables", "2022": 210.0 } ], "dso_days": { "2022": 41 } }),
    );
    let store = TierStore::open(dir.path());

    let detail = store.load_tier2(Tier2Category::WorkingCapital).unwrap();
    assert_eq!(detail.category(), Tier2Category::WorkingCapital);
    let Tier2Detail::WorkingCapital(wc) = detail else {
        panic!("expected working capital detail");
    };
    let items = wc.line_items("nwc_items").unwrap();
    assert_eq!(items[0].amount("2022"), Some(210.0));
    assert!(wc.line_items("absent").unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: missing files
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn missing_tiers_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = TierStore::open(dir.path());

    let err = store.load_tier1().unwrap_err();
    assert!(matches!(err, TierError::NotFound { ref path, .. } if path.ends_with("tier1/summary.json")));

    let err = store.load_tier3().unwrap_err();
    assert!(err.is_not_found(), "{err}");

    let err = store.load_tier2(Tier2Category::BalanceSheet).unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn missing_tier2_lists_available_files() {
    let dir = consistent_store();
    let store = TierStore::open(dir.path());

    let err = store.load_tier2(Tier2Category::BalanceSheet).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("balance_sheet_detail.json"), "{msg}");
    assert!(msg.contains("expense_detail.json, revenue_detail.json"), "{msg}");
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tier1")).unwrap();
    std::fs::write(dir.path().join("tier1/summary.json"), "{ not json").unwrap();

    let err = TierStore::open(dir.path()).load_tier1().unwrap_err();
    assert!(matches!(err, TierError::Serialization { .. }), "{err}");
    assert!(!err.is_not_found());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: Tier 2 tracking
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn tier2_loads_are_tracked() {
    let dir = consistent_store();
    let store = TierStore::open(dir.path());
    assert!(store.loaded_tier2().is_empty());

    store.load_tier2(Tier2Category::Expense).unwrap();
    assert!(store.is_tier2_loaded(Tier2Category::Expense));
    assert!(!store.is_tier2_loaded(Tier2Category::Revenue));

    store.load_revenue_detail().unwrap();
    store.load_tier2(Tier2Category::Expense).unwrap();
    assert_eq!(
        store.loaded_tier2(),
        vec![Tier2Category::Revenue, Tier2Category::Expense]
    );
}

#[test]
fn failed_tier2_load_is_not_tracked() {
    let dir = consistent_store();
    let store = TierStore::open(dir.path());

    assert!(store.load_tier2(Tier2Category::WorkingCapital).is_err());
    assert!(!store.is_tier2_loaded(Tier2Category::WorkingCapital));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: freshness
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn every_load_rereads_the_file() {
    let dir = build_store(&tier1_fixture(), &revenue_fixture(), &expense_fixture(), &tier3_fixture());
    let store = TierStore::open(dir.path());
    assert_eq!(store.load_revenue_detail().unwrap().total("2020"), 1000.0);

    write_json(
        dir.path(),
        "tier2/revenue_detail.json",
        &json!({ "revenue_by_line_item": [ { "2020": 1.0 } ] }),
    );
    assert_eq!(store.load_revenue_detail().unwrap().total("2020"), 1.0);
}
