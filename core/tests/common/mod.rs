//! Synthetic tier stores for integration tests.
//!
//! The default fixture is fully consistent: every reconciliation check
//! passes. Tests mutate the JSON values before writing to break exactly
//! the invariant they care about.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::{fs, path::Path};
use tempfile::TempDir;

pub fn tier1_fixture() -> Value {
    json!({
        "annual_summary": {
            "2020":    { "revenue": 1000.0, "ebit": 150.0, "depreciation_amortization": -50.0, "ebitda": 200.0,
                         "ebitda_margin_pct": 20.0, "nwc_pct_revenue": 12.5 },
            "2021":    { "revenue": 1200.0, "ebit": 200.0, "depreciation_amortization": -60.0, "ebitda": 260.0 },
            "2022":    { "revenue": 1500.0, "ebit": 300.0, "depreciation_amortization": 70.0,  "ebitda": 370.0 },
            "2023_h1": { "revenue": 800.0,  "ebit": 100.0, "depreciation_amortization": -20.0, "ebitda": 120.0 }
        },
        "key_findings": { "revenue_cagr_pct": 22.5 },
        "data_available": { "tier2": ["revenue_detail.json", "expense_detail.json"] }
    })
}

pub fn revenue_fixture() -> Value {
    json!({
        "revenue_by_line_item": [
            { "line_item": "Products", "2020": 600.0, "2021": 700.0, "2022": 900.0, "accounts": ["440000"] },
            { "line_item": "Services", "2020": 400.0, "2021": 500.0, "2022": 600.0, "accounts": ["441000"] }
        ]
    })
}

pub fn expense_fixture() -> Value {
    json!({
        "normalization_candidates": [
            { "account": "602300", "flag": "owner_compensation" },
            { "account": 630000,   "flag": "related_party_rent" }
        ]
    })
}

pub fn tier3_fixture() -> Value {
    json!({
        "pl_accounts": [
            { "account": "440000", "description": "Revenue products 19%",
              "totals": { "2020": 600.0, "2021": 700.0, "2022": 900.0 },
              "monthly_data": { "2021": { "january": 50.0, "march": 60.0 } } },
            { "account": "441000", "description": "Revenue services",
              "totals": { "2020": 400.0, "2021": 500.0, "2022": 600.0 } },
            { "account": "473600", "description": "Commission received",
              "totals": { "2020": 25.0, "2021": 30.0, "2022": 35.0 },
              "monthly_data": { "2021": { "march": 0.0 } } },
            { "account": "602000", "description": "Salaries",
              "totals": { "2020": -300.0, "2021": -320.0, "2022": -350.0 },
              "monthly_data": { "2021": { "march": -25.0 } } },
            { "account": "602300", "description": "Profit-sharing salary",
              "totals": { "2020": -40.0, "2021": -45.0 } },
            { "account": "620000", "description": "SALARY accruals",
              "totals": { "2022": -12.0 } },
            { "account": "630000", "description": "Rent",
              "totals": { "2020": -90.0, "2021": -90.0, "2022": -95.0 } }
        ],
        "balance_sheet_accounts": [
            { "account": "120000", "description": "Trade receivables",
              "totals": { "2022": 210.0 } },
            { "account": "160000", "description": "Bank balance",
              "totals": { "2022": 95.0 } }
        ],
        "extraction_metadata": { "total_accounts": 7, "source": "ledger.xlsx" }
    })
}

pub fn write_json(root: &Path, rel: &str, value: &Value) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("fixture path has a parent")).expect("create tier dir");
    fs::write(&path, serde_json::to_string_pretty(value).expect("serialize fixture"))
        .expect("write fixture");
}

/// Write all four validator inputs into a fresh temp directory.
pub fn build_store(tier1: &Value, revenue: &Value, expense: &Value, tier3: &Value) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_json(dir.path(), "tier1/summary.json", tier1);
    write_json(dir.path(), "tier2/revenue_detail.json", revenue);
    write_json(dir.path(), "tier2/expense_detail.json", expense);
    write_json(dir.path(), "tier3/raw_accounts_database.json", tier3);
    dir
}

pub fn consistent_store() -> TempDir {
    build_store(&tier1_fixture(), &revenue_fixture(), &expense_fixture(), &tier3_fixture())
}

/// Raw export matching `tier3_fixture()` row for row.
pub fn raw_csv_fixture() -> String {
    let mut out = String::from("Konto,Beschriftung,2020,2021,2022\n");
    for (account, desc) in [
        ("440000", "Revenue products 19%"),
        ("441000", "Revenue services"),
        ("473600", "Commission received"),
        ("602000", "Salaries"),
        ("602300", "Profit-sharing salary"),
        ("620000", "SALARY accruals"),
        ("630000", "Rent"),
    ] {
        out.push_str(&format!("{account},{desc},0,0,0\n"));
    }
    out
}
