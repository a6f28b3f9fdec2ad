//! tier-check: command-line access to a tiered data store.
//!
//! Usage:
//!   tier-check validate --root ./sandbox [--raw ledger.xlsx [--sheet NAME]] [--years 2020,2021] [--config validator.json] [--json]
//!   tier-check query    --root ./sandbox --account 440000 [--period 2021.march] [--kind pl]
//!   tier-check search   --root ./sandbox --term salary [--kind balance_sheet]
//!   tier-check route    --question "What are the main revenue sources?"

use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf, process};
use tierdata_core::{
    config::ValidatorConfig,
    query::{route_question, AccountKind, AccountQueryEngine},
    report::ValidationReport,
    validation::CoverageValidator,
};

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    root: String,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        print_usage();
        process::exit(2);
    };

    match command {
        "validate" => {
            let passed = run_validate(&args)?;
            if !passed {
                process::exit(1);
            }
        }
        "query" => run_query(&args)?,
        "search" => run_search(&args)?,
        "route" => {
            let question = arg_value(&args, "--question").context("--question is required")?;
            println!("{}", serde_json::to_string_pretty(&route_question(question))?);
        }
        "-h" | "--help" | "help" => print_usage(),
        other => {
            log::warn!("Unknown command: {other}");
            print_usage();
            process::exit(2);
        }
    }
    Ok(())
}

fn run_validate(args: &[String]) -> Result<bool> {
    let root = root_arg(args)?;
    let mut config = match arg_value(args, "--config") {
        Some(path) => ValidatorConfig::load(path)?,
        None => ValidatorConfig::default(),
    };
    if let Some(sheet) = arg_value(args, "--sheet") {
        config.raw_sheet = Some(sheet.to_string());
    }
    let years: Option<Vec<String>> = arg_value(args, "--years").map(|y| {
        y.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    });

    let mut validator = CoverageValidator::new(&root, config)
        .with_context(|| format!("cannot open tiers under {}", root.display()))?;
    if let Some(raw) = arg_value(args, "--raw") {
        validator = validator.with_raw_source(raw);
    }

    let report = ValidationReport::new(validator.validate_all(years.as_deref()));

    if has_flag(args, "--json") {
        let out = JsonReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            root: root.display().to_string(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{report}");
        if !report.all_passed() {
            println!();
            println!("{}", report.render_failures());
        }
    }
    Ok(report.all_passed())
}

fn run_query(args: &[String]) -> Result<()> {
    let root = root_arg(args)?;
    let account = arg_value(args, "--account").context("--account is required")?;
    let kind: AccountKind = arg_value(args, "--kind").unwrap_or("pl").parse()?;
    let period = arg_value(args, "--period");

    let engine = AccountQueryEngine::open(root);
    let value = engine.query_account(account, period, kind)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn run_search(args: &[String]) -> Result<()> {
    let root = root_arg(args)?;
    let term = arg_value(args, "--term").context("--term is required")?;
    let kind: AccountKind = arg_value(args, "--kind").unwrap_or("pl").parse()?;

    let matches = AccountQueryEngine::open(root).search_accounts(term, kind)?;
    if matches.is_empty() {
        log::info!("no {kind} accounts match '{term}'");
    }
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

fn root_arg(args: &[String]) -> Result<PathBuf> {
    match arg_value(args, "--root") {
        Some(root) => Ok(PathBuf::from(root)),
        None => bail!("--root is required"),
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn print_usage() {
    eprintln!("tier-check — tiered financial data store");
    eprintln!();
    eprintln!("  validate --root DIR [--raw FILE [--sheet NAME]] [--years Y1,Y2] [--config FILE] [--json]");
    eprintln!("  query    --root DIR --account N [--period YYYY|YYYY.month] [--kind pl|balance_sheet]");
    eprintln!("  search   --root DIR --term TEXT [--kind pl|balance_sheet]");
    eprintln!("  route    --question TEXT");
}
