//! fintel-runner: headless detection runner for batches of transactions.
//!
//! Usage:
//!   fintel-runner --input transactions.json
//!   fintel-runner --input transactions.json --entity acct-1 --json
//!   fintel-runner --input transactions.json --draft-sar --created-by analyst.kim

use anyhow::{Context, Result};
use fintel_core::orchestrator::{DetectionEngine, DetectionOutcome};
use fintel_core::report_generator::ReportGenerator;
use fintel_core::types::Transaction;
use std::env;
use std::fs;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = str_arg(&args, "--input")
        .context("--input <transactions.json> is required")?;
    let entity = str_arg(&args, "--entity");
    let as_json = args.iter().any(|a| a == "--json");
    let draft_sar = args.iter().any(|a| a == "--draft-sar");
    let created_by =
        str_arg(&args, "--created-by").unwrap_or_else(|| "fintel-runner".to_string());

    let raw = fs::read_to_string(&input).with_context(|| format!("reading {input}"))?;
    let transactions: Vec<Transaction> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {input}"))?;
    log::info!("loaded {} transactions from {input}", transactions.len());

    let engine = DetectionEngine::with_defaults();
    let outcome = match entity.as_deref() {
        Some(id) => engine.detect_for_entity(id, &transactions)?,
        None => engine.detect_all(&transactions)?,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome.matches)?);
    } else {
        print_summary(&outcome, transactions.len());
    }

    if draft_sar {
        if outcome.matches.is_empty() {
            log::warn!("no matches; nothing to draft");
        } else {
            let report = ReportGenerator::default().create_from_patterns(
                &outcome.matches,
                &[],
                &transactions,
                &created_by,
            )?;
            println!();
            println!("{}", report.to_export_json()?);
        }
    }

    Ok(())
}

fn print_summary(outcome: &DetectionOutcome, transaction_count: usize) {
    let summary = outcome.summary();

    println!("=== DETECTION SUMMARY ===");
    println!("  transactions:  {transaction_count}");
    println!("  matches:       {}", summary.total_matches);
    println!("  failures:      {}", summary.failed_detectors);

    if !summary.by_pattern.is_empty() {
        println!();
        println!("=== BY PATTERN ===");
        for (pattern, count) in &summary.by_pattern {
            println!("  {pattern}: {count}");
        }
    }
    if !summary.by_severity.is_empty() {
        println!();
        println!("=== BY SEVERITY ===");
        for (severity, count) in &summary.by_severity {
            println!("  {severity}: {count}");
        }
    }

    if !outcome.matches.is_empty() {
        println!();
        println!("=== MATCHES ===");
        for m in &outcome.matches {
            println!(
                "  [{}/{}] {} (confidence {:.2}, total {})",
                m.pattern, m.severity, m.description, m.confidence, m.total_amount
            );
        }
    }
    for failure in &outcome.failures {
        println!("  FAILED {}: {}", failure.detector, failure.error);
    }
}

fn str_arg(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}
