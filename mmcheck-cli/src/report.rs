//! Console rendering for check reports.
//!
//! One block per check as it completes, then an aggregate summary.
//! Unsupported capabilities are phrased as inconclusive rather than
//! broken, but still count against a fully passing run.

use mmcheck::check::{CheckOutcome, CheckReport, Summary};
use std::path::Path;

/// Print the header line for a check about to run.
pub fn print_check_header(index: usize, total: usize, title: &str) {
    println!("=== Check {index}/{total}: {title} ===");
}

/// Print the outcome of one completed check.
pub fn print_report(report: &CheckReport) {
    match &report.outcome {
        CheckOutcome::Passed { detail } => {
            println!("  ok: {detail}");
        }
        CheckOutcome::Declined { message } => {
            println!("  declared failure: {message}");
        }
        CheckOutcome::Unsupported { message } => {
            println!("  inconclusive: {message}");
            println!("  (the model may not support this capability)");
        }
        CheckOutcome::Failed { error } => {
            println!("  error: {error}");
        }
    }
    println!();
}

/// Print the aggregate summary.
pub fn print_summary(summary: &Summary, artifact: &Path) {
    println!("Summary:");
    for report in summary.reports() {
        println!(
            "  {:<30} {}",
            report.capability.title(),
            report.outcome.label()
        );
    }
    println!();

    let passed = summary.passed();
    let total = summary.total();
    if summary.all_passed() {
        println!("All checks passed ({passed}/{total}).");
    } else if summary.unsupported() > 0 {
        println!(
            "{passed}/{total} checks passed, {} inconclusive; some capabilities need further verification.",
            summary.unsupported()
        );
    } else {
        println!("{passed}/{total} checks passed; some capabilities need further verification.");
    }

    let speech_passed = summary
        .reports()
        .iter()
        .any(|r| r.capability == mmcheck::check::Capability::Speech && r.outcome.is_passed());
    if speech_passed {
        println!();
        println!("Synthesized audio saved to: {}", artifact.display());
    }
}
