//! Run a single check cycle.

use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::monitor::{CycleReport, Monitor, ProductOutcome};
use crate::notify::DeliveryOutcome;
use anyhow::Result;

pub async fn run(config: &Config) -> Result<()> {
    let monitor = Monitor::from_config(config)?;
    let report = monitor.run_cycle().await?;
    print_report(&report, &config.currency);
    Ok(())
}

/// Print a cycle summary in the current output mode.
pub fn print_report(report: &CycleReport, currency: &str) {
    if output::is_json() {
        output::print_json(report);
        return;
    }
    if output::is_quiet() {
        return;
    }

    let s = Styled::new();
    for entry in &report.products {
        let label = entry.product.label();
        match &entry.outcome {
            ProductOutcome::Checked {
                price,
                previous,
                decision,
                delivery,
            } => {
                let change = match previous {
                    Some(prev) if decision.dropped => format!(" (down from {currency}{prev})"),
                    Some(prev) => format!(" (previous {currency}{prev})"),
                    None => " (first observation)".to_string(),
                };
                println!("  {} {label}: {currency}{price}{change}", s.ok_sym());
                match delivery {
                    Some(DeliveryOutcome::Delivered) => println!("      alert sent"),
                    Some(DeliveryOutcome::Skipped(reason)) => {
                        println!("      alert skipped: {reason}")
                    }
                    Some(DeliveryOutcome::Failed(reason)) => {
                        println!("      {} alert failed: {reason}", s.warn_sym())
                    }
                    None => {}
                }
            }
            ProductOutcome::Unsupported { reason } => {
                println!("  {} {label}: {reason}", s.warn_sym())
            }
            ProductOutcome::ExtractionFailed => {
                println!("  {} {label}: could not retrieve price", s.warn_sym())
            }
            ProductOutcome::EnvironmentFailure { reason } => {
                println!("  {} {label}: {reason}", s.err_sym())
            }
            ProductOutcome::PersistenceFailure { reason } => {
                println!("  {} {label}: {reason}", s.err_sym())
            }
        }
    }

    println!(
        "\n  {} checked, {} skipped, {} alert(s)",
        report.checked(),
        report.skipped(),
        report.alerts()
    );
    if report.environment_failures() > 0 {
        println!(
            "  {} browser unavailable for {} product(s); run `pricewatch doctor`",
            s.err_sym(),
            report.environment_failures()
        );
    }
}
