use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::Confirm;

use crate::cli::{open_store, resolve_client};
use crate::error::Result;
use crate::fmt::{money, thousands};
use crate::import::{ImportBatch, ImportConfig, ImportOrchestrator, ImportTarget, ScanOutcome, ScanReport};
use crate::settings::load_settings;

fn print_report(report: &ScanReport) {
    let mut table = Table::new();
    table.set_header(vec!["File", "Period", "Status"]);
    for entry in &report.entries {
        let (period, status) = match &entry.outcome {
            ScanOutcome::Resolved(p) => (p.to_string(), "ok".green().to_string()),
            ScanOutcome::Empty => ("-".to_string(), "empty, skipped".yellow().to_string()),
            ScanOutcome::Failed(msg) => ("-".to_string(), msg.red().to_string()),
        };
        table.add_row(vec![Cell::new(&entry.filename), Cell::new(period), Cell::new(status)]);
    }
    println!("{table}");
    println!("{} of {} file(s) ready to import", report.importable(), report.entries.len());

    if !report.has_collisions() {
        return;
    }
    for collision in &report.collisions {
        let winner = collision.files.last().map(String::as_str).unwrap_or_default();
        println!(
            "{} {} is claimed by {}; only {} will be imported.",
            "Warning:".yellow().bold(),
            collision.period,
            collision.files.join(", "),
            winner
        );
    }
}

pub fn run(files: &[String], client: Option<String>, year: i32, yes: bool) -> Result<()> {
    let mut store = open_store()?;
    let client = resolve_client(&store, client)?;
    let settings = load_settings();

    let mut orchestrator = ImportOrchestrator::new(
        ImportTarget {
            client_id: client.id,
            year,
        },
        ImportConfig::from(&settings),
    );
    let report = orchestrator.scan(ImportBatch::from_paths(files)?)?;
    print_report(report);

    let months = report.assignment().len();
    if months == 0 {
        println!("Nothing to import.");
        return orchestrator.cancel();
    }

    let prompt = format!(
        "Replace {months} period(s) of {} {year} with these files?",
        client.name
    );
    let proceed = yes
        || Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false);
    if !proceed {
        orchestrator.cancel()?;
        println!("Import cancelled. Nothing was written.");
        return Ok(());
    }

    let summary = orchestrator.confirm(&mut store)?;
    let periods: Vec<String> = summary.periods.iter().map(|p| p.to_string()).collect();
    println!(
        "{} records imported from {} file(s) ({})",
        thousands(summary.imported as i64),
        summary.files_imported,
        periods.join(", ")
    );
    println!("Total value: {}", money(summary.total_value));
    if summary.new_products > 0 {
        println!("{} new product(s) registered", summary.new_products);
    }
    for file in &summary.superseded_files {
        println!("{} {file} was replaced by a later file", "Skipped:".yellow());
    }
    for failure in &summary.failed_files {
        println!("{} {}: {}", "Failed:".red(), failure.filename, failure.message);
    }
    Ok(())
}
