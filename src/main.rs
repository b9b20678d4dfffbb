use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use env_logger::Env;
use log::info;

use league_ingest::config::{IngestConfig, arg_value};
use league_ingest::export;
use league_ingest::integrity::ValidationContext;
use league_ingest::upload::{UploadPipeline, UploadReport};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = IngestConfig::from_env().apply_args(&args);
    info!(
        "ingesting up to {} most recent uploads from {}",
        config.max_files,
        config.upload_dir.display()
    );

    let pipeline = UploadPipeline::new(config);
    let ctx = ValidationContext::at(Utc::now());
    let report = pipeline.run(&ctx)?;

    print_summary(&report);

    let json = serde_json::to_string_pretty(&report).context("serialize upload report")?;
    match arg_value(&args, "--out").map(PathBuf::from) {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("write report to {}", path.display()))?;
            println!("Report: {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = arg_value(&args, "--xlsx").map(PathBuf::from)
        && let Some(records) = report.data.as_deref()
    {
        let exported = export::write_dataset_xlsx(&path, records, report.integrity.as_ref())?;
        println!("Workbook: {} ({} teams)", path.display(), exported.teams);
    }

    Ok(())
}

fn print_summary(report: &UploadReport) {
    if let Some(err) = report.error.as_deref() {
        eprintln!("Ingest failed: {err}");
    } else {
        eprintln!("Ingest complete");
    }
    let Some(stats) = report.stats.as_ref() else {
        return;
    };
    eprintln!(
        "Files: {} processed, {} skipped",
        stats.files_processed, stats.files_skipped
    );
    eprintln!(
        "Teams: {} ({} complete, {} incomplete)",
        stats.total_teams, stats.complete_teams, stats.incomplete_teams
    );
    eprintln!(
        "Rows dropped: {} rejected, {} invalid, {} outside allowed leagues",
        stats.rows_rejected, stats.rows_invalid, stats.rows_filtered
    );
    if !stats.leagues.is_empty() {
        eprintln!("Leagues: {}", stats.leagues.join(", "));
    }
    if let Some(integrity) = report.integrity.as_ref() {
        eprintln!(
            "Integrity: {:.1}/100, {}/{} valid",
            integrity.overall_score, integrity.valid_items, integrity.total_items
        );
        for rec in &integrity.recommendations {
            eprintln!("  - {rec}");
        }
    }
}
