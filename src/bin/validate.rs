use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use env_logger::Env;
use log::info;

use league_ingest::config::{IngestConfig, arg_value};
use league_ingest::integrity::{self, EntityKind, ValidationContext};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let kind = arg_value(&args, "--kind")
        .unwrap_or_else(|| "team".to_string())
        .parse::<EntityKind>()?;
    let input = parse_input_arg(&args)
        .ok_or_else(|| anyhow!("usage: validate --kind team|transfer|player FILE.json"))?;

    let raw = fs::read_to_string(&input)
        .with_context(|| format!("read validation input {}", input.display()))?;
    let mut ctx = ValidationContext::at(Utc::now());
    ctx.recommendation_limit = IngestConfig::from_env().recommendation_limit;

    let result = integrity::validate_json(kind, &raw, &ctx)?;
    info!(
        "{:?} batch: {}/{} valid, score {:.1}",
        kind, result.valid_items, result.total_items, result.overall_score
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("serialize validation result")?
    );
    Ok(())
}

fn parse_input_arg(args: &[String]) -> Option<PathBuf> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--kind" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}
