use std::path::PathBuf;

use crate::integrity::DEFAULT_RECOMMENDATION_LIMIT;
use crate::league_map::LeagueAllowList;

pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_FILES: usize = 3;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub upload_dir: PathBuf,
    /// How many of the most recently modified uploads to process.
    pub max_files: usize,
    pub allowed_leagues: LeagueAllowList,
    pub recommendation_limit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_files: DEFAULT_MAX_FILES,
            allowed_leagues: LeagueAllowList::default_leagues(),
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }
}

impl IngestConfig {
    /// Reads `INGEST_*` variables; call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(dir) = env_string("INGEST_UPLOAD_DIR") {
            cfg.upload_dir = PathBuf::from(dir);
        }
        if let Some(n) = env_string("INGEST_MAX_FILES").and_then(|v| v.parse::<usize>().ok()) {
            cfg.max_files = n.max(1);
        }
        if let Some(raw) = env_string("INGEST_ALLOWED_LEAGUES") {
            let names = parse_list(&raw);
            if !names.is_empty() {
                cfg.allowed_leagues = LeagueAllowList::new(names);
            }
        }
        if let Some(n) = env_string("INGEST_RECOMMENDATION_LIMIT").and_then(|v| v.parse::<usize>().ok())
        {
            cfg.recommendation_limit = n;
        }
        cfg
    }

    /// Applies `--dir`, `--max-files` and `--leagues` command-line overrides.
    pub fn apply_args(mut self, args: &[String]) -> Self {
        if let Some(dir) = arg_value(args, "--dir") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(n) = arg_value(args, "--max-files").and_then(|v| v.parse::<usize>().ok()) {
            self.max_files = n.max(1);
        }
        if let Some(raw) = arg_value(args, "--leagues") {
            let names = parse_list(&raw);
            if !names.is_empty() {
                self.allowed_leagues = LeagueAllowList::new(names);
            }
        }
        self
    }
}

/// Value of `--name=value` or `--name value`; blank values are ignored.
pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
