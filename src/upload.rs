use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::header_aliases::HeaderAliases;
use crate::integrity::{BatchIntegrityResult, ValidationContext, score_team_records};
use crate::league_map::{LeagueTable, filter_allowed};
use crate::table_extract::{SUPPORTED_EXTENSIONS, extract_file};
use crate::team_record::{TeamRecord, parse_row};

pub const NO_FILES_ERROR: &str = "no files found";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub total_teams: usize,
    pub complete_teams: usize,
    pub incomplete_teams: usize,
    pub leagues: Vec<String>,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub rows_rejected: usize,
    pub rows_invalid: usize,
    pub rows_filtered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<TeamRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<UploadStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<BatchIntegrityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadReport {
    pub fn failure(error: impl Into<String>, stats: Option<UploadStats>) -> Self {
        Self {
            success: false,
            data: None,
            stats,
            integrity: None,
            error: Some(error.into()),
        }
    }
}

/// Records parsed from one file plus the rows it dropped.
#[derive(Debug, Clone, Default)]
pub struct FileOutcome {
    pub file_name: String,
    pub records: Vec<TeamRecord>,
    pub rows_rejected: usize,
    pub rows_invalid: usize,
}

pub struct UploadPipeline {
    config: IngestConfig,
    aliases: HeaderAliases,
    leagues: LeagueTable,
}

impl UploadPipeline {
    pub fn new(config: IngestConfig) -> Self {
        Self::with_tables(config, HeaderAliases::builtin(), LeagueTable::builtin())
    }

    pub fn with_tables(config: IngestConfig, aliases: HeaderAliases, leagues: LeagueTable) -> Self {
        Self {
            config,
            aliases,
            leagues,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Processes the most recent uploads in the configured directory.
    ///
    /// Only a directory that cannot be listed is an `Err`; everything else ends up in the report.
    pub fn run(&self, ctx: &ValidationContext) -> Result<UploadReport> {
        let files = recent_uploads(&self.config.upload_dir, self.config.max_files)?;
        if files.is_empty() {
            info!("no uploads in {}", self.config.upload_dir.display());
            return Ok(UploadReport::failure(NO_FILES_ERROR, None));
        }
        Ok(self.process_files(&files, ctx))
    }

    pub fn process_files(&self, files: &[PathBuf], ctx: &ValidationContext) -> UploadReport {
        if files.is_empty() {
            return UploadReport::failure(NO_FILES_ERROR, None);
        }

        let mut stats = UploadStats::default();
        let mut records = Vec::new();
        for path in files {
            match self.process_file(path) {
                Ok(outcome) => {
                    info!(
                        "{}: {} records ({} rejected, {} invalid)",
                        outcome.file_name,
                        outcome.records.len(),
                        outcome.rows_rejected,
                        outcome.rows_invalid
                    );
                    stats.files_processed += 1;
                    stats.rows_rejected += outcome.rows_rejected;
                    stats.rows_invalid += outcome.rows_invalid;
                    records.extend(outcome.records);
                }
                Err(err) => {
                    warn!("skipping {}: {err}", path.display());
                    stats.files_skipped += 1;
                }
            }
        }

        let (records, filtered) = filter_allowed(records, &self.config.allowed_leagues);
        stats.rows_filtered = filtered;
        fill_team_stats(&mut stats, &records);

        if records.is_empty() {
            let err = IngestError::BatchEmpty { files: files.len() };
            warn!("{err}");
            return UploadReport::failure(err.to_string(), Some(stats));
        }

        let mut scoring_ctx = ctx.clone();
        scoring_ctx.recommendation_limit = self.config.recommendation_limit;
        let integrity = score_team_records(&records, &scoring_ctx);

        UploadReport {
            success: true,
            data: Some(records),
            stats: Some(stats),
            integrity: Some(integrity),
            error: None,
        }
    }

    pub fn process_file(&self, path: &Path) -> Result<FileOutcome, IngestError> {
        let extraction = extract_file(path, &self.aliases, &self.leagues)?;
        let mut outcome = FileOutcome {
            file_name: extraction.file_name.clone(),
            ..FileOutcome::default()
        };

        for row in extraction.rows() {
            match parse_row(&row, &self.leagues) {
                Ok(record) => outcome.records.push(record),
                Err(IngestError::RowRejected(reason)) => {
                    debug!("{} row {}: dropped, {reason}", row.file_name, row.index);
                    outcome.rows_rejected += 1;
                }
                Err(err) => {
                    debug!("{} row {}: dropped, {err}", row.file_name, row.index);
                    outcome.rows_invalid += 1;
                }
            }
        }
        Ok(outcome)
    }
}

fn fill_team_stats(stats: &mut UploadStats, records: &[TeamRecord]) {
    stats.total_teams = records.len();
    stats.complete_teams = records.iter().filter(|r| r.is_data_complete).count();
    stats.incomplete_teams = stats.total_teams - stats.complete_teams;
    stats.leagues = records
        .iter()
        .map(|r| r.competition.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
}

/// Supported files in `dir`, newest first (ties by name), at most `limit`.
pub fn recent_uploads(dir: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read upload dir {}", dir.display()))?;

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        if !is_supported_upload(&path) {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, path));
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(candidates
        .into_iter()
        .take(limit)
        .map(|(_, path)| path)
        .collect())
}

fn is_supported_upload(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}
