use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, RejectReason};
use crate::header_aliases as key;
use crate::league_map::LeagueTable;
use crate::table_extract::RawRow;

pub const INCOMPLETE_SENTINEL: &str = "incomplete";
pub const MINUTES_PER_MATCH: u32 = 90;
// Upper bound on a single win/draw/loss count; keeps derived totals far from overflow.
const MAX_RESULT_COUNT: u32 = 10_000;

const REQUIRED_FIELDS: [&str; 5] = [key::TEAM, key::COMPETITION, key::WINS, key::DRAWS, key::LOSSES];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub rank: Option<u32>,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    pub team: String,
    pub competition: String,
    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub points_per_match: f64,
    pub minutes: u32,
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
    pub goal_difference: Option<i32>,
    pub clean_sheets: Option<u32>,
    pub clean_sheet_percentage: Option<f64>,
    pub possession: Option<f64>,
    pub penalties: Option<u32>,
    pub is_data_complete: bool,
    pub incomplete_fields: Vec<String>,
    pub source_file: String,
    pub source_row: usize,
}

/// Builds one record from one raw row, mapping its competition to a canonical league.
///
/// Rows missing a required field or naming an unknown league come back as
/// `RowRejected`; rows whose counts cannot be read come back as `SchemaInvalid`.
pub fn parse_row(row: &RawRow, leagues: &LeagueTable) -> Result<TeamRecord, IngestError> {
    for field in REQUIRED_FIELDS {
        if row.get(field).is_none() {
            return Err(IngestError::RowRejected(RejectReason::MissingField(field)));
        }
    }

    let team = row.get(key::TEAM).unwrap_or_default().to_string();
    let raw_competition = row.get(key::COMPETITION).unwrap_or_default();
    let wins = required_count(row, key::WINS)?;
    let draws = required_count(row, key::DRAWS)?;
    let losses = required_count(row, key::LOSSES)?;

    let league = leagues.resolve(&team, raw_competition)?;

    let matches_played = wins + draws + losses;
    let points = wins * 3 + draws;
    let points_per_match = if matches_played == 0 {
        0.0
    } else {
        round2(points as f64 / matches_played as f64)
    };
    log_source_mismatch(row, key::MATCHES_PLAYED, matches_played);
    log_source_mismatch(row, key::POINTS, points);

    let (from_year, to_year) = row
        .get(key::SEASON)
        .and_then(parse_season)
        .or_else(|| parse_season(&row.file_name))
        .map_or((None, None), |(from, to)| (Some(from), Some(to)));

    let rank = row
        .get(key::RANK)
        .and_then(parse_whole)
        .or_else(|| row.get(key::POSITION).and_then(parse_whole));
    let minutes = row
        .get(key::MINUTES)
        .and_then(parse_whole)
        .unwrap_or(matches_played * MINUTES_PER_MATCH);

    let goals_for = row
        .get(key::GOALS_FOR)
        .and_then(parse_whole)
        .or_else(|| row.get(key::GOALS).and_then(parse_whole));
    let goals_against = row.get(key::GOALS_AGAINST).and_then(parse_whole);
    let goal_difference = match (goals_for, goals_against) {
        (Some(gf), Some(ga)) => i32::try_from(i64::from(gf) - i64::from(ga)).ok(),
        _ => row.get(key::GOAL_DIFFERENCE).and_then(parse_signed),
    };

    let mut incomplete = Vec::new();

    let possession = row
        .get(key::POSSESSION)
        .and_then(parse_decimal)
        .filter(|p| (0.0..=100.0).contains(p));
    if possession.is_none() {
        incomplete.push("possession".to_string());
    }

    let penalties = row.get(key::PENALTIES).and_then(parse_whole);
    if penalties.is_none() {
        incomplete.push("penalties".to_string());
    }

    let clean_sheets = row.get(key::CLEAN_SHEETS).and_then(parse_whole);
    let clean_sheet_percentage = row
        .get(key::CLEAN_SHEET_PERCENTAGE)
        .and_then(parse_decimal)
        .or_else(|| {
            let cs = clean_sheets?;
            if matches_played == 0 {
                return Some(0.0);
            }
            Some(round2(cs as f64 / matches_played as f64 * 100.0))
        });
    let tracks_clean_sheets =
        row.has_column(key::CLEAN_SHEETS) || row.has_column(key::CLEAN_SHEET_PERCENTAGE);
    if tracks_clean_sheets && clean_sheet_percentage.is_none() {
        incomplete.push("cleanSheetPercentage".to_string());
    }

    Ok(TeamRecord {
        rank,
        from_year,
        to_year,
        team,
        competition: league.name.to_string(),
        matches_played,
        wins,
        draws,
        losses,
        points,
        points_per_match,
        minutes,
        goals_for,
        goals_against,
        goal_difference,
        clean_sheets,
        clean_sheet_percentage,
        possession,
        penalties,
        is_data_complete: incomplete.is_empty(),
        incomplete_fields: incomplete,
        source_file: row.file_name.clone(),
        source_row: row.index,
    })
}

fn required_count(row: &RawRow, field: &'static str) -> Result<u32, IngestError> {
    let raw = row.get(field).unwrap_or_default();
    parse_whole(raw)
        .filter(|n| *n <= MAX_RESULT_COUNT)
        .ok_or_else(|| IngestError::SchemaInvalid {
            field,
            value: raw.to_string(),
        })
}

fn log_source_mismatch(row: &RawRow, field: &str, derived: u32) {
    let Some(reported) = row.get(field).and_then(parse_whole) else {
        return;
    };
    if reported != derived {
        debug!(
            "{} row {}: source {field}={reported} differs from derived {derived}",
            row.file_name, row.index
        );
    }
}

pub fn is_sentinel(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(INCOMPLETE_SENTINEL)
}

/// Non-negative whole number; tolerates thousands separators and a `.0` suffix.
pub fn parse_whole(raw: &str) -> Option<u32> {
    let cleaned = raw.trim().replace([',', '_', ' '], "");
    if cleaned.is_empty() || is_sentinel(&cleaned) {
        return None;
    }
    if let Ok(n) = cleaned.parse::<u32>() {
        return Some(n);
    }
    let f = cleaned.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

pub fn parse_signed(raw: &str) -> Option<i32> {
    let cleaned = raw.trim().replace('\u{2212}', "-");
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    cleaned.parse::<i32>().ok()
}

/// Decimal value with an optional `%` suffix; a lone comma is read as the decimal mark.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_sentinel(trimmed) {
        return None;
    }
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    let cleaned = if trimmed.contains('.') {
        trimmed.replace(',', "")
    } else {
        trimmed.replace(',', ".")
    };
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads `2023-2024`, `2023/24`, `season_2023_24` or a lone `2023` (a calendar-year season).
pub fn parse_season(raw: &str) -> Option<(i32, i32)> {
    let mut runs = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|s| !s.is_empty());
    let from = loop {
        let run = runs.next()?;
        if run.len() == 4
            && let Ok(year) = run.parse::<i32>()
            && (1900..=2100).contains(&year)
        {
            break year;
        }
    };
    let to = match runs.next() {
        Some(run) if run.len() == 4 => run
            .parse::<i32>()
            .ok()
            .filter(|y| *y == from || *y == from + 1),
        Some(run) if run.len() == 2 => run.parse::<i32>().ok().and_then(|yy| {
            let century = from - from.rem_euclid(100);
            let to = if yy < from.rem_euclid(100) {
                century + 100 + yy
            } else {
                century + yy
            };
            (to == from || to == from + 1).then_some(to)
        }),
        _ => None,
    };
    Some((from, to.unwrap_or(from)))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
