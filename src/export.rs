use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::integrity::BatchIntegrityResult;
use crate::team_record::TeamRecord;

pub struct ExportReport {
    pub teams: usize,
    pub integrity_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

fn num<T: Into<f64>>(value: T) -> Cell {
    Cell::Number(value.into())
}

fn opt_num<T: Into<f64>>(value: Option<T>) -> Cell {
    value.map_or(Cell::Blank, num)
}

fn yes_no(flag: bool) -> Cell {
    Cell::from(if flag { "yes" } else { "no" })
}

const TEAM_HEADERS: &[&str] = &[
    "Rank",
    "From Year",
    "To Year",
    "Team",
    "Competition",
    "Matches Played",
    "Wins",
    "Draws",
    "Losses",
    "Points",
    "Points/Match",
    "Minutes",
    "Goals For",
    "Goals Against",
    "Goal Difference",
    "Clean Sheets",
    "Clean Sheet %",
    "Possession",
    "Penalties",
    "Complete",
    "Incomplete Fields",
    "Source File",
    "Source Row",
];

/// Writes the emitted records (sheet "Teams") and, when given, their integrity scores.
pub fn write_dataset_xlsx(
    path: &Path,
    records: &[TeamRecord],
    integrity: Option<&BatchIntegrityResult>,
) -> Result<ExportReport> {
    let mut team_rows: Vec<Vec<Cell>> = vec![TEAM_HEADERS.iter().map(|h| Cell::from(*h)).collect()];
    for r in records {
        team_rows.push(vec![
            opt_num(r.rank),
            opt_num(r.from_year),
            opt_num(r.to_year),
            r.team.as_str().into(),
            r.competition.as_str().into(),
            num(r.matches_played),
            num(r.wins),
            num(r.draws),
            num(r.losses),
            num(r.points),
            num(r.points_per_match),
            num(r.minutes),
            opt_num(r.goals_for),
            opt_num(r.goals_against),
            opt_num(r.goal_difference),
            opt_num(r.clean_sheets),
            opt_num(r.clean_sheet_percentage),
            opt_num(r.possession),
            opt_num(r.penalties),
            yes_no(r.is_data_complete),
            r.incomplete_fields.join(", ").into(),
            r.source_file.as_str().into(),
            u32::try_from(r.source_row).map_or(Cell::Blank, num),
        ]);
    }

    let mut integrity_rows: Vec<Vec<Cell>> = vec![vec![
        "Team".into(),
        "Competition".into(),
        "Score".into(),
        "Valid".into(),
        "Issues".into(),
        "Recommendations".into(),
    ]];
    if let Some(batch) = integrity {
        for (record, report) in records.iter().zip(batch.reports.iter()) {
            let issues = report
                .issues
                .iter()
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            integrity_rows.push(vec![
                record.team.as_str().into(),
                record.competition.as_str().into(),
                num(report.score),
                yes_no(report.is_valid),
                issues.into(),
                report.recommendations.join("; ").into(),
            ]);
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Teams")?;
        write_rows(sheet, &team_rows)?;
    }
    if integrity.is_some() {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Integrity")?;
        write_rows(sheet, &integrity_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        teams: records.len(),
        integrity_rows: integrity_rows.len().saturating_sub(1),
    })
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match cell {
                Cell::Text(value) => worksheet.write_string(r, c, value).map(|_| ()),
                Cell::Number(value) => worksheet.write_number(r, c, *value).map(|_| ()),
                Cell::Blank => Ok(()),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
