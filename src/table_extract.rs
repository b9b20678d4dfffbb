use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use csv::{ReaderBuilder, Trim};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::encoding::decode_bytes;
use crate::error::IngestError;
use crate::header_aliases::{self as key, HeaderAliases, HeaderMap};
use crate::league_map::LeagueTable;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["xls", "xlsx", "csv", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Spreadsheet,
    Csv,
    Text,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xls" | "xlsx" | "xlsm" | "ods" => Some(FileFormat::Spreadsheet),
            "csv" => Some(FileFormat::Csv),
            "txt" => Some(FileFormat::Text),
            _ => None,
        }
    }
}

/// One source row keyed by canonical field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub file_name: String,
    /// 1-based sheet row, CSV line or text line.
    pub index: usize,
    fields: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(file_name: impl Into<String>, index: usize) -> Self {
        Self {
            file_name: file_name.into(),
            index,
            fields: BTreeMap::new(),
        }
    }

    /// First non-empty value wins when two columns share a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let slot = self.fields.entry(key.into()).or_default();
        if slot.trim().is_empty() {
            *slot = value;
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    /// Trimmed value, `None` when the column is absent or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

/// Extracted content of one file; `rows()` can be iterated any number of times.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub file_name: String,
    pub format: FileFormat,
    body: Body,
}

#[derive(Debug, Clone)]
enum Body {
    Table {
        header: HeaderMap,
        rows: Vec<(usize, Vec<String>)>,
    },
    Text {
        content: String,
        competition: Option<String>,
        table_like: bool,
    },
}

impl Extraction {
    pub fn rows(&self) -> Box<dyn Iterator<Item = RawRow> + '_> {
        match &self.body {
            Body::Table { header, rows } => Box::new(rows.iter().map(move |(index, cells)| {
                let mut row = RawRow::new(self.file_name.as_str(), *index);
                for (col, cell) in cells.iter().enumerate() {
                    if let Some(key) = header.key(col) {
                        row.insert(key, cell.as_str());
                    }
                }
                row
            })),
            Body::Text {
                content,
                competition,
                table_like,
            } => {
                if !*table_like {
                    return Box::new(std::iter::empty());
                }
                Box::new(
                    content
                        .lines()
                        .enumerate()
                        .filter_map(move |(idx, line)| {
                            let mut row = match_line(line, &self.file_name, idx + 1)?;
                            if let Some(competition) = competition {
                                row.insert(key::COMPETITION, competition.as_str());
                            }
                            Some(row)
                        }),
                )
            }
        }
    }

    pub fn header(&self) -> Option<&HeaderMap> {
        match &self.body {
            Body::Table { header, .. } => Some(header),
            Body::Text { .. } => None,
        }
    }

    pub fn is_table_like(&self) -> bool {
        match &self.body {
            Body::Table { .. } => true,
            Body::Text { table_like, .. } => *table_like,
        }
    }
}

pub fn extract_file(
    path: &Path,
    aliases: &HeaderAliases,
    leagues: &LeagueTable,
) -> Result<Extraction, IngestError> {
    let format =
        FileFormat::from_path(path).ok_or_else(|| IngestError::UnsupportedFormat(path.into()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if format == FileFormat::Spreadsheet {
        return extract_spreadsheet(path, file_name, aliases);
    }

    let bytes = fs::read(path).map_err(|err| IngestError::unreadable(path, err))?;
    let decoded = decode_bytes(path, &bytes)?;
    debug!(
        "{file_name}: decoded as {} via {:?}",
        decoded.encoding_name, decoded.candidate
    );
    Ok(match format {
        FileFormat::Csv => extract_csv(file_name, &decoded.text, aliases),
        _ => extract_text(file_name, decoded.text, leagues),
    })
}

fn extract_spreadsheet(
    path: &Path,
    file_name: String,
    aliases: &HeaderAliases,
) -> Result<Extraction, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|err| IngestError::unreadable(path, err))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::unreadable(path, "workbook has no sheets"))?
        .map_err(|err| IngestError::unreadable(path, err))?;
    let first_row = range.start().map_or(0, |(row, _)| row as usize);

    let mut sheet_rows = range.rows().enumerate();
    let header_cells = sheet_rows
        .next()
        .map(|(_, cells)| cells.iter().map(cell_text).collect::<Vec<_>>())
        .unwrap_or_default();
    let header = aliases.header_map(&header_cells);

    let rows = sheet_rows
        .map(|(offset, cells)| {
            (
                first_row + offset + 1,
                cells.iter().map(cell_text).collect::<Vec<_>>(),
            )
        })
        .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(Extraction {
        file_name,
        format: FileFormat::Spreadsheet,
        body: Body::Table { header, rows },
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        other => other.to_string().trim().to_string(),
    }
}

pub fn extract_csv(file_name: String, text: &str, aliases: &HeaderAliases) -> Extraction {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut header: Option<HeaderMap> = None;
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!("{file_name}: skipping malformed csv record {}: {err}", idx + 1);
                continue;
            }
        };
        let cells = record.iter().map(str::to_string).collect::<Vec<_>>();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        if header.is_none() {
            header = Some(aliases.header_map(&cells));
            continue;
        }
        let line = record
            .position()
            .map_or(idx + 1, |pos| pos.line() as usize);
        rows.push((line, cells));
    }

    Extraction {
        file_name,
        format: FileFormat::Csv,
        body: Body::Table {
            header: header.unwrap_or_else(|| aliases.header_map(&[])),
            rows,
        },
    }
}

pub fn extract_text(file_name: String, content: String, leagues: &LeagueTable) -> Extraction {
    let league = leagues.find_in_text(&content);
    let table_like = league.is_some()
        || TABLE_WORD.is_match(&content)
        || content.lines().any(|line| TABLE_ROW_SHAPE.is_match(line));
    if !table_like {
        debug!("{file_name}: text does not look like a league table");
    }
    Extraction {
        file_name,
        format: FileFormat::Text,
        body: Body::Text {
            competition: league.map(|l| l.name.to_string()),
            content,
            table_like,
        },
    }
}

static TABLE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bTable\b").expect("valid regex"));

static TABLE_ROW_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+[.)]?\s+\S.*?(?:\s+[+\-\x{2212}]?\d+){4,}").expect("valid regex")
});

// A team name never ends on a bare number, so surplus numeric columns cannot shift into it.
static VERBOSE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(\d{1,3})[.)]?\s+(.*?[^\d\s+\-\x{2212}])\s+(\d{1,3})\s+(\d{1,3})\s+(\d{1,3})\s+(\d{1,3})\s+(\d{1,3})\s+([+\-\x{2212}]?\d{1,3})\s+(\d{1,3}(?:[.,]\d+)?)\s*%?\s*$",
    )
    .expect("valid regex")
});

static TERSE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,3})[.)]?\s+(.*?[^\d\s+\-\x{2212}])\s+(\d{1,3})\s+(\d{1,3})\s+(\d{1,3})\s+(\d{1,3})\s+(\d{1,3})\s*$")
        .expect("valid regex")
});

/// A free-text row grammar: a pattern whose capture groups map, in order, to canonical keys.
pub struct LineGrammar {
    pub name: &'static str,
    pattern: &'static Lazy<Regex>,
    keys: &'static [&'static str],
}

impl LineGrammar {
    pub fn parse(&self, line: &str, file_name: &str, index: usize) -> Option<RawRow> {
        let caps = self.pattern.captures(line)?;
        let mut row = RawRow::new(file_name, index);
        for (group, key) in self.keys.iter().enumerate() {
            let value = caps.get(group + 1)?.as_str().trim();
            row.insert(*key, value);
        }
        Some(row)
    }
}

/// Grammars in priority order; the first match wins.
pub static LINE_GRAMMARS: [LineGrammar; 2] = [
    LineGrammar {
        name: "verbose",
        pattern: &VERBOSE_ROW,
        keys: &[
            key::RANK,
            key::TEAM,
            key::MATCHES_PLAYED,
            key::WINS,
            key::DRAWS,
            key::LOSSES,
            key::POINTS,
            key::GOAL_DIFFERENCE,
            key::POSSESSION,
        ],
    },
    LineGrammar {
        name: "terse",
        pattern: &TERSE_ROW,
        keys: &[
            key::RANK,
            key::TEAM,
            key::MATCHES_PLAYED,
            key::WINS,
            key::DRAWS,
            key::LOSSES,
            key::POINTS,
        ],
    },
];

pub fn match_line(line: &str, file_name: &str, index: usize) -> Option<RawRow> {
    LINE_GRAMMARS
        .iter()
        .find_map(|grammar| grammar.parse(line, file_name, index))
}
