use std::collections::HashMap;

// Canonical keys understood by the row parser.
pub const RANK: &str = "rank";
pub const POSITION: &str = "position";
pub const SEASON: &str = "season";
pub const TEAM: &str = "team";
pub const COMPETITION: &str = "competition";
pub const MATCHES_PLAYED: &str = "matches_played";
pub const APPEARANCES: &str = "appearances";
pub const WINS: &str = "wins";
pub const DRAWS: &str = "draws";
pub const LOSSES: &str = "losses";
pub const POINTS: &str = "points";
pub const MINUTES: &str = "minutes";
pub const GOALS: &str = "goals";
pub const GOALS_FOR: &str = "goals_for";
pub const GOALS_AGAINST: &str = "goals_against";
pub const GOAL_DIFFERENCE: &str = "goal_difference";
pub const CLEAN_SHEETS: &str = "clean_sheets";
pub const CLEAN_SHEET_PERCENTAGE: &str = "clean_sheet_percentage";
pub const POSSESSION: &str = "possession";
pub const PENALTIES: &str = "penalties";

const ALIASES: &[(&str, &str)] = &[
    ("Rk", RANK),
    ("#", RANK),
    ("Pos", POSITION),
    ("Season", SEASON),
    ("Club", TEAM),
    ("Squad", TEAM),
    ("Team Name", TEAM),
    ("Comp", COMPETITION),
    ("League", COMPETITION),
    ("Competition", COMPETITION),
    ("Division", COMPETITION),
    ("MP", APPEARANCES),
    ("Played", MATCHES_PLAYED),
    ("P", MATCHES_PLAYED),
    ("GP", MATCHES_PLAYED),
    ("Games", MATCHES_PLAYED),
    ("W", WINS),
    ("Won", WINS),
    ("D", DRAWS),
    ("Drawn", DRAWS),
    ("L", LOSSES),
    ("Lost", LOSSES),
    ("Pts", POINTS),
    ("Min", MINUTES),
    ("Mins", MINUTES),
    ("Gls", GOALS),
    ("GF", GOALS_FOR),
    ("Goals For", GOALS_FOR),
    ("GA", GOALS_AGAINST),
    ("Goals Against", GOALS_AGAINST),
    ("GD", GOAL_DIFFERENCE),
    ("+/-", GOAL_DIFFERENCE),
    ("CS", CLEAN_SHEETS),
    ("Clean Sheets", CLEAN_SHEETS),
    ("CS%", CLEAN_SHEET_PERCENTAGE),
    ("Clean Sheet %", CLEAN_SHEET_PERCENTAGE),
    ("Poss", POSSESSION),
    ("Possession %", POSSESSION),
    ("PK", PENALTIES),
    ("PKatt", PENALTIES),
    ("Pens", PENALTIES),
];

/// Immutable header alias table. Build once per run and share by reference.
#[derive(Debug, Clone)]
pub struct HeaderAliases {
    exact: HashMap<String, &'static str>,
    folded: HashMap<String, &'static str>,
}

impl HeaderAliases {
    pub fn builtin() -> Self {
        let mut exact = HashMap::with_capacity(ALIASES.len());
        let mut folded = HashMap::with_capacity(ALIASES.len());
        for (raw, key) in ALIASES {
            exact.insert((*raw).to_string(), *key);
            folded.entry(raw.to_lowercase()).or_insert(*key);
        }
        Self { exact, folded }
    }

    pub fn canonical_key(&self, header: &str) -> String {
        let trimmed = header.trim();
        if let Some(key) = self.exact.get(trimmed) {
            return (*key).to_string();
        }
        if let Some(key) = self.folded.get(&trimmed.to_lowercase()) {
            return (*key).to_string();
        }
        fold_header(trimmed)
    }

    pub fn header_map(&self, headers: &[String]) -> HeaderMap {
        HeaderMap {
            keys: headers.iter().map(|h| self.canonical_key(h)).collect(),
        }
    }
}

/// Positional column index -> canonical key, shared by every data row of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    keys: Vec<String>,
}

impl HeaderMap {
    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn fold_header(header: &str) -> String {
    header
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
