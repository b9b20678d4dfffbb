use std::collections::{HashMap, HashSet};

use log::warn;
use serde::Serialize;

use crate::error::{IngestError, RejectReason};
use crate::team_record::TeamRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueMapping {
    pub name: &'static str,
    pub country: &'static str,
    pub tier: u8,
    pub active: bool,
}

struct LeagueSeed {
    mapping: LeagueMapping,
    labels: &'static [&'static str],
}

const fn league(
    name: &'static str,
    country: &'static str,
    tier: u8,
    active: bool,
    labels: &'static [&'static str],
) -> LeagueSeed {
    LeagueSeed {
        mapping: LeagueMapping {
            name,
            country,
            tier,
            active,
        },
        labels,
    }
}

// Every label is accepted case-insensitively; the canonical name is always a label too.
const SEEDS: &[LeagueSeed] = &[
    league(
        "Premier League",
        "England",
        1,
        true,
        &["Premier League", "EPL", "English Premier League", "Barclays Premier League"],
    ),
    league(
        "Championship",
        "England",
        2,
        true,
        &["Championship", "EFL Championship", "English Championship"],
    ),
    league(
        "La Liga",
        "Spain",
        1,
        true,
        &["La Liga", "LaLiga", "Primera Division", "Primera División", "LaLiga EA Sports"],
    ),
    league(
        "Serie A",
        "Italy",
        1,
        true,
        &["Serie A", "Serie A TIM", "Italian Serie A"],
    ),
    league(
        "Bundesliga",
        "Germany",
        1,
        true,
        &["Bundesliga", "1. Bundesliga", "German Bundesliga"],
    ),
    league(
        "Ligue 1",
        "France",
        1,
        true,
        &["Ligue 1", "Ligue 1 Uber Eats", "French Ligue 1"],
    ),
    league(
        "Liga Portugal",
        "Portugal",
        1,
        true,
        &["Liga Portugal", "Liga NOS", "Primeira Liga", "Liga Portugal Betclic"],
    ),
    league(
        "Eredivisie",
        "Netherlands",
        1,
        true,
        &["Eredivisie", "Dutch Eredivisie"],
    ),
    league(
        "Belgian Pro League",
        "Belgium",
        1,
        true,
        &["Belgian Pro League", "Jupiler Pro League", "First Division A"],
    ),
    league(
        "Scottish Premiership",
        "Scotland",
        1,
        true,
        &["Scottish Premiership", "SPFL Premiership"],
    ),
    league(
        "Süper Lig",
        "Turkey",
        1,
        true,
        &["Süper Lig", "Super Lig", "Turkish Super Lig"],
    ),
    league(
        "Major League Soccer",
        "United States",
        1,
        true,
        &["Major League Soccer", "MLS"],
    ),
    league(
        "Brasileirão",
        "Brazil",
        1,
        true,
        &["Brasileirão", "Brasileirao", "Serie A Brazil", "Campeonato Brasileiro"],
    ),
];

pub const DEFAULT_ALLOWED_LEAGUES: &[&str] = &[
    "Premier League",
    "La Liga",
    "Serie A",
    "Bundesliga",
    "Ligue 1",
    "Liga Portugal",
    "Eredivisie",
];

/// Immutable label -> league lookup. Build once per run and share by reference.
#[derive(Debug, Clone)]
pub struct LeagueTable {
    leagues: Vec<LeagueMapping>,
    by_label: HashMap<String, usize>,
    // (folded label, league index), longest label first for text scanning.
    labels: Vec<(String, usize)>,
}

impl LeagueTable {
    pub fn builtin() -> Self {
        let mut leagues = Vec::with_capacity(SEEDS.len());
        let mut by_label = HashMap::new();
        let mut labels = Vec::new();
        for (idx, seed) in SEEDS.iter().enumerate() {
            leagues.push(seed.mapping.clone());
            for label in seed.labels {
                let folded = fold_label(label);
                by_label.entry(folded.clone()).or_insert(idx);
                labels.push((folded, idx));
            }
        }
        labels.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        Self {
            leagues,
            by_label,
            labels,
        }
    }

    pub fn lookup(&self, raw: &str) -> Option<&LeagueMapping> {
        let idx = self.by_label.get(&fold_label(raw))?;
        self.leagues.get(*idx)
    }

    /// Maps a raw competition label or rejects the row; never guesses.
    pub fn resolve(&self, team: &str, raw: &str) -> Result<&LeagueMapping, IngestError> {
        match self.lookup(raw) {
            Some(mapping) => Ok(mapping),
            None => {
                warn!("rejecting team {team:?}: no league mapping for {raw:?}");
                Err(IngestError::RowRejected(RejectReason::UnmappedLeague {
                    team: team.to_string(),
                    competition: raw.to_string(),
                }))
            }
        }
    }

    /// Earliest known league label occurring as a whole word in `text`.
    pub fn find_in_text(&self, text: &str) -> Option<&LeagueMapping> {
        let haystack = fold_label(text);
        let mut best: Option<(usize, usize)> = None;
        for (label, idx) in &self.labels {
            let Some(pos) = find_word(&haystack, label) else {
                continue;
            };
            // Labels are sorted longest first, so ties keep the longer label.
            if best.is_none_or(|(best_pos, _)| pos < best_pos) {
                best = Some((pos, *idx));
            }
        }
        best.and_then(|(_, idx)| self.leagues.get(idx))
    }

    pub fn leagues(&self) -> &[LeagueMapping] {
        &self.leagues
    }
}

/// Canonical league names a downstream consumer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueAllowList {
    names: HashSet<String>,
}

impl LeagueAllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| fold_label(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn default_leagues() -> Self {
        Self::new(DEFAULT_ALLOWED_LEAGUES.iter().copied())
    }

    pub fn allows(&self, league: &str) -> bool {
        self.names.contains(&fold_label(league))
    }
}

/// Narrows an already-mapped batch; returns the kept records and how many were dropped.
pub fn filter_allowed(records: Vec<TeamRecord>, allow: &LeagueAllowList) -> (Vec<TeamRecord>, usize) {
    let before = records.len();
    let kept = records
        .into_iter()
        .filter(|r| allow.allows(&r.competition))
        .collect::<Vec<_>>();
    let dropped = before - kept.len();
    (kept, dropped)
}

fn fold_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let start = from + rel;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(start);
        }
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}
