use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::team_record::TeamRecord;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;
pub const EMPTY_BATCH_RECOMMENDATION: &str = "No data provided for validation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn deduction(self) -> u32 {
        match self {
            Severity::Critical => 25,
            Severity::High => 15,
            Severity::Medium => 10,
            Severity::Low => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MissingField,
    InvalidValue,
    Inconsistent,
    Incomplete,
    Stale,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub score: u8,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIntegrityResult {
    pub overall_score: f64,
    pub valid_items: usize,
    pub total_items: usize,
    pub critical_issues: usize,
    pub recommendations: Vec<String>,
    pub reports: Vec<IntegrityReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Team,
    Transfer,
    Player,
}

impl std::str::FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "team" | "teams" => Ok(EntityKind::Team),
            "transfer" | "transfers" => Ok(EntityKind::Transfer),
            "player" | "players" => Ok(EntityKind::Player),
            other => Err(anyhow::anyhow!("unknown entity kind {other:?}")),
        }
    }
}

/// Maximum data age per entity kind; half of it is still considered fresh.
#[derive(Debug, Clone, Copy)]
pub struct MaxAges {
    pub team: Duration,
    pub transfer: Duration,
    pub player: Duration,
}

impl Default for MaxAges {
    fn default() -> Self {
        Self {
            team: Duration::days(7),
            transfer: Duration::hours(48),
            player: Duration::days(30),
        }
    }
}

impl MaxAges {
    pub fn for_kind(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::Team => self.team,
            EntityKind::Transfer => self.transfer,
            EntityKind::Player => self.player,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub now: DateTime<Utc>,
    pub max_ages: MaxAges,
    pub recommendation_limit: usize,
}

impl ValidationContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            max_ages: MaxAges::default(),
            recommendation_limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }
}

/// One scoring rule: `check` returns the violation message, or `None` when the entity passes.
pub struct Rule<T> {
    pub field: Option<&'static str>,
    pub kind: IssueType,
    pub severity: Severity,
    pub check: fn(&T) -> Option<String>,
    pub recommendation: &'static str,
}

pub trait Validatable: 'static {
    const KIND: EntityKind;

    fn rules() -> &'static [Rule<Self>]
    where
        Self: Sized;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// `{ "data": [...] }` as posted by dashboard/report callers.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationRequest<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

pub fn validate_item<T: Validatable>(item: &T, ctx: &ValidationContext) -> IntegrityReport {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    for rule in T::rules() {
        let Some(message) = (rule.check)(item) else {
            continue;
        };
        issues.push(Issue {
            kind: rule.kind,
            field: rule.field.map(str::to_string),
            message,
            severity: rule.severity,
        });
        push_unique(&mut recommendations, rule.recommendation);
    }

    if let Some(ts) = item.timestamp()
        && let Some((issue, recommendation)) =
            freshness_issue(ts, ctx.now, ctx.max_ages.for_kind(T::KIND))
    {
        issues.push(issue);
        push_unique(&mut recommendations, recommendation);
    }

    let deducted: u32 = issues.iter().map(|i| i.severity.deduction()).sum();
    let score = 100u32.saturating_sub(deducted) as u8;
    let is_valid = !issues.iter().any(|i| i.severity == Severity::Critical);

    IntegrityReport {
        is_valid,
        score,
        issues,
        recommendations,
    }
}

pub fn validate_batch<T: Validatable>(items: &[T], ctx: &ValidationContext) -> BatchIntegrityResult {
    if items.is_empty() {
        return BatchIntegrityResult {
            overall_score: 0.0,
            valid_items: 0,
            total_items: 0,
            critical_issues: 1,
            recommendations: vec![EMPTY_BATCH_RECOMMENDATION.to_string()],
            reports: Vec::new(),
        };
    }

    let reports = items
        .iter()
        .map(|item| validate_item(item, ctx))
        .collect::<Vec<_>>();

    let total: u32 = reports.iter().map(|r| r.score as u32).sum();
    let overall_score = ((total as f64 / reports.len() as f64) * 100.0).round() / 100.0;
    let valid_items = reports.iter().filter(|r| r.is_valid).count();
    let critical_issues = reports
        .iter()
        .flat_map(|r| r.issues.iter())
        .filter(|i| i.severity == Severity::Critical)
        .count();

    let mut seen = HashSet::new();
    let recommendations = reports
        .iter()
        .flat_map(|r| r.recommendations.iter())
        .filter(|rec| seen.insert(rec.as_str()))
        .take(ctx.recommendation_limit)
        .cloned()
        .collect::<Vec<_>>();

    BatchIntegrityResult {
        overall_score,
        valid_items,
        total_items: reports.len(),
        critical_issues,
        recommendations,
        reports,
    }
}

pub fn validate_request<T: Validatable>(
    request: &ValidationRequest<T>,
    ctx: &ValidationContext,
) -> BatchIntegrityResult {
    validate_batch(&request.data, ctx)
}

/// Validation entry point for raw `{ "data": [...] }` JSON.
pub fn validate_json(kind: EntityKind, raw: &str, ctx: &ValidationContext) -> Result<BatchIntegrityResult> {
    match kind {
        EntityKind::Team => validate_json_as::<TeamEntity>(raw, ctx),
        EntityKind::Transfer => validate_json_as::<TransferEntity>(raw, ctx),
        EntityKind::Player => validate_json_as::<PlayerEntity>(raw, ctx),
    }
}

fn validate_json_as<T: Validatable + DeserializeOwned>(
    raw: &str,
    ctx: &ValidationContext,
) -> Result<BatchIntegrityResult> {
    let request: ValidationRequest<T> =
        serde_json::from_str(raw.trim()).context("invalid validation request json")?;
    Ok(validate_request(&request, ctx))
}

fn freshness_issue(
    ts: DateTime<Utc>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Option<(Issue, &'static str)> {
    let age = now - ts;
    if age <= max_age / 2 {
        return None;
    }
    let hours = age.num_hours();
    if age <= max_age {
        return Some((
            Issue {
                kind: IssueType::Stale,
                field: Some("timestamp".to_string()),
                message: format!("data is {hours}h old and going stale"),
                severity: Severity::Low,
            },
            "Refresh stale data before the next report",
        ));
    }
    Some((
        Issue {
            kind: IssueType::Expired,
            field: Some("timestamp".to_string()),
            message: format!("data is {hours}h old and has expired"),
            severity: Severity::Medium,
        },
        "Re-import expired data from the source",
    ))
}

fn push_unique(out: &mut Vec<String>, rec: &str) {
    if !out.iter().any(|r| r == rec) {
        out.push(rec.to_string());
    }
}

fn missing(value: &Option<String>, label: &str) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => None,
        _ => Some(format!("{label} is missing")),
    }
}

fn negative_fields(fields: &[(&str, Option<i64>)]) -> Option<String> {
    let bad = fields
        .iter()
        .filter(|(_, v)| v.is_some_and(|n| n < 0))
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if bad.is_empty() {
        None
    } else {
        Some(format!("negative values in {}", bad.join(", ")))
    }
}

// ---------------------------------------------------------------------------
// Team

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamEntity {
    #[serde(alias = "team")]
    pub name: Option<String>,
    #[serde(alias = "competition")]
    pub league: Option<String>,
    #[serde(alias = "matchesPlayed")]
    pub played: Option<i64>,
    #[serde(alias = "wins")]
    pub won: Option<i64>,
    #[serde(alias = "draws")]
    pub drawn: Option<i64>,
    #[serde(alias = "losses")]
    pub lost: Option<i64>,
    pub points: Option<i64>,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub possession: Option<f64>,
    pub incomplete_fields: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&TeamRecord> for TeamEntity {
    fn from(r: &TeamRecord) -> Self {
        Self {
            name: Some(r.team.clone()),
            league: Some(r.competition.clone()),
            played: Some(r.matches_played.into()),
            won: Some(r.wins.into()),
            drawn: Some(r.draws.into()),
            lost: Some(r.losses.into()),
            points: Some(r.points.into()),
            goals_for: r.goals_for.map(i64::from),
            goals_against: r.goals_against.map(i64::from),
            possession: r.possession,
            incomplete_fields: r.incomplete_fields.clone(),
            updated_at: None,
        }
    }
}

fn team_name_missing(t: &TeamEntity) -> Option<String> {
    missing(&t.name, "team name")
}

fn team_league_missing(t: &TeamEntity) -> Option<String> {
    missing(&t.league, "league")
}

fn team_results_missing(t: &TeamEntity) -> Option<String> {
    let absent = [("won", t.won), ("drawn", t.drawn), ("lost", t.lost)]
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if absent.is_empty() {
        None
    } else {
        Some(format!("result counts missing: {}", absent.join(", ")))
    }
}

fn team_negative_counts(t: &TeamEntity) -> Option<String> {
    negative_fields(&[
        ("played", t.played),
        ("won", t.won),
        ("drawn", t.drawn),
        ("lost", t.lost),
        ("points", t.points),
        ("goalsFor", t.goals_for),
        ("goalsAgainst", t.goals_against),
    ])
}

fn team_possession_range(t: &TeamEntity) -> Option<String> {
    let p = t.possession?;
    (!(0.0..=100.0).contains(&p)).then(|| format!("possession {p} outside 0-100"))
}

fn results_total(t: &TeamEntity) -> Option<Option<i64>> {
    let (Some(won), Some(drawn), Some(lost)) = (t.won, t.drawn, t.lost) else {
        return None;
    };
    Some(won.checked_add(drawn).and_then(|n| n.checked_add(lost)))
}

fn points_total(t: &TeamEntity) -> Option<Option<i64>> {
    let (Some(won), Some(drawn)) = (t.won, t.drawn) else {
        return None;
    };
    Some(won.checked_mul(3).and_then(|n| n.checked_add(drawn)))
}

fn team_totals_overflow(t: &TeamEntity) -> Option<String> {
    let overflowed = [("won+drawn+lost", results_total(t)), ("won*3+drawn", points_total(t))]
        .iter()
        .filter(|(_, total)| matches!(total, Some(None)))
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if overflowed.is_empty() {
        None
    } else {
        Some(format!("result counts too large to total: {}", overflowed.join(", ")))
    }
}

fn team_played_mismatch(t: &TeamEntity) -> Option<String> {
    let played = t.played?;
    let total = results_total(t).flatten()?;
    (played != total).then(|| format!("played {played} != won+drawn+lost {total}"))
}

fn team_points_mismatch(t: &TeamEntity) -> Option<String> {
    let points = t.points?;
    let total = points_total(t).flatten()?;
    (points != total).then(|| format!("points {points} != won*3+drawn {total}"))
}

fn team_incomplete(t: &TeamEntity) -> Option<String> {
    if t.incomplete_fields.is_empty() {
        return None;
    }
    Some(format!(
        "missing optional statistics: {}",
        t.incomplete_fields.join(", ")
    ))
}

static TEAM_RULES: [Rule<TeamEntity>; 9] = [
    Rule {
        field: Some("name"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: team_name_missing,
        recommendation: "Provide a team name for every row",
    },
    Rule {
        field: Some("league"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: team_league_missing,
        recommendation: "Provide the competition for every team",
    },
    Rule {
        field: None,
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: team_results_missing,
        recommendation: "Include won, drawn and lost columns",
    },
    Rule {
        field: None,
        kind: IssueType::InvalidValue,
        severity: Severity::Medium,
        check: team_negative_counts,
        recommendation: "Correct negative match statistics",
    },
    Rule {
        field: None,
        kind: IssueType::InvalidValue,
        severity: Severity::Medium,
        check: team_totals_overflow,
        recommendation: "Correct implausibly large match statistics",
    },
    Rule {
        field: Some("possession"),
        kind: IssueType::InvalidValue,
        severity: Severity::Medium,
        check: team_possession_range,
        recommendation: "Express possession as a percentage between 0 and 100",
    },
    Rule {
        field: Some("played"),
        kind: IssueType::Inconsistent,
        severity: Severity::High,
        check: team_played_mismatch,
        recommendation: "Reconcile matches played with the win/draw/loss record",
    },
    Rule {
        field: Some("points"),
        kind: IssueType::Inconsistent,
        severity: Severity::High,
        check: team_points_mismatch,
        recommendation: "Recompute points as 3 per win and 1 per draw",
    },
    Rule {
        field: Some("incompleteFields"),
        kind: IssueType::Incomplete,
        severity: Severity::Low,
        check: team_incomplete,
        recommendation: "Re-export the table with possession, penalty and clean sheet columns",
    },
];

impl Validatable for TeamEntity {
    const KIND: EntityKind = EntityKind::Team;

    fn rules() -> &'static [Rule<Self>] {
        &TEAM_RULES
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// ---------------------------------------------------------------------------
// Transfer

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferEntity {
    pub player_name: Option<String>,
    pub from_team: Option<String>,
    pub to_team: Option<String>,
    pub source: Option<String>,
    pub fee: Option<f64>,
    pub reliability: Option<f64>,
    #[serde(alias = "date")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn transfer_player_missing(t: &TransferEntity) -> Option<String> {
    missing(&t.player_name, "player name")
}

fn transfer_from_missing(t: &TransferEntity) -> Option<String> {
    missing(&t.from_team, "selling team")
}

fn transfer_to_missing(t: &TransferEntity) -> Option<String> {
    missing(&t.to_team, "buying team")
}

fn transfer_source_missing(t: &TransferEntity) -> Option<String> {
    missing(&t.source, "source")
}

fn transfer_reliability_range(t: &TransferEntity) -> Option<String> {
    let r = t.reliability?;
    (!(0.0..=100.0).contains(&r)).then(|| format!("reliability {r} outside 0-100"))
}

fn transfer_negative_fee(t: &TransferEntity) -> Option<String> {
    let fee = t.fee?;
    (fee < 0.0).then(|| format!("fee {fee} is negative"))
}

fn transfer_same_team(t: &TransferEntity) -> Option<String> {
    let from = t.from_team.as_deref()?.trim();
    let to = t.to_team.as_deref()?.trim();
    if from.is_empty() || to.is_empty() {
        return None;
    }
    from.eq_ignore_ascii_case(to)
        .then(|| format!("transfer from and to the same team ({from})"))
}

static TRANSFER_RULES: [Rule<TransferEntity>; 7] = [
    Rule {
        field: Some("playerName"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: transfer_player_missing,
        recommendation: "Provide the player name for every transfer",
    },
    Rule {
        field: Some("fromTeam"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: transfer_from_missing,
        recommendation: "Provide both clubs involved in the transfer",
    },
    Rule {
        field: Some("toTeam"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: transfer_to_missing,
        recommendation: "Provide both clubs involved in the transfer",
    },
    Rule {
        field: Some("source"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: transfer_source_missing,
        recommendation: "Attribute every transfer to a source",
    },
    Rule {
        field: Some("reliability"),
        kind: IssueType::InvalidValue,
        severity: Severity::Medium,
        check: transfer_reliability_range,
        recommendation: "Keep source reliability between 0 and 100",
    },
    Rule {
        field: Some("fee"),
        kind: IssueType::InvalidValue,
        severity: Severity::Medium,
        check: transfer_negative_fee,
        recommendation: "Correct negative transfer fees",
    },
    Rule {
        field: Some("toTeam"),
        kind: IssueType::Inconsistent,
        severity: Severity::High,
        check: transfer_same_team,
        recommendation: "Check transfers where the selling and buying club are the same team",
    },
];

impl Validatable for TransferEntity {
    const KIND: EntityKind = EntityKind::Transfer;

    fn rules() -> &'static [Rule<Self>] {
        &TRANSFER_RULES
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

// ---------------------------------------------------------------------------
// Player

pub const PLAYER_MIN_AGE: i64 = 16;
pub const PLAYER_MAX_AGE: i64 = 45;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerEntity {
    pub name: Option<String>,
    #[serde(alias = "club")]
    pub team: Option<String>,
    pub position: Option<String>,
    pub age: Option<i64>,
    pub appearances: Option<i64>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
    pub minutes: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn player_name_missing(p: &PlayerEntity) -> Option<String> {
    missing(&p.name, "player name")
}

fn player_team_missing(p: &PlayerEntity) -> Option<String> {
    missing(&p.team, "team")
}

fn player_age_range(p: &PlayerEntity) -> Option<String> {
    let age = p.age?;
    (!(PLAYER_MIN_AGE..=PLAYER_MAX_AGE).contains(&age))
        .then(|| format!("age {age} outside {PLAYER_MIN_AGE}-{PLAYER_MAX_AGE}"))
}

fn player_negative_counts(p: &PlayerEntity) -> Option<String> {
    negative_fields(&[
        ("appearances", p.appearances),
        ("goals", p.goals),
        ("assists", p.assists),
        ("minutes", p.minutes),
    ])
}

fn player_goals_without_appearances(p: &PlayerEntity) -> Option<String> {
    let (Some(goals), Some(apps)) = (p.goals, p.appearances) else {
        return None;
    };
    (goals > 0 && apps == 0).then(|| format!("{goals} goals recorded with no appearances"))
}

static PLAYER_RULES: [Rule<PlayerEntity>; 5] = [
    Rule {
        field: Some("name"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: player_name_missing,
        recommendation: "Provide a name for every player",
    },
    Rule {
        field: Some("team"),
        kind: IssueType::MissingField,
        severity: Severity::Critical,
        check: player_team_missing,
        recommendation: "Assign every player to a team",
    },
    Rule {
        field: Some("age"),
        kind: IssueType::InvalidValue,
        severity: Severity::Medium,
        check: player_age_range,
        recommendation: "Verify player ages fall between 16 and 45",
    },
    Rule {
        field: None,
        kind: IssueType::InvalidValue,
        severity: Severity::Medium,
        check: player_negative_counts,
        recommendation: "Correct negative player statistics",
    },
    Rule {
        field: Some("goals"),
        kind: IssueType::Inconsistent,
        severity: Severity::High,
        check: player_goals_without_appearances,
        recommendation: "Reconcile goals with appearances",
    },
];

impl Validatable for PlayerEntity {
    const KIND: EntityKind = EntityKind::Player;

    fn rules() -> &'static [Rule<Self>] {
        &PLAYER_RULES
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Scores emitted records as team entities, in input order.
pub fn score_team_records(records: &[TeamRecord], ctx: &ValidationContext) -> BatchIntegrityResult {
    let entities = records.iter().map(TeamEntity::from).collect::<Vec<_>>();
    validate_batch(&entities, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deductions_floor_at_zero() {
        let ctx = ValidationContext::at(Utc::now());
        let report = validate_item(&TransferEntity::default(), &ctx);
        assert_eq!(report.issues.len(), 4);
        assert_eq!(report.score, 0);
        assert!(!report.is_valid);
    }

    #[test]
    fn oversized_team_counts_are_invalid_not_a_panic() {
        let team = TeamEntity {
            name: Some("Overflow FC".to_string()),
            league: Some("Serie A".to_string()),
            played: Some(10),
            won: Some(4_000_000_000_000_000_000),
            drawn: Some(i64::MAX),
            lost: Some(1),
            points: Some(10),
            ..TeamEntity::default()
        };
        let report = validate_item(&team, &ValidationContext::at(Utc::now()));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueType::InvalidValue);
        assert!(report.issues[0].message.contains("won*3+drawn"));
        assert_eq!(report.score, 90);
    }

    #[test]
    fn severity_orders_by_weight() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::Low.deduction(), 5);
    }
}
