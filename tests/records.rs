use std::path::PathBuf;

use league_ingest::error::{IngestError, RejectReason};
use league_ingest::header_aliases::{self as key, HeaderAliases};
use league_ingest::league_map::LeagueTable;
use league_ingest::table_extract::{RawRow, extract_csv};
use league_ingest::team_record::{TeamRecord, parse_row};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    std::fs::read_to_string(path).expect("fixture file should be readable")
}

fn parse_fixture(name: &str) -> Vec<Result<TeamRecord, IngestError>> {
    let leagues = LeagueTable::builtin();
    let extraction = extract_csv(name.to_string(), &read_fixture(name), &HeaderAliases::builtin());
    extraction.rows().map(|row| parse_row(&row, &leagues)).collect()
}

#[test]
fn arsenal_row_derives_totals_and_flags_missing_stats() {
    let results = parse_fixture("arsenal.csv");
    assert_eq!(results.len(), 1);
    let arsenal = results[0].as_ref().expect("arsenal row should parse");

    assert_eq!(arsenal.team, "Arsenal");
    assert_eq!(arsenal.competition, "Premier League");
    assert_eq!(arsenal.matches_played, 38);
    assert_eq!(arsenal.points, 70);
    assert_eq!(arsenal.points_per_match, 1.84);
    assert_eq!(arsenal.minutes, 38 * 90);
    assert!(!arsenal.is_data_complete);
    assert_eq!(arsenal.incomplete_fields, vec!["possession", "penalties"]);
    assert_eq!(arsenal.source_file, "arsenal.csv");
    assert_eq!(arsenal.source_row, 2);
    assert_eq!(arsenal.rank, None);
    assert_eq!((arsenal.from_year, arsenal.to_year), (None, None));
}

#[test]
fn liga_portugal_fixture_outcomes() {
    let results = parse_fixture("liga_portugal_2022_2023.csv");
    assert_eq!(results.len(), 6);

    let benfica = results[0].as_ref().expect("benfica");
    assert_eq!(benfica.competition, "Liga Portugal");
    assert_eq!(benfica.rank, Some(1));
    assert_eq!(benfica.points, 87);
    assert_eq!(benfica.goal_difference, Some(62));
    assert_eq!(benfica.clean_sheet_percentage, Some(55.88));
    assert_eq!(benfica.possession, Some(61.4));
    assert_eq!(benfica.penalties, Some(6));
    assert!(benfica.is_data_complete);
    assert_eq!((benfica.from_year, benfica.to_year), (Some(2022), Some(2023)));

    let porto = results[1].as_ref().expect("porto");
    assert_eq!(porto.penalties, None);
    assert_eq!(porto.incomplete_fields, vec!["penalties"]);
    assert_eq!(porto.clean_sheet_percentage, Some(50.0));

    let braga = results[2].as_ref().expect("braga");
    assert_eq!(braga.clean_sheets, None);
    assert_eq!(braga.incomplete_fields, vec!["cleanSheetPercentage"]);

    match &results[3] {
        Err(IngestError::RowRejected(RejectReason::UnmappedLeague { team, competition })) => {
            assert_eq!(team, "Sporting CP");
            assert_eq!(competition, "Taça de Portugal");
        }
        other => panic!("expected unmapped league, got {other:?}"),
    }
    assert!(matches!(
        results[4],
        Err(IngestError::RowRejected(RejectReason::MissingField(key::TEAM)))
    ));
    assert!(matches!(
        results[5],
        Err(IngestError::SchemaInvalid { field: key::LOSSES, .. })
    ));
}

#[test]
fn every_emitted_record_holds_derived_invariants() {
    for result in parse_fixture("liga_portugal_2022_2023.csv") {
        let Ok(r) = result else { continue };
        assert_eq!(r.matches_played, r.wins + r.draws + r.losses);
        assert_eq!(r.points, r.wins * 3 + r.draws);
        assert_eq!(r.is_data_complete, r.incomplete_fields.is_empty());
        let expected = (r.points as f64 / r.matches_played as f64 * 100.0).round() / 100.0;
        assert_eq!(r.points_per_match, expected);
    }
}

#[test]
fn zero_counts_are_valid_and_not_a_division_error() {
    let leagues = LeagueTable::builtin();
    let row = RawRow::new("blank_season.csv", 2)
        .with(key::TEAM, "Wrexham")
        .with(key::COMPETITION, "championship")
        .with(key::WINS, "0")
        .with(key::DRAWS, "0")
        .with(key::LOSSES, "0")
        .with(key::CLEAN_SHEETS, "0")
        .with(key::POSSESSION, "0")
        .with(key::PENALTIES, "0");

    let r = parse_row(&row, &leagues).expect("zero row should parse");
    assert_eq!(r.competition, "Championship");
    assert_eq!(r.matches_played, 0);
    assert_eq!(r.points_per_match, 0.0);
    assert_eq!(r.minutes, 0);
    assert_eq!(r.clean_sheet_percentage, Some(0.0));
    assert_eq!(r.possession, Some(0.0));
    assert!(r.is_data_complete);
}

#[test]
fn fallbacks_fill_optional_columns() {
    let leagues = LeagueTable::builtin();
    let row = RawRow::new("x.csv", 5)
        .with(key::POSITION, "4")
        .with(key::SEASON, "2021/22")
        .with(key::TEAM, "Lens")
        .with(key::COMPETITION, "French Ligue 1")
        .with(key::WINS, "21")
        .with(key::DRAWS, "10")
        .with(key::LOSSES, "7")
        .with(key::MINUTES, "3420")
        .with(key::GOALS, "68")
        .with(key::GOAL_DIFFERENCE, "\u{2212}3")
        .with(key::POSSESSION, "140")
        .with(key::PENALTIES, "incomplete");

    let r = parse_row(&row, &leagues).expect("row should parse");
    assert_eq!(r.rank, Some(4));
    assert_eq!((r.from_year, r.to_year), (Some(2021), Some(2022)));
    assert_eq!(r.minutes, 3420);
    assert_eq!(r.goals_for, Some(68));
    assert_eq!(r.goal_difference, Some(-3));
    assert_eq!(r.possession, None);
    assert_eq!(r.incomplete_fields, vec!["possession", "penalties"]);
}

#[test]
fn records_serialize_with_camel_case_keys() {
    let results = parse_fixture("arsenal.csv");
    let record = results[0].as_ref().expect("arsenal");
    let json = serde_json::to_value(record).expect("serialize");
    assert_eq!(json["matchesPlayed"], 38);
    assert_eq!(json["pointsPerMatch"], 1.84);
    assert_eq!(json["isDataComplete"], false);
    assert!(json["possession"].is_null());

    let back: TeamRecord = serde_json::from_value(json).expect("deserialize");
    assert_eq!(&back, record);
}

#[test]
fn oversized_goal_columns_parse_without_panicking() {
    let leagues = LeagueTable::builtin();
    let text = "Squad,Comp,W,D,L,GF,GA\nAjax,Eredivisie,20,5,9,3000000000,2000000000\nPSV,Eredivisie,1,1,1,4294967295,0\n";
    let extraction = extract_csv("huge.csv".to_string(), text, &HeaderAliases::builtin());
    let records = extraction
        .rows()
        .map(|row| parse_row(&row, &leagues).expect("well-formed row"))
        .collect::<Vec<_>>();
    assert_eq!(records[0].goal_difference, Some(1_000_000_000));
    assert_eq!(records[1].goals_for, Some(u32::MAX));
    assert_eq!(records[1].goal_difference, None);
}
