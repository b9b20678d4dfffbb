use std::path::PathBuf;

use league_ingest::header_aliases::{self as key, HeaderAliases};
use league_ingest::league_map::LeagueTable;
use league_ingest::table_extract::{FileFormat, extract_csv, extract_file, extract_text};
use league_ingest::team_record::parse_row;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

#[test]
fn csv_header_is_normalized_to_canonical_keys() {
    let aliases = HeaderAliases::builtin();
    let extraction = extract_csv(
        "liga.csv".to_string(),
        &read_fixture("liga_portugal_2022_2023.csv"),
        &aliases,
    );
    let header = extraction.header().expect("csv has a header");
    assert_eq!(
        header.keys(),
        &[
            key::RANK,
            key::TEAM,
            key::COMPETITION,
            key::WINS,
            key::DRAWS,
            key::LOSSES,
            key::GOALS_FOR,
            key::GOALS_AGAINST,
            key::CLEAN_SHEETS,
            key::POSSESSION,
            key::PENALTIES,
        ]
    );

    let first = extraction.rows().next().expect("first row");
    assert_eq!(first.index, 2);
    assert_eq!(first.get(key::TEAM), Some("Benfica"));
    assert_eq!(first.get(key::COMPETITION), Some("Liga NOS"));
}

#[test]
fn csv_skips_leading_blank_lines_and_short_rows() {
    let aliases = HeaderAliases::builtin();
    let text = "\n\nClub,League,W,D,L,Poss\nLeeds,Championship,20,10\n";
    let extraction = extract_csv("short.csv".to_string(), text, &aliases);
    let rows = extraction.rows().collect::<Vec<_>>();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(key::DRAWS), Some("10"));
    assert_eq!(rows[0].get(key::LOSSES), None);
    assert!(!rows[0].has_column(key::POSSESSION));
}

#[test]
fn rows_can_be_iterated_more_than_once() {
    let aliases = HeaderAliases::builtin();
    let extraction = extract_csv("a.csv".to_string(), &read_fixture("arsenal.csv"), &aliases);
    let first = extraction.rows().collect::<Vec<_>>();
    let second = extraction.rows().collect::<Vec<_>>();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

#[test]
fn text_table_uses_both_grammars_and_detected_league() {
    let leagues = LeagueTable::builtin();
    let extraction = extract_text(
        "premier_table.txt".to_string(),
        read_fixture("premier_table.txt"),
        &leagues,
    );
    assert!(extraction.is_table_like());
    assert_eq!(extraction.format, FileFormat::Text);

    let rows = extraction.rows().collect::<Vec<_>>();
    let teams = rows.iter().filter_map(|r| r.get(key::TEAM)).collect::<Vec<_>>();
    assert_eq!(teams, vec!["Manchester City", "Arsenal", "Liverpool"]);
    assert_eq!(rows[0].index, 3);
    assert_eq!(rows[0].get(key::POSSESSION), Some("65.1"));
    assert_eq!(rows[2].get(key::POSSESSION), None);
    assert!(rows.iter().all(|r| r.get(key::COMPETITION) == Some("Premier League")));

    let records = rows
        .iter()
        .map(|r| parse_row(r, &leagues).expect("text row should parse"))
        .collect::<Vec<_>>();
    assert_eq!(records[0].goal_difference, Some(62));
    assert_eq!(records[0].incomplete_fields, vec!["penalties"]);
    assert_eq!(records[2].incomplete_fields, vec!["possession", "penalties"]);
}

#[test]
fn prose_yields_no_rows() {
    let leagues = LeagueTable::builtin();
    let extraction = extract_text(
        "meeting_notes.txt".to_string(),
        read_fixture("meeting_notes.txt"),
        &leagues,
    );
    assert!(!extraction.is_table_like());
    assert_eq!(extraction.rows().count(), 0);
}

#[test]
fn table_without_league_label_rejects_rows_later() {
    let leagues = LeagueTable::builtin();
    let content = "Final Table\n1 Rovers 10 7 2 1 23\n".to_string();
    let extraction = extract_text("cup.txt".to_string(), content, &leagues);
    let rows = extraction.rows().collect::<Vec<_>>();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(key::COMPETITION), None);
    assert!(parse_row(&rows[0], &leagues).is_err());
}

#[test]
fn unsupported_extension_is_reported() {
    let err = extract_file(
        &fixture_path("notes.pdf"),
        &HeaderAliases::builtin(),
        &LeagueTable::builtin(),
    )
    .expect_err("pdf is not an upload format");
    assert!(err.to_string().contains("unsupported"));
}

#[test]
fn goal_difference_before_points_layout_is_not_misread() {
    let leagues = LeagueTable::builtin();
    let content = "Premier League Table\nPos Team P W D L GD Pts\n1 Arsenal 38 26 6 6 62 84\n".to_string();
    let extraction = extract_text("gd_first.txt".to_string(), content, &leagues);
    assert!(extraction.is_table_like());
    assert_eq!(extraction.rows().count(), 0);
}
