use chrono::{TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use league_ingest::header_aliases::HeaderAliases;
use league_ingest::integrity::{ValidationContext, score_team_records};
use league_ingest::league_map::LeagueTable;
use league_ingest::table_extract::{extract_csv, extract_text};
use league_ingest::team_record::{TeamRecord, parse_row};

const CLUBS: &[(&str, &str)] = &[
    ("Benfica", "Liga NOS"),
    ("Ajax", "Eredivisie"),
    ("Arsenal", "EPL"),
    ("Inter", "Serie A"),
    ("Lens", "Ligue 1"),
    ("Girona", "LaLiga"),
];

fn wide_csv(rows: usize) -> String {
    let mut out = String::from("Rk,Squad,Comp,MP,W,D,L,GF,GA,Pts,CS,Poss,PK\n");
    for i in 0..rows {
        let (club, comp) = CLUBS[i % CLUBS.len()];
        let (w, d, l) = (10 + i % 15, 5 + i % 7, 3 + i % 9);
        out.push_str(&format!(
            "{},{club} {i},{comp},{},{w},{d},{l},{},{},{},{},{}.{},{}\n",
            i + 1,
            w + d + l,
            40 + i % 30,
            20 + i % 25,
            w * 3 + d,
            i % 16,
            40 + i % 30,
            i % 10,
            i % 8,
        ));
    }
    out
}

fn text_table(rows: usize) -> String {
    let mut out = String::from("Premier League Table 2023/24\nPos Team P W D L Pts GD Poss\n");
    for i in 0..rows {
        let (w, d, l) = (10 + i % 15, 5 + i % 7, 3 + i % 9);
        if i % 2 == 0 {
            out.push_str(&format!(
                "{}. Club {i} {} {w} {d} {l} {} +{} 5{}.4%\n",
                i + 1,
                w + d + l,
                w * 3 + d,
                i % 40,
                i % 10
            ));
        } else {
            out.push_str(&format!("{} Club {i} {} {w} {d} {l} {}\n", i + 1, w + d + l, w * 3 + d));
        }
    }
    out
}

fn parse_all(csv: &str, aliases: &HeaderAliases, leagues: &LeagueTable) -> Vec<TeamRecord> {
    let extraction = extract_csv("bench.csv".to_string(), csv, aliases);
    extraction
        .rows()
        .filter_map(|row| parse_row(&row, leagues).ok())
        .collect()
}

fn bench_csv_ingest(c: &mut Criterion) {
    let aliases = HeaderAliases::builtin();
    let leagues = LeagueTable::builtin();
    let csv = wide_csv(500);

    c.bench_function("csv_ingest_500", |b| {
        b.iter(|| {
            let records = parse_all(black_box(&csv), &aliases, &leagues);
            black_box(records.len());
        })
    });
}

fn bench_text_ingest(c: &mut Criterion) {
    let leagues = LeagueTable::builtin();
    let content = text_table(200);

    c.bench_function("text_ingest_200", |b| {
        b.iter(|| {
            let extraction = extract_text("bench.txt".to_string(), black_box(content.clone()), &leagues);
            let parsed = extraction
                .rows()
                .filter(|row| parse_row(row, &leagues).is_ok())
                .count();
            black_box(parsed);
        })
    });
}

fn bench_integrity_scoring(c: &mut Criterion) {
    let records = parse_all(&wide_csv(500), &HeaderAliases::builtin(), &LeagueTable::builtin());
    let ctx = ValidationContext::at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());

    c.bench_function("integrity_scoring_500", |b| {
        b.iter(|| {
            let result = score_team_records(black_box(&records), &ctx);
            black_box(result.overall_score);
        })
    });
}

criterion_group!(perf, bench_csv_ingest, bench_text_ingest, bench_integrity_scoring);
criterion_main!(perf);
