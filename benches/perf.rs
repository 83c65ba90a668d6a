use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use mlb_gamelogs::game_identity::GameIdentity;
use mlb_gamelogs::gamelog_parse::{parse_batting_gamelog, parse_pitching_gamelog};
use mlb_gamelogs::teams::TeamCode;

const PHI_BATTING: &str = include_str!("../tests/fixtures/phi_batting_2020.html");
const PHI_PITCHING: &str = include_str!("../tests/fixtures/phi_pitching_2020.html");

fn bench_identity(c: &mut Criterion) {
    let date = NaiveDate::from_ymd_opt(2020, 7, 25).expect("valid date");
    let home: TeamCode = "PHI".parse().expect("valid code");
    let away: TeamCode = "MIA".parse().expect("valid code");
    c.bench_function("derive_identity", |b| {
        b.iter(|| {
            GameIdentity::derive(
                black_box(date),
                black_box(home),
                black_box(away),
                black_box(2),
                black_box(5),
            )
        })
    });
    c.bench_function("derive_identity_raw", |b| {
        b.iter(|| {
            GameIdentity::derive_raw(
                black_box("2020-07-25"),
                black_box("PHI"),
                black_box("MIA"),
                black_box(Some("2")),
                black_box(Some("5")),
            )
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let team: TeamCode = "PHI".parse().expect("valid code");
    c.bench_function("parse_batting_gamelog", |b| {
        b.iter(|| parse_batting_gamelog(black_box(PHI_BATTING), team, 2020).expect("parse"))
    });
    c.bench_function("parse_pitching_gamelog_commented", |b| {
        b.iter(|| parse_pitching_gamelog(black_box(PHI_PITCHING), team, 2020).expect("parse"))
    });
}

criterion_group!(perf, bench_identity, bench_parse);
criterion_main!(perf);
