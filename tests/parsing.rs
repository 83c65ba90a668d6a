use std::fs;
use std::path::PathBuf;

use mlb_gamelogs::game_identity::{HomeAway, InputField};
use mlb_gamelogs::game_record::GameResult;
use mlb_gamelogs::gamelog_parse::{parse_batting_gamelog, parse_pitching_gamelog};
use mlb_gamelogs::team_summary::parse_team_summary;
use mlb_gamelogs::teams::TeamCode;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn code(raw: &str) -> TeamCode {
    raw.parse().expect("valid team code")
}

#[test]
fn parses_batting_gamelog_by_data_stat() {
    let raw = read_fixture("phi_batting_2020.html");
    let log = parse_batting_gamelog(&raw, code("PHI"), 2020).expect("fixture should parse");
    assert_eq!(log.games.len(), 4);

    let first = &log.games[0];
    assert_eq!(first.record.date.to_string(), "2020-07-25");
    assert_eq!(first.record.opponent, code("MIA"));
    assert_eq!(first.record.side, HomeAway::Home);
    assert_eq!(first.record.result, GameResult::Loss);
    assert_eq!((first.record.runs_for, first.record.runs_against), (2, 5));
    assert_eq!(first.line.plate_appearances, Some(36));
    assert_eq!(first.line.players_used, Some(14));
    assert_eq!(first.line.batting_avg, Some(0.219));
    assert_eq!(first.line.opp_starter_throws.as_deref(), Some("R"));

    let nightcap = &log.games[3];
    assert_eq!(nightcap.record.date.to_string(), "2020-08-05");
    assert_eq!(nightcap.record.side, HomeAway::Away);
    assert_eq!(nightcap.record.result, GameResult::Win);
}

#[test]
fn suspended_rows_are_skipped_not_fatal() {
    let raw = read_fixture("phi_batting_2020.html");
    let log = parse_batting_gamelog(&raw, code("PHI"), 2020).expect("fixture should parse");
    assert_eq!(log.skipped.len(), 1);
    let reason = &log.skipped[0].reason;
    assert_eq!(reason.field, InputField::AwayScore);
    assert_eq!(reason.value, "Susp");
    assert_eq!(reason.to_string(), "invalid away score: \"Susp\"");
}

#[test]
fn doubleheader_games_get_distinct_ids() {
    let raw = read_fixture("phi_batting_2020.html");
    let log = parse_batting_gamelog(&raw, code("PHI"), 2020).expect("fixture should parse");
    let (game_one, game_two) = (&log.games[2].record, &log.games[3].record);
    assert_eq!(game_one.date, game_two.date);
    assert_eq!(game_one.opponent, game_two.opponent);
    assert_ne!(game_one.identity(), game_two.identity());
}

#[test]
fn parses_batting_gamelog_by_header_label() {
    let raw = read_fixture("mia_batting_2020.html");
    let log = parse_batting_gamelog(&raw, code("MIA"), 2020).expect("fixture should parse");
    assert_eq!(log.games.len(), 2);
    assert!(log.skipped.is_empty());
    let first = &log.games[0];
    assert_eq!(first.record.side, HomeAway::Away);
    assert_eq!(first.record.opponent, code("PHI"));
    assert_eq!((first.record.runs_for, first.record.runs_against), (5, 2));
    assert_eq!(first.line.gidp, Some(1));
    assert_eq!(log.games[1].line.ops, Some(1.124));
}

#[test]
fn both_clubs_pages_share_game_ids() {
    let phi = parse_batting_gamelog(&read_fixture("phi_batting_2020.html"), code("PHI"), 2020)
        .expect("phi should parse");
    let mia = parse_batting_gamelog(&read_fixture("mia_batting_2020.html"), code("MIA"), 2020)
        .expect("mia should parse");
    assert_eq!(phi.games[0].record.identity(), mia.games[0].record.identity());
    assert_eq!(phi.games[0].record.identity().value(), 1_233_712_716);
    assert_eq!(phi.games[1].record.identity(), mia.games[1].record.identity());
}

#[test]
fn parses_commented_pitching_table() {
    let raw = read_fixture("phi_pitching_2020.html");
    let log = parse_pitching_gamelog(&raw, code("PHI"), 2020).expect("fixture should parse");
    assert_eq!(log.games.len(), 4);

    let first = &log.games[0];
    assert_eq!(first.line.starting_pitcher.as_deref(), Some("A.Nola"));
    assert_eq!(first.line.deciding_pitcher.as_deref(), Some("A.Nola"));
    assert_eq!(first.line.umpire.as_deref(), Some("Hernandez"));
    assert_eq!(first.line.innings_pitched, Some(9.0));
    assert_eq!(first.line.era, Some(5.0));
    assert_eq!(first.line.pitches, Some(151));

    let nightcap = &log.games[3];
    assert_eq!(nightcap.line.starting_pitcher.as_deref(), Some("V.Velasquez"));
    assert_eq!(nightcap.line.deciding_pitcher.as_deref(), Some("T.Hunter"));
}

#[test]
fn pitching_by_header_label() {
    let raw = read_fixture("mia_pitching_2020.html");
    let log = parse_pitching_gamelog(&raw, code("MIA"), 2020).expect("fixture should parse");
    assert_eq!(log.games.len(), 2);
    assert_eq!(log.games[1].line.starting_pitcher.as_deref(), Some("J.Urena"));
    assert_eq!(log.games[1].line.deciding_pitcher.as_deref(), Some("J.Smith"));
    assert_eq!(log.games[1].line.batters_faced, Some(42));
}

#[test]
fn missing_table_is_an_error() {
    let raw = read_fixture("phi_batting_2020.html");
    assert!(parse_pitching_gamelog(&raw, code("PHI"), 2020).is_err());
}

#[test]
fn parses_team_summary() {
    let raw = read_fixture("phi_batting_2020.html");
    let summary = parse_team_summary(&raw, code("PHI"), 2020).expect("summary should parse");
    assert_eq!(summary.name, "Philadelphia Phillies");
    assert_eq!(summary.league, "NL");
    assert_eq!(summary.division, "East");
    assert_eq!((summary.wins, summary.losses), (28, 32));
    assert_eq!(summary.id, code("PHI").team_id());
}
