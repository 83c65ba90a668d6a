//! Team game-log tables from baseball-reference (`tgl.cgi`).
//!
//! Cells are looked up by their `data-stat` attribute first and by the column
//! header text second, so a reordered or renamed column does not shift data
//! into the wrong field.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::game_identity::{HomeAway, InputField, InvalidInput};
use crate::game_record::{
    BattingGame, BattingLine, GameRecord, GameResult, PitchingGame, PitchingLine,
};
use crate::teams::TeamCode;

pub const BATTING_TABLE_ID: &str = "team_batting_gamelogs";
pub const PITCHING_TABLE_ID: &str = "team_pitching_gamelogs";

#[derive(Debug, Clone, Copy)]
struct Col {
    stat: &'static str,
    label: &'static str,
}

const fn col(stat: &'static str, label: &'static str) -> Col {
    Col { stat, label }
}

const DATE: Col = col("date_game", "Date");
const HOME_AWAY: Col = col("team_homeORaway", "");
const OPP: Col = col("opp_ID", "Opp");
const RESULT: Col = col("game_result", "Rslt");

/// A body row that cannot be keyed to a game, with the cell that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: InvalidInput,
}

#[derive(Debug, Clone)]
pub struct ParsedGameLog<T> {
    pub games: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Default for ParsedGameLog<T> {
    fn default() -> Self {
        Self {
            games: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

pub fn parse_batting_gamelog(
    html: &str,
    team: TeamCode,
    season: i32,
) -> Result<ParsedGameLog<BattingGame>> {
    parse_table(html, BATTING_TABLE_ID, |row| {
        let record = parse_record(row, team, season)?;
        let line = BattingLine {
            plate_appearances: row.int(col("PA", "PA")),
            at_bats: row.int(col("AB", "AB")),
            runs: row.int(col("R", "R")),
            hits: row.int(col("H", "H")),
            doubles: row.int(col("2B", "2B")),
            triples: row.int(col("3B", "3B")),
            home_runs: row.int(col("HR", "HR")),
            rbi: row.int(col("RBI", "RBI")),
            walks: row.int(col("BB", "BB")),
            intentional_walks: row.int(col("IBB", "IBB")),
            strikeouts: row.int(col("SO", "SO")),
            hit_by_pitch: row.int(col("HBP", "HBP")),
            sac_hits: row.int(col("SH", "SH")),
            sac_flies: row.int(col("SF", "SF")),
            reached_on_error: row.int(col("ROE", "ROE")),
            gidp: row.int(col("GIDP", "GDP")),
            stolen_bases: row.int(col("SB", "SB")),
            caught_stealing: row.int(col("CS", "CS")),
            left_on_base: row.int(col("LOB", "LOB")),
            players_used: row.int(col("player_count", "#")),
            batting_avg: row.float(col("batting_avg", "BA")),
            onbase_pct: row.float(col("onbase_perc", "OBP")),
            slugging_pct: row.float(col("slugging_perc", "SLG")),
            ops: row.float(col("onbase_plus_slugging", "OPS")),
            opp_starter_throws: row.text(col("opp_starter_throws", "Thr")),
        };
        Ok(BattingGame { record, line })
    })
}

pub fn parse_pitching_gamelog(
    html: &str,
    team: TeamCode,
    season: i32,
) -> Result<ParsedGameLog<PitchingGame>> {
    parse_table(html, PITCHING_TABLE_ID, |row| {
        let record = parse_record(row, team, season)?;
        let pitchers = row.text(col("pitchers_used", "Pitchers Used (Rest-GameScore-Dec)"));
        let (starting_pitcher, deciding_pitcher) = pitchers
            .as_deref()
            .map(split_pitchers_used)
            .unwrap_or((None, None));
        let line = PitchingLine {
            hits: row.int(col("H", "H")),
            runs: row.int(col("R", "R")),
            earned_runs: row.int(col("ER", "ER")),
            unearned_runs: row.int(col("UER", "UER")),
            walks: row.int(col("BB", "BB")),
            strikeouts: row.int(col("SO", "SO")),
            home_runs: row.int(col("HR", "HR")),
            hit_by_pitch: row.int(col("HBP", "HBP")),
            batters_faced: row.int(col("batters_faced", "BF")),
            pitches: row.int(col("pitches", "Pit")),
            strikes: row.int(col("strikes_total", "Str")),
            inherited_runners: row.int(col("inherited_runners", "IR")),
            inherited_scored: row.int(col("inherited_score", "IS")),
            stolen_bases: row.int(col("SB", "SB")),
            caught_stealing: row.int(col("CS", "CS")),
            at_bats: row.int(col("AB", "AB")),
            doubles: row.int(col("2B", "2B")),
            triples: row.int(col("3B", "3B")),
            intentional_walks: row.int(col("IBB", "IBB")),
            sac_hits: row.int(col("SH", "SH")),
            sac_flies: row.int(col("SF", "SF")),
            reached_on_error: row.int(col("ROE", "ROE")),
            gidp: row.int(col("GIDP", "GDP")),
            pitchers_used: row.int(col("player_count", "#")),
            innings_pitched: row.float(col("IP", "IP")),
            era: row.float(col("earned_run_avg", "ERA")),
            umpire: row.text(col("umpire_hp", "Umpire")),
            starting_pitcher,
            deciding_pitcher,
        };
        Ok(PitchingGame { record, line })
    })
}

/// `Mon DD` with an optional doubleheader suffix like `(2)`, in `season`.
pub fn parse_gamelog_date(raw: &str, season: i32) -> Option<NaiveDate> {
    let cleaned = raw.replace('\u{a0}', " ");
    let day = cleaned.split('(').next()?.trim();
    if day.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{day} {season}"), "%b %d %Y").ok()
}

/// `W,5-2`, `L 2-5 (10)` and friends. Own runs come first.
pub fn parse_result_cell(raw: &str) -> Option<(GameResult, u32, u32)> {
    let result = GameResult::from_code(raw)?;
    let (own, opp) = parse_score_pair(raw)?;
    Some((result, own, opp))
}

/// `Z.Wheeler (4-51-W), H.Neris (1-60-S)` -> starter and the pitcher of record.
pub fn split_pitchers_used(raw: &str) -> (Option<String>, Option<String>) {
    let entries = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    let name_of = |entry: &str| entry.split_whitespace().next().map(|s| s.to_string());
    let starter = entries.first().and_then(|e| name_of(*e));
    let decider = entries
        .iter()
        .find(|entry| {
            decision_of(*entry).is_some_and(|dec| dec.starts_with('W') || dec.starts_with('L'))
        })
        .and_then(|e| name_of(*e));
    (starter, decider)
}

fn decision_of(entry: &str) -> Option<&str> {
    let open = entry.find('(')?;
    let close = entry[open..].find(')')? + open;
    let inner = &entry[open + 1..close];
    inner.rsplit('-').next().map(str::trim).filter(|d| !d.is_empty())
}

fn parse_score_pair(raw: &str) -> Option<(u32, u32)> {
    let mut nums = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let own = nums.next()?;
    let opp = nums.next()?;
    Some((own, opp))
}

/// Failures are reported against the identity field they would feed: the
/// opponent is the home or away team and the result cell carries the score.
fn parse_record(row: &Row<'_>, team: TeamCode, season: i32) -> Result<GameRecord, InvalidInput> {
    // Unlabeled column, blank for home games.
    let side = HomeAway::from_marker(row.text(HOME_AWAY).as_deref().unwrap_or(""));
    let (opponent_field, score_field) = match side {
        HomeAway::Home => (InputField::AwayTeam, InputField::HomeScore),
        HomeAway::Away => (InputField::HomeTeam, InputField::AwayScore),
    };

    let raw_date = row.text(DATE).unwrap_or_default();
    let date = parse_gamelog_date(&raw_date, season)
        .ok_or_else(|| InvalidInput::new(InputField::Date, raw_date.as_str()))?;
    let raw_opponent = row.text(OPP).unwrap_or_default();
    let opponent = raw_opponent
        .parse::<TeamCode>()
        .map_err(|_| InvalidInput::new(opponent_field, raw_opponent.as_str()))?;
    let raw_result = row.text(RESULT).unwrap_or_default();
    let (result, runs_for, runs_against) = parse_result_cell(&raw_result)
        .ok_or_else(|| InvalidInput::new(score_field, raw_result.as_str()))?;
    Ok(GameRecord {
        season,
        date,
        team,
        opponent,
        side,
        result,
        runs_for,
        runs_against,
    })
}

struct Row<'a> {
    by_stat: HashMap<&'a str, String>,
    by_label: HashMap<&'a str, String>,
}

impl Row<'_> {
    fn text(&self, col: Col) -> Option<String> {
        self.by_stat
            .get(col.stat)
            .or_else(|| self.by_label.get(col.label))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn int(&self, col: Col) -> Option<i64> {
        self.text(col)?.parse::<i64>().ok()
    }

    fn float(&self, col: Col) -> Option<f64> {
        self.text(col)?.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn is_header_repeat(&self) -> bool {
        self.text(DATE).is_none_or(|d| d == DATE.label)
    }
}

fn parse_table<T, F>(html: &str, table_id: &str, mut parse_row: F) -> Result<ParsedGameLog<T>>
where
    F: FnMut(&Row<'_>) -> Result<T, InvalidInput>,
{
    let doc = load_table_document(html, table_id)
        .ok_or_else(|| anyhow!("table #{table_id} not found"))?;
    let table_sel = selector(&format!("table#{table_id}"))?;
    let header_sel = selector("thead tr")?;
    let th_sel = selector("th")?;
    let body_row_sel = selector("tbody tr")?;
    let cell_sel = selector("th, td")?;

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| anyhow!("table #{table_id} not found"))?;

    let labels = table
        .select(&header_sel)
        .last()
        .map(|tr| tr.select(&th_sel).map(cell_text).collect::<Vec<_>>())
        .unwrap_or_default();

    let mut out = ParsedGameLog::default();
    for (idx, tr) in table.select(&body_row_sel).enumerate() {
        if has_class(&tr, "thead") || has_class(&tr, "spacer") {
            continue;
        }
        let mut row = Row {
            by_stat: HashMap::new(),
            by_label: HashMap::new(),
        };
        for (pos, cell) in tr.select(&cell_sel).enumerate() {
            let text = cell_text(cell);
            if let Some(stat) = cell.value().attr("data-stat") {
                row.by_stat.insert(stat, text.clone());
            }
            if let Some(label) = labels.get(pos) {
                row.by_label.insert(label.as_str(), text);
            }
        }
        if row.is_header_repeat() {
            continue;
        }
        match parse_row(&row) {
            Ok(game) => out.games.push(game),
            Err(reason) => out.skipped.push(SkippedRow {
                row: idx + 1,
                reason,
            }),
        }
    }
    Ok(out)
}

/// Some tables ship inside HTML comments and are revealed client-side.
fn load_table_document(html: &str, table_id: &str) -> Option<Html> {
    let needle = format!("id=\"{table_id}\"");
    if !html.contains(&needle) {
        return None;
    }
    let doc = Html::parse_document(html);
    let sel = Selector::parse(&format!("table#{table_id}")).ok()?;
    if doc.select(&sel).next().is_some() {
        return Some(doc);
    }
    let uncommented = html.replace("<!--", "").replace("-->", "");
    Some(Html::parse_document(&uncommented))
}

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|err| anyhow!("bad selector {raw:?}: {err}"))
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}
