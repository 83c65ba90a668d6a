use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, ErrorCode, params, params_from_iter};
use serde_json::{Map, Value};

use crate::game_identity::DATE_FORMAT;
use crate::game_record::{BattingGame, LogKind, PitchingGame};
use crate::http_cache::app_cache_dir;
use crate::team_summary::TeamSummary;
use crate::teams::TeamCode;

const REAL_DECIMALS: i32 = 3;

/// Result of a keyed insert. A primary-key hit is not an error: the game was
/// already written from the other club's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTable {
    Teams,
    Batting,
    Pitching,
    /// Batting game logs summed per team and season.
    TeamBattingSeason,
    /// Pitching game logs summed per team and season.
    TeamPitchingSeason,
}

impl FromStr for ExportTable {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "t" | "teams" => Ok(ExportTable::Teams),
            "b" | "batting" => Ok(ExportTable::Batting),
            "p" | "pitching" => Ok(ExportTable::Pitching),
            "tbs" | "team-batting" => Ok(ExportTable::TeamBattingSeason),
            "tps" | "team-pitching" => Ok(ExportTable::TeamPitchingSeason),
            other => Err(anyhow!(
                "invalid table {other:?}, expected t, b, p, tbs or tps"
            )),
        }
    }
}

/// Empty vectors mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub teams: Vec<TeamCode>,
    pub seasons: Vec<i32>,
}

/// Column-ordered query result, ready for JSON or CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rowset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Rowset {
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Map<_, _>>()
            })
            .collect()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_csv_line(&mut out, self.columns.iter().map(String::as_str));
        for row in &self.rows {
            let cells = row.iter().map(csv_cell).collect::<Vec<_>>();
            push_csv_line(&mut out, cells.iter().map(String::as_str));
        }
        out
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("baseball.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            team_code TEXT NOT NULL,
            league TEXT NOT NULL,
            division TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS team_seasons (
            team_id INTEGER NOT NULL,
            season INTEGER NOT NULL,
            wins INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (team_id, season),
            FOREIGN KEY (team_id) REFERENCES teams(id)
        );

        CREATE TABLE IF NOT EXISTS batting_games (
            game_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            season INTEGER NOT NULL,
            game_date TEXT NOT NULL,
            team_code TEXT NOT NULL,
            home_away TEXT NOT NULL,
            opp_code TEXT NOT NULL,
            result TEXT NOT NULL,
            runs_for INTEGER NOT NULL,
            runs_against INTEGER NOT NULL,
            pa INTEGER, ab INTEGER, r INTEGER, h INTEGER,
            doubles INTEGER, triples INTEGER, hr INTEGER, rbi INTEGER,
            bb INTEGER, ibb INTEGER, so INTEGER, hbp INTEGER,
            sh INTEGER, sf INTEGER, roe INTEGER, gdp INTEGER,
            sb INTEGER, cs INTEGER, lob INTEGER, players_used INTEGER,
            ba REAL, obp REAL, slg REAL, ops REAL,
            opp_starter_throws TEXT,
            PRIMARY KEY (game_id, team_id),
            FOREIGN KEY (team_id) REFERENCES teams(id)
        );
        CREATE INDEX IF NOT EXISTS idx_batting_season ON batting_games(season);
        CREATE INDEX IF NOT EXISTS idx_batting_date ON batting_games(game_date);

        CREATE TABLE IF NOT EXISTS pitching_games (
            game_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            season INTEGER NOT NULL,
            game_date TEXT NOT NULL,
            team_code TEXT NOT NULL,
            home_away TEXT NOT NULL,
            opp_code TEXT NOT NULL,
            result TEXT NOT NULL,
            runs_for INTEGER NOT NULL,
            runs_against INTEGER NOT NULL,
            h INTEGER, r INTEGER, er INTEGER, uer INTEGER,
            bb INTEGER, so INTEGER, hr INTEGER, hbp INTEGER,
            bf INTEGER, pitches INTEGER, strikes INTEGER,
            inherited_runners INTEGER, inherited_scored INTEGER,
            sb INTEGER, cs INTEGER, ab INTEGER,
            doubles INTEGER, triples INTEGER, ibb INTEGER,
            sh INTEGER, sf INTEGER, roe INTEGER, gdp INTEGER,
            pitchers_used INTEGER,
            ip REAL, era REAL,
            umpire TEXT, starting_pitcher TEXT, deciding_pitcher TEXT,
            PRIMARY KEY (game_id, team_id),
            FOREIGN KEY (team_id) REFERENCES teams(id)
        );
        CREATE INDEX IF NOT EXISTS idx_pitching_season ON pitching_games(season);
        CREATE INDEX IF NOT EXISTS idx_pitching_date ON pitching_games(game_date);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            season INTEGER NOT NULL,
            teams_total INTEGER NOT NULL,
            teams_succeeded INTEGER NOT NULL,
            rows_inserted INTEGER NOT NULL,
            rows_duplicate INTEGER NOT NULL,
            rows_rejected INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Writes the franchise row and its season record. Either half may already
/// exist; the returned outcome reflects the season record.
pub fn insert_team(conn: &Connection, team: &TeamSummary) -> Result<InsertOutcome> {
    classify_insert(conn.execute(
        "INSERT INTO teams (id, name, team_code, league, division) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            i64::from(team.id),
            team.name,
            team.code.as_str(),
            team.league,
            team.division
        ],
    ))
    .context("insert team")?;

    classify_insert(conn.execute(
        "INSERT INTO team_seasons (team_id, season, wins, losses) VALUES (?1, ?2, ?3, ?4)",
        params![
            i64::from(team.id),
            team.season,
            i64::from(team.wins),
            i64::from(team.losses)
        ],
    ))
    .context("insert team season")
}

pub fn insert_batting_game(conn: &Connection, game: &BattingGame) -> Result<InsertOutcome> {
    let rec = &game.record;
    let l = &game.line;
    classify_insert(conn.execute(
        r#"
        INSERT INTO batting_games (
            game_id, team_id, season, game_date, team_code, home_away, opp_code,
            result, runs_for, runs_against,
            pa, ab, r, h, doubles, triples, hr, rbi, bb, ibb, so, hbp,
            sh, sf, roe, gdp, sb, cs, lob, players_used,
            ba, obp, slg, ops, opp_starter_throws
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
            ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
            ?31, ?32, ?33, ?34, ?35
        )
        "#,
        params![
            rec.identity().as_i64(),
            i64::from(rec.team.team_id()),
            rec.season,
            rec.date.format(DATE_FORMAT).to_string(),
            rec.team.as_str(),
            rec.side.as_code(),
            rec.opponent.as_str(),
            rec.result.as_code(),
            i64::from(rec.runs_for),
            i64::from(rec.runs_against),
            l.plate_appearances,
            l.at_bats,
            l.runs,
            l.hits,
            l.doubles,
            l.triples,
            l.home_runs,
            l.rbi,
            l.walks,
            l.intentional_walks,
            l.strikeouts,
            l.hit_by_pitch,
            l.sac_hits,
            l.sac_flies,
            l.reached_on_error,
            l.gidp,
            l.stolen_bases,
            l.caught_stealing,
            l.left_on_base,
            l.players_used,
            l.batting_avg,
            l.onbase_pct,
            l.slugging_pct,
            l.ops,
            l.opp_starter_throws,
        ],
    ))
    .with_context(|| format!("insert batting game {} {}", rec.team, rec.date))
}

pub fn insert_pitching_game(conn: &Connection, game: &PitchingGame) -> Result<InsertOutcome> {
    let rec = &game.record;
    let l = &game.line;
    classify_insert(conn.execute(
        r#"
        INSERT INTO pitching_games (
            game_id, team_id, season, game_date, team_code, home_away, opp_code,
            result, runs_for, runs_against,
            h, r, er, uer, bb, so, hr, hbp, bf, pitches, strikes,
            inherited_runners, inherited_scored, sb, cs, ab, doubles, triples,
            ibb, sh, sf, roe, gdp, pitchers_used, ip, era,
            umpire, starting_pitcher, deciding_pitcher
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21,
            ?22, ?23, ?24, ?25, ?26, ?27, ?28,
            ?29, ?30, ?31, ?32, ?33, ?34, ?35, ?36,
            ?37, ?38, ?39
        )
        "#,
        params![
            rec.identity().as_i64(),
            i64::from(rec.team.team_id()),
            rec.season,
            rec.date.format(DATE_FORMAT).to_string(),
            rec.team.as_str(),
            rec.side.as_code(),
            rec.opponent.as_str(),
            rec.result.as_code(),
            i64::from(rec.runs_for),
            i64::from(rec.runs_against),
            l.hits,
            l.runs,
            l.earned_runs,
            l.unearned_runs,
            l.walks,
            l.strikeouts,
            l.home_runs,
            l.hit_by_pitch,
            l.batters_faced,
            l.pitches,
            l.strikes,
            l.inherited_runners,
            l.inherited_scored,
            l.stolen_bases,
            l.caught_stealing,
            l.at_bats,
            l.doubles,
            l.triples,
            l.intentional_walks,
            l.sac_hits,
            l.sac_flies,
            l.reached_on_error,
            l.gidp,
            l.pitchers_used,
            l.innings_pitched,
            l.era,
            l.umpire,
            l.starting_pitcher,
            l.deciding_pitcher,
        ],
    ))
    .with_context(|| format!("insert pitching game {} {}", rec.team, rec.date))
}

pub fn team_exists(conn: &Connection, code: TeamCode, season: i32) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT COUNT(*) FROM team_seasons WHERE team_id = ?1 AND season = ?2",
            params![i64::from(code.team_id()), season],
            |row| row.get::<_, i64>(0),
        )
        .context("query team season")?;
    Ok(found > 0)
}

pub fn count_games(conn: &Connection, kind: LogKind) -> Result<usize> {
    let sql = match kind {
        LogKind::Batting => "SELECT COUNT(*) FROM batting_games",
        LogKind::Pitching => "SELECT COUNT(*) FROM pitching_games",
    };
    let n = conn
        .query_row(sql, [], |row| row.get::<_, i64>(0))
        .with_context(|| format!("count {} games", kind.label()))?;
    Ok(usize::try_from(n).unwrap_or_default())
}

/// Teams table, a game-log table with `Team`, `Game` and `Score` label
/// columns in front of the stored fields, or a team-season aggregate led by
/// `Name` and `Record`.
pub fn select_rows(conn: &Connection, table: ExportTable, filter: &RowFilter) -> Result<Rowset> {
    let (team_col, season_col) = match table {
        ExportTable::Teams => ("t.team_code", "ts.season"),
        _ => ("g.team_code", "g.season"),
    };

    let mut clauses = Vec::new();
    let mut args: Vec<SqlValue> = Vec::new();
    if !filter.teams.is_empty() {
        clauses.push(format!("{team_col} IN ({})", placeholders(filter.teams.len())));
        args.extend(
            filter
                .teams
                .iter()
                .map(|code| SqlValue::Text(code.as_str().to_string())),
        );
    }
    if !filter.seasons.is_empty() {
        clauses.push(format!(
            "{season_col} IN ({})",
            placeholders(filter.seasons.len())
        ));
        args.extend(filter.seasons.iter().map(|s| SqlValue::Integer(i64::from(*s))));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = export_query(table, &where_sql);

    let mut stmt = conn.prepare(&sql).context("prepare export query")?;
    let columns = stmt
        .column_names()
        .into_iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();
    let width = columns.len();
    let rows = stmt
        .query_map(params_from_iter(args), |row| {
            let mut out = Vec::with_capacity(width);
            for idx in 0..width {
                out.push(json_value(row.get_ref(idx)?));
            }
            Ok(out)
        })
        .context("query export rows")?;

    let mut set = Rowset {
        columns,
        rows: Vec::new(),
    };
    for row in rows {
        set.rows.push(row.context("decode export row")?);
    }
    Ok(set)
}

pub fn start_ingest_run(conn: &Connection, season: i32, teams_total: usize) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, season, teams_total, teams_succeeded,
             rows_inserted, rows_duplicate, rows_rejected, errors_json)
         VALUES (?1, NULL, ?2, ?3, 0, 0, 0, 0, '[]')",
        params![Utc::now().to_rfc3339(), season, teams_total as i64],
    )
    .context("insert ingest run")?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, Default)]
pub struct RunTotals<'a> {
    pub teams_succeeded: usize,
    pub rows_inserted: usize,
    pub rows_duplicate: usize,
    pub rows_rejected: usize,
    pub errors: &'a [String],
}

pub fn finish_ingest_run(conn: &Connection, run_id: i64, totals: &RunTotals<'_>) -> Result<()> {
    let errors_json = serde_json::to_string(totals.errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, teams_succeeded = ?2, rows_inserted = ?3,
             rows_duplicate = ?4, rows_rejected = ?5, errors_json = ?6
         WHERE run_id = ?7",
        params![
            Utc::now().to_rfc3339(),
            totals.teams_succeeded as i64,
            totals.rows_inserted as i64,
            totals.rows_duplicate as i64,
            totals.rows_rejected as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;
    Ok(())
}

fn export_query(table: ExportTable, where_sql: &str) -> String {
    match table {
        ExportTable::Teams => format!(
            "SELECT t.id, t.name, t.team_code, t.league, t.division, \
             ts.season, ts.wins, ts.losses, (ts.wins || '-' || ts.losses) AS record \
             FROM teams t JOIN team_seasons ts ON ts.team_id = t.id{where_sql} \
             ORDER BY ts.season, t.team_code"
        ),
        ExportTable::Batting => game_log_query("batting_games", where_sql),
        ExportTable::Pitching => game_log_query("pitching_games", where_sql),
        ExportTable::TeamBattingSeason => season_query(
            "batting_games",
            "SUM(g.pa) AS pa, SUM(g.ab) AS ab, SUM(g.r) AS r, SUM(g.h) AS h, \
             SUM(g.doubles) AS doubles, SUM(g.triples) AS triples, SUM(g.hr) AS hr, \
             SUM(g.rbi) AS rbi, SUM(g.bb) AS bb, SUM(g.ibb) AS ibb, SUM(g.so) AS so, \
             SUM(g.hbp) AS hbp, SUM(g.sh) AS sh, SUM(g.sf) AS sf, SUM(g.roe) AS roe, \
             SUM(g.gdp) AS gdp, SUM(g.sb) AS sb, SUM(g.cs) AS cs, SUM(g.lob) AS lob",
            "ROUND(CAST(s.h AS REAL) / NULLIF(s.ab, 0), 3) AS ba, \
             ROUND(CAST(s.h + s.bb + s.hbp AS REAL) / NULLIF(s.ab + s.bb + s.hbp + s.sf, 0), 3) AS obp, \
             ROUND(CAST(s.h + s.doubles + 2 * s.triples + 3 * s.hr AS REAL) / NULLIF(s.ab, 0), 3) AS slg, \
             ROUND(CAST(s.h + s.bb + s.hbp AS REAL) / NULLIF(s.ab + s.bb + s.hbp + s.sf, 0) \
                 + CAST(s.h + s.doubles + 2 * s.triples + 3 * s.hr AS REAL) / NULLIF(s.ab, 0), 3) AS ops",
            where_sql,
        ),
        // `ip` is stored in box-score notation (6.2 = six and two thirds), so
        // innings are summed as outs.
        ExportTable::TeamPitchingSeason => season_query(
            "pitching_games",
            "SUM(g.h) AS h, SUM(g.r) AS r, SUM(g.er) AS er, SUM(g.uer) AS uer, \
             SUM(g.bb) AS bb, SUM(g.so) AS so, SUM(g.hr) AS hr, SUM(g.hbp) AS hbp, \
             SUM(g.bf) AS bf, SUM(g.pitches) AS pitches, SUM(g.strikes) AS strikes, \
             SUM(g.inherited_runners) AS inherited_runners, \
             SUM(g.inherited_scored) AS inherited_scored, SUM(g.sb) AS sb, SUM(g.cs) AS cs, \
             SUM(g.ab) AS ab, SUM(g.doubles) AS doubles, SUM(g.triples) AS triples, \
             SUM(g.ibb) AS ibb, SUM(g.sh) AS sh, SUM(g.sf) AS sf, SUM(g.roe) AS roe, \
             SUM(g.gdp) AS gdp, \
             SUM(CAST(g.ip AS INTEGER) * 3 \
                 + CAST(ROUND((g.ip - CAST(g.ip AS INTEGER)) * 10) AS INTEGER)) AS outs",
            "(s.outs / 3) + (s.outs % 3) / 10.0 AS ip, \
             ROUND(27.0 * s.er / NULLIF(s.outs, 0), 2) AS era, \
             ROUND(3.0 * (s.bb + s.h) / NULLIF(s.outs, 0), 3) AS whip",
            where_sql,
        ),
    }
}

fn game_log_query(source: &str, where_sql: &str) -> String {
    format!(
        "SELECT g.team_code AS Team, \
         g.team_code || CASE g.home_away WHEN 'H' THEN ' vs. ' ELSE ' @ ' END || g.opp_code AS Game, \
         g.runs_for || '-' || g.runs_against AS Score, g.* \
         FROM {source} g{where_sql} \
         ORDER BY g.game_date, g.team_code"
    )
}

/// Sums `source` per team and season, then joins the franchise name and the
/// season record. `rates` is evaluated over the summed columns (`s.*`).
fn season_query(source: &str, totals: &str, rates: &str, where_sql: &str) -> String {
    format!(
        "SELECT t.name AS Name, (ts.wins || '-' || ts.losses) AS Record, s.*, {rates} \
         FROM (SELECT g.team_id, g.team_code, g.season, COUNT(*) AS games, \
                      SUM(g.runs_for) AS runs_for, SUM(g.runs_against) AS runs_against, {totals} \
               FROM {source} g{where_sql} \
               GROUP BY g.team_id, g.season) s \
         JOIN teams t ON t.id = s.team_id \
         JOIN team_seasons ts ON ts.team_id = s.team_id AND ts.season = s.season \
         ORDER BY s.season, s.team_code"
    )
}

fn classify_insert(result: rusqlite::Result<usize>) -> Result<InsertOutcome> {
    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Ok(InsertOutcome::Duplicate)
        }
        Err(err) => Err(err.into()),
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn json_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => {
            let scale = 10f64.powi(REAL_DECIMALS);
            serde_json::Number::from_f64((f * scale).round() / scale)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

fn csv_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_csv_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_table_codes() {
        assert_eq!("t".parse::<ExportTable>().unwrap(), ExportTable::Teams);
        assert_eq!("pitching".parse::<ExportTable>().unwrap(), ExportTable::Pitching);
        assert!("x".parse::<ExportTable>().is_err());
    }

    #[test]
    fn csv_quotes_when_needed() {
        let set = Rowset {
            columns: vec!["name".into(), "n".into()],
            rows: vec![vec![Value::from("Smith, J"), Value::Null]],
        };
        assert_eq!(set.to_csv(), "name,n\n\"Smith, J\",\n");
    }

    #[test]
    fn reals_round_to_three_places() {
        assert_eq!(json_value(ValueRef::Real(0.26666)), Value::from(0.267));
    }
}
