use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::game_record::LogKind;
use crate::gamelog_dataset::{self, InsertOutcome, RunTotals};
use crate::gamelog_parse::{ParsedGameLog, parse_batting_gamelog, parse_pitching_gamelog};
use crate::http_cache::fetch_text_cached;
use crate::http_client::http_client;
use crate::team_summary::parse_team_summary;
use crate::teams::{TeamCode, TeamDirectory};

const GAMELOG_URL: &str = "https://www.baseball-reference.com/teams/tgl.cgi";

/// Where game-log pages come from. The live source is baseball-reference;
/// tests hand in saved pages.
pub trait PageSource {
    fn fetch_gamelog(&self, team: TeamCode, kind: LogKind, season: i32) -> Result<String>;
}

pub fn gamelog_url(team: TeamCode, kind: LogKind, season: i32) -> String {
    format!(
        "{GAMELOG_URL}?team={team}&t={}&year={season}",
        kind.url_flag()
    )
}

#[derive(Debug, Clone, Default)]
pub struct HttpPageSource {
    delay: Duration,
}

impl HttpPageSource {
    /// `delay` is slept before every request; the site rate limits scrapers.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl PageSource for HttpPageSource {
    fn fetch_gamelog(&self, team: TeamCode, kind: LogKind, season: i32) -> Result<String> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let url = gamelog_url(team, kind, season);
        debug!(%url, "fetching game log");
        let client = http_client()?;
        fetch_text_cached(client, &url)
            .with_context(|| format!("fetch {} game log for {team}", kind.label()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub inserted: usize,
    pub duplicate: usize,
    pub rejected: usize,
}

impl RowCounts {
    fn absorb(&mut self, other: &RowCounts) {
        self.inserted += other.inserted;
        self.duplicate += other.duplicate;
        self.rejected += other.rejected;
    }
}

#[derive(Debug, Clone)]
pub struct TeamIngestSummary {
    pub team: TeamCode,
    pub team_inserted: bool,
    pub batting: RowCounts,
    pub pitching: RowCounts,
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: Option<PathBuf>,
    pub season: i32,
    pub teams_total: usize,
    pub teams_succeeded: usize,
    pub rows: RowCounts,
    pub per_team: Vec<TeamIngestSummary>,
    pub errors: Vec<String>,
}

/// Scrape and store every team in `directory`, one after another.
///
/// A team that fails is recorded in `errors` and the run moves on.
pub fn ingest_teams(
    conn: &mut Connection,
    source: &dyn PageSource,
    directory: &TeamDirectory,
    season: i32,
) -> Result<IngestSummary> {
    if directory.is_empty() {
        return Err(anyhow!("no teams to ingest"));
    }

    let run_id = gamelog_dataset::start_ingest_run(conn, season, directory.len())?;
    let mut per_team = Vec::new();
    let mut errors = Vec::new();
    let mut rows = RowCounts::default();

    for team in directory.codes() {
        info!(%team, season, "ingesting team");
        match ingest_single_team(conn, source, team, season) {
            Ok(summary) => {
                rows.absorb(&summary.batting);
                rows.absorb(&summary.pitching);
                info!(
                    %team,
                    batting = summary.batting.inserted,
                    pitching = summary.pitching.inserted,
                    duplicates = summary.batting.duplicate + summary.pitching.duplicate,
                    "team done"
                );
                per_team.push(summary);
            }
            Err(err) => {
                warn!(%team, "team failed: {err:#}");
                errors.push(format!("{team}: {err:#}"));
            }
        }
    }

    gamelog_dataset::finish_ingest_run(
        conn,
        run_id,
        &RunTotals {
            teams_succeeded: per_team.len(),
            rows_inserted: rows.inserted,
            rows_duplicate: rows.duplicate,
            rows_rejected: rows.rejected,
            errors: &errors,
        },
    )?;

    Ok(IngestSummary {
        db_path: conn.path().filter(|p| !p.is_empty()).map(PathBuf::from),
        season,
        teams_total: directory.len(),
        teams_succeeded: per_team.len(),
        rows,
        per_team,
        errors,
    })
}

/// Both pages are fetched and parsed before anything is written, so a team
/// is either stored whole or not at all.
pub fn ingest_single_team(
    conn: &mut Connection,
    source: &dyn PageSource,
    team: TeamCode,
    season: i32,
) -> Result<TeamIngestSummary> {
    let batting_html = source.fetch_gamelog(team, LogKind::Batting, season)?;
    let summary = parse_team_summary(&batting_html, team, season)?;
    let batting = parse_batting_gamelog(&batting_html, team, season)?;
    let pitching_html = source.fetch_gamelog(team, LogKind::Pitching, season)?;
    let pitching = parse_pitching_gamelog(&pitching_html, team, season)?;
    log_skipped(team, LogKind::Batting, &batting);
    log_skipped(team, LogKind::Pitching, &pitching);

    let tx = conn.transaction().context("begin team transaction")?;
    let team_inserted = gamelog_dataset::insert_team(&tx, &summary)? == InsertOutcome::Inserted;

    let mut batting_counts = RowCounts {
        rejected: batting.skipped.len(),
        ..RowCounts::default()
    };
    for game in &batting.games {
        tally(
            &mut batting_counts,
            gamelog_dataset::insert_batting_game(&tx, game)?,
        );
    }

    let mut pitching_counts = RowCounts {
        rejected: pitching.skipped.len(),
        ..RowCounts::default()
    };
    for game in &pitching.games {
        tally(
            &mut pitching_counts,
            gamelog_dataset::insert_pitching_game(&tx, game)?,
        );
    }
    tx.commit().context("commit team transaction")?;

    Ok(TeamIngestSummary {
        team,
        team_inserted,
        batting: batting_counts,
        pitching: pitching_counts,
    })
}

fn tally(counts: &mut RowCounts, outcome: InsertOutcome) {
    match outcome {
        InsertOutcome::Inserted => counts.inserted += 1,
        InsertOutcome::Duplicate => counts.duplicate += 1,
    }
}

fn log_skipped<T>(team: TeamCode, kind: LogKind, parsed: &ParsedGameLog<T>) {
    for skipped in &parsed.skipped {
        warn!(
            %team,
            log = kind.label(),
            row = skipped.row,
            "row skipped: {}",
            skipped.reason
        );
    }
}
