use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::gamelog_dataset;
use crate::teams::{TeamCode, TeamDirectory, parse_team_codes};

pub const DEFAULT_SEASON: i32 = 2020;
const DEFAULT_REQUEST_DELAY_MS: u64 = 3000;

/// Loads `.env.local` then `.env`; already-set variables win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Logging goes to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub db_path: PathBuf,
    pub season: i32,
    pub teams: Vec<TeamCode>,
    pub request_delay: Duration,
}

impl IngestConfig {
    /// Environment first (`MLB_DB_PATH`, `MLB_SEASON`, `MLB_TEAMS`,
    /// `MLB_REQUEST_DELAY_MS`), then `--db`, `--season`, `--teams` on top.
    pub fn resolve(args: &[String]) -> Result<Self> {
        let db_path = resolve_db_path(args)?;

        let season = match arg_value(args, "--season").or_else(|| env_nonempty("MLB_SEASON")) {
            Some(raw) => parse_season(&raw)?,
            None => DEFAULT_SEASON,
        };

        let teams = match arg_value(args, "--teams").or_else(|| env_nonempty("MLB_TEAMS")) {
            Some(raw) => parse_team_codes(&raw)?,
            None => Vec::new(),
        };

        let delay_ms = match env_nonempty("MLB_REQUEST_DELAY_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid MLB_REQUEST_DELAY_MS {raw:?}"))?,
            None => DEFAULT_REQUEST_DELAY_MS,
        };

        Ok(Self {
            db_path,
            season,
            teams,
            request_delay: Duration::from_millis(delay_ms),
        })
    }

    /// The full league unless a subset was configured.
    pub fn directory(&self) -> Result<TeamDirectory> {
        let all = TeamDirectory::mlb();
        if self.teams.is_empty() {
            return Ok(all);
        }
        Ok(all.subset(&self.teams)?)
    }
}

/// `--db`, then a non-empty `MLB_DB_PATH`, then the cache-dir default.
pub fn resolve_db_path(args: &[String]) -> Result<PathBuf> {
    pick_db_path(arg_value(args, "--db"), std::env::var("MLB_DB_PATH").ok())
}

fn pick_db_path(flag: Option<String>, env: Option<String>) -> Result<PathBuf> {
    flag.or_else(|| env.filter(|v| !v.trim().is_empty()))
        .map(PathBuf::from)
        .or_else(gamelog_dataset::default_db_path)
        .context("unable to resolve sqlite path")
}

pub fn parse_season(raw: &str) -> Result<i32> {
    let season = raw
        .trim()
        .parse::<i32>()
        .with_context(|| format!("invalid season {raw:?}"))?;
    if !(1871..=2100).contains(&season) {
        return Err(anyhow!("season {season} out of range"));
    }
    Ok(season)
}

/// `2019,2020` or `2019 2020`; sorted, duplicates dropped.
pub fn parse_seasons(raw: &str) -> Result<Vec<i32>> {
    let mut seasons = raw
        .split(|ch: char| ch == ',' || ch == ';' || ch.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(parse_season)
        .collect::<Result<Vec<_>>>()?;
    seasons.sort_unstable();
    seasons.dedup();
    Ok(seasons)
}

/// `--name=value` or `--name value`.
pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn arg_forms() {
        let a = args(&["--db=/tmp/x.sqlite", "--season", "2021"]);
        assert_eq!(arg_value(&a, "--db").as_deref(), Some("/tmp/x.sqlite"));
        assert_eq!(arg_value(&a, "--season").as_deref(), Some("2021"));
        assert_eq!(arg_value(&a, "--teams"), None);
        assert_eq!(arg_value(&args(&["--teams"]), "--teams"), None);
    }

    #[test]
    fn season_bounds() {
        assert_eq!(parse_season("2020").unwrap(), 2020);
        assert!(parse_season("20").is_err());
        assert!(parse_season("abc").is_err());
    }

    #[test]
    fn season_lists() {
        assert_eq!(parse_seasons("2020").unwrap(), vec![2020]);
        assert_eq!(parse_seasons("2020, 2019,2020").unwrap(), vec![2019, 2020]);
        assert!(parse_seasons("2019,19").is_err());
        assert!(parse_seasons(" , ").unwrap().is_empty());
    }

    #[test]
    fn db_path_precedence() {
        let path = resolve_db_path(&args(&["--db=/tmp/flag.sqlite"])).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/flag.sqlite"));
        let path = pick_db_path(None, Some("/tmp/env.sqlite".into())).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/env.sqlite"));
        // A blank MLB_DB_PATH counts as unset.
        assert_eq!(
            pick_db_path(None, Some("  ".into())).ok(),
            gamelog_dataset::default_db_path()
        );
    }

    #[test]
    fn args_override_defaults() {
        let cfg = IngestConfig::resolve(&args(&[
            "--db",
            "/tmp/mlb.sqlite",
            "--season=2019",
            "--teams=phi,MIA",
        ]))
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/mlb.sqlite"));
        assert_eq!(cfg.season, 2019);
        assert_eq!(cfg.directory().unwrap().len(), 2);
    }
}
