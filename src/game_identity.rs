//! Deterministic game ids shared by both teams' box-score lines.
//!
//! A game scraped from the home team's log and the same game scraped from the
//! away team's log must land on the same `game_id`, so the second insert trips
//! the `(game_id, team_id)` primary key instead of creating a new game.
//!
//! Doubleheaders between the same two clubs on the same day are told apart
//! only by the final score. Two such games with an identical score collide.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::teams::TeamCode;

/// Upper bound (exclusive) of every identity; fits a signed 32-bit column.
pub const IDENTITY_MODULUS: u64 = i32::MAX as u64;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Date,
    HomeTeam,
    AwayTeam,
    HomeScore,
    AwayScore,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputField::Date => "date",
            InputField::HomeTeam => "home team code",
            InputField::AwayTeam => "away team code",
            InputField::HomeScore => "home score",
            InputField::AwayScore => "away score",
        };
        f.write_str(name)
    }
}

/// Row data that cannot be turned into an identity. Callers skip the row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {value:?}")]
pub struct InvalidInput {
    pub field: InputField,
    pub value: String,
}

impl InvalidInput {
    pub fn new(field: InputField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    /// Game logs mark road games with `@` and leave home games blank.
    pub fn from_marker(raw: &str) -> Self {
        match raw.trim() {
            "@" | "A" => HomeAway::Away,
            _ => HomeAway::Home,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            HomeAway::Home => "H",
            HomeAway::Away => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameIdentity(u32);

impl GameIdentity {
    pub fn derive(
        date: NaiveDate,
        home: TeamCode,
        away: TeamCode,
        home_score: u32,
        away_score: u32,
    ) -> Self {
        let canonical = Self::canonical_string(date, home, away, home_score, away_score);
        Self(reduce_digest(&Sha256::digest(canonical.as_bytes())))
    }

    /// Away team first, whichever side the row was scraped from.
    pub fn canonical_string(
        date: NaiveDate,
        home: TeamCode,
        away: TeamCode,
        home_score: u32,
        away_score: u32,
    ) -> String {
        format!(
            "{}{away}{away_score}{home}{home_score}",
            date.format(DATE_FORMAT)
        )
    }

    /// Orient one team's line into home/away roles, then derive.
    pub fn from_perspective(
        date: NaiveDate,
        own: TeamCode,
        opponent: TeamCode,
        side: HomeAway,
        own_score: u32,
        opponent_score: u32,
    ) -> Self {
        match side {
            HomeAway::Home => Self::derive(date, own, opponent, own_score, opponent_score),
            HomeAway::Away => Self::derive(date, opponent, own, opponent_score, own_score),
        }
    }

    /// Derive from unparsed scrape cells. `None` or a non-numeric score is
    /// how suspended and unfinished games show up.
    pub fn derive_raw(
        date: &str,
        home: &str,
        away: &str,
        home_score: Option<&str>,
        away_score: Option<&str>,
    ) -> Result<Self, InvalidInput> {
        let date = parse_game_date(date)?;
        let home = home
            .parse::<TeamCode>()
            .map_err(|_| InvalidInput::new(InputField::HomeTeam, home))?;
        let away = away
            .parse::<TeamCode>()
            .map_err(|_| InvalidInput::new(InputField::AwayTeam, away))?;
        let home_score = parse_score(home_score, InputField::HomeScore)?;
        let away_score = parse_score(away_score, InputField::AwayScore)?;
        Ok(Self::derive(date, home, away, home_score, away_score))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for GameIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn parse_game_date(raw: &str) -> Result<NaiveDate, InvalidInput> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| InvalidInput::new(InputField::Date, raw))
}

fn parse_score(raw: Option<&str>, field: InputField) -> Result<u32, InvalidInput> {
    let raw = raw.ok_or_else(|| InvalidInput::new(field, ""))?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| InvalidInput::new(field, raw))
}

/// Big-endian digest as one unsigned integer, modulo `IDENTITY_MODULUS`.
fn reduce_digest(digest: &[u8]) -> u32 {
    let rem = digest
        .iter()
        .fold(0u64, |acc, byte| ((acc << 8) | u64::from(*byte)) % IDENTITY_MODULUS);
    // rem < i32::MAX
    rem as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> TeamCode {
        raw.parse().unwrap()
    }

    fn day(raw: &str) -> NaiveDate {
        parse_game_date(raw).unwrap()
    }

    #[test]
    fn canonical_string_lists_away_first() {
        let s = GameIdentity::canonical_string(day("2020-07-25"), code("PHI"), code("MIA"), 2, 5);
        assert_eq!(s, "2020-07-25MIA5PHI2");
    }

    #[test]
    fn matches_known_digest_reduction() {
        let id = GameIdentity::derive(day("2020-07-25"), code("PHI"), code("MIA"), 2, 5);
        assert_eq!(id.value(), 1_233_712_716);
    }

    #[test]
    fn reduce_digest_small_inputs() {
        assert_eq!(reduce_digest(&[0, 0, 1, 0]), 256);
        assert_eq!(reduce_digest(&[0x7f, 0xff, 0xff, 0xff]), 0);
        assert_eq!(reduce_digest(&[0x80, 0x00, 0x00, 0x00]), 1);
    }

    #[test]
    fn raw_rejects_bad_cells() {
        let err = GameIdentity::derive_raw("Jul 25", "PHI", "MIA", Some("2"), Some("5")).unwrap_err();
        assert_eq!(err.field, InputField::Date);

        let err = GameIdentity::derive_raw("2020-07-25", "PHI", "MIA", None, Some("5")).unwrap_err();
        assert_eq!(err.field, InputField::HomeScore);

        let err =
            GameIdentity::derive_raw("2020-07-25", "PHI", "MIA", Some("2"), Some("susp")).unwrap_err();
        assert_eq!(err.field, InputField::AwayScore);
        assert_eq!(err.value, "susp");

        let err = GameIdentity::derive_raw("2020-07-25", "PH", "MIA", Some("2"), Some("5")).unwrap_err();
        assert_eq!(err.field, InputField::HomeTeam);
    }

    #[test]
    fn raw_agrees_with_typed() {
        let raw = GameIdentity::derive_raw("2020-07-25", "phi", "MIA", Some(" 2"), Some("5")).unwrap();
        let typed = GameIdentity::derive(day("2020-07-25"), code("PHI"), code("MIA"), 2, 5);
        assert_eq!(raw, typed);
    }

    #[test]
    fn home_away_marker() {
        assert_eq!(HomeAway::from_marker("@"), HomeAway::Away);
        assert_eq!(HomeAway::from_marker(""), HomeAway::Home);
        assert_eq!(HomeAway::from_marker(" "), HomeAway::Home);
    }
}
