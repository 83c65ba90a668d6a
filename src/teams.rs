use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Franchise codes as baseball-reference spells them for the 2020 season.
pub const MLB_TEAM_CODES: &[&str] = &[
    "ARI", "ATL", "BAL", "BOS", "CHC", "CHW", "CIN", "CLE", "COL", "DET", "HOU", "KCR", "LAA",
    "LAD", "MIA", "MIL", "MIN", "NYM", "NYY", "OAK", "PHI", "PIT", "SDP", "SFG", "SEA", "STL",
    "TBR", "TEX", "TOR", "WSN",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("team code must be three ascii letters, got {0:?}")]
pub struct TeamCodeError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown team code {0}")]
pub struct UnknownTeam(pub TeamCode);

/// Three-letter uppercase franchise code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamCode([u8; 3]);

impl TeamCode {
    pub fn as_str(&self) -> &str {
        // Only ascii letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Deterministic numeric id used as the `team_id` key column.
    ///
    /// `(1 + c1) * c0 + 2 * c1 + 3 * c2` over the ascii values. Stable across
    /// runs and machines, so rows written by older databases keep their keys.
    pub fn team_id(&self) -> u32 {
        let [c0, c1, c2] = self.0.map(u32::from);
        (1 + c1) * c0 + 2 * c1 + 3 * c2
    }
}

impl FromStr for TeamCode {
    type Err = TeamCodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(TeamCodeError(raw.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }
}

impl TryFrom<String> for TeamCode {
    type Error = TeamCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TeamCode> for String {
    fn from(code: TeamCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable code -> id table handed to the ingest pipeline at startup.
#[derive(Debug, Clone)]
pub struct TeamDirectory {
    teams: BTreeMap<TeamCode, u32>,
}

impl TeamDirectory {
    pub fn mlb() -> Self {
        Self::from_codes(
            MLB_TEAM_CODES
                .iter()
                .filter_map(|code| code.parse::<TeamCode>().ok()),
        )
    }

    pub fn from_codes(codes: impl IntoIterator<Item = TeamCode>) -> Self {
        let teams = codes
            .into_iter()
            .map(|code| (code, code.team_id()))
            .collect();
        Self { teams }
    }

    /// Narrow the directory to `codes`; any code outside it is an error.
    pub fn subset(&self, codes: &[TeamCode]) -> Result<Self, UnknownTeam> {
        let mut teams = BTreeMap::new();
        for code in codes {
            let id = self.resolve(code)?;
            teams.insert(*code, id);
        }
        Ok(Self { teams })
    }

    pub fn resolve(&self, code: &TeamCode) -> Result<u32, UnknownTeam> {
        self.teams.get(code).copied().ok_or(UnknownTeam(*code))
    }

    pub fn contains(&self, code: &TeamCode) -> bool {
        self.teams.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = TeamCode> + '_ {
        self.teams.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

impl Default for TeamDirectory {
    fn default() -> Self {
        Self::mlb()
    }
}

/// Split a `PHI,MIA nym` style list into codes, dropping duplicates.
pub fn parse_team_codes(raw: &str) -> Result<Vec<TeamCode>, TeamCodeError> {
    let mut out: Vec<TeamCode> = Vec::new();
    for part in raw.split([',', ';', ' ']).filter(|s| !s.trim().is_empty()) {
        let code = part.parse::<TeamCode>()?;
        if !out.contains(&code) {
            out.push(code);
        }
    }
    Ok(out)
}
