use chrono::NaiveDate;

use crate::game_identity::{GameIdentity, HomeAway};
use crate::teams::TeamCode;

/// Which side of the box score a game log covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Batting,
    Pitching,
}

impl LogKind {
    /// Value of the `t=` query parameter on `tgl.cgi`.
    pub fn url_flag(&self) -> &'static str {
        match self {
            LogKind::Batting => "b",
            LogKind::Pitching => "p",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogKind::Batting => "batting",
            LogKind::Pitching => "pitching",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Tie,
}

impl GameResult {
    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().chars().next()? {
            'W' | 'w' => Some(GameResult::Win),
            'L' | 'l' => Some(GameResult::Loss),
            'T' | 't' => Some(GameResult::Tie),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            GameResult::Win => "W",
            GameResult::Loss => "L",
            GameResult::Tie => "T",
        }
    }
}

/// One team's line for one game, from that team's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub season: i32,
    pub date: NaiveDate,
    pub team: TeamCode,
    pub opponent: TeamCode,
    pub side: HomeAway,
    pub result: GameResult,
    pub runs_for: u32,
    pub runs_against: u32,
}

impl GameRecord {
    pub fn identity(&self) -> GameIdentity {
        GameIdentity::from_perspective(
            self.date,
            self.team,
            self.opponent,
            self.side,
            self.runs_for,
            self.runs_against,
        )
    }

    /// `PHI vs. MIA` at home, `MIA @ PHI` on the road.
    pub fn matchup(&self) -> String {
        match self.side {
            HomeAway::Home => format!("{} vs. {}", self.team, self.opponent),
            HomeAway::Away => format!("{} @ {}", self.team, self.opponent),
        }
    }

    pub fn score_label(&self) -> String {
        format!("{}-{}", self.runs_for, self.runs_against)
    }

    pub fn home_team(&self) -> TeamCode {
        match self.side {
            HomeAway::Home => self.team,
            HomeAway::Away => self.opponent,
        }
    }

    pub fn away_team(&self) -> TeamCode {
        match self.side {
            HomeAway::Home => self.opponent,
            HomeAway::Away => self.team,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BattingLine {
    pub plate_appearances: Option<i64>,
    pub at_bats: Option<i64>,
    pub runs: Option<i64>,
    pub hits: Option<i64>,
    pub doubles: Option<i64>,
    pub triples: Option<i64>,
    pub home_runs: Option<i64>,
    pub rbi: Option<i64>,
    pub walks: Option<i64>,
    pub intentional_walks: Option<i64>,
    pub strikeouts: Option<i64>,
    pub hit_by_pitch: Option<i64>,
    pub sac_hits: Option<i64>,
    pub sac_flies: Option<i64>,
    pub reached_on_error: Option<i64>,
    pub gidp: Option<i64>,
    pub stolen_bases: Option<i64>,
    pub caught_stealing: Option<i64>,
    pub left_on_base: Option<i64>,
    pub players_used: Option<i64>,
    pub batting_avg: Option<f64>,
    pub onbase_pct: Option<f64>,
    pub slugging_pct: Option<f64>,
    pub ops: Option<f64>,
    pub opp_starter_throws: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchingLine {
    pub hits: Option<i64>,
    pub runs: Option<i64>,
    pub earned_runs: Option<i64>,
    pub unearned_runs: Option<i64>,
    pub walks: Option<i64>,
    pub strikeouts: Option<i64>,
    pub home_runs: Option<i64>,
    pub hit_by_pitch: Option<i64>,
    pub batters_faced: Option<i64>,
    pub pitches: Option<i64>,
    pub strikes: Option<i64>,
    pub inherited_runners: Option<i64>,
    pub inherited_scored: Option<i64>,
    pub stolen_bases: Option<i64>,
    pub caught_stealing: Option<i64>,
    pub at_bats: Option<i64>,
    pub doubles: Option<i64>,
    pub triples: Option<i64>,
    pub intentional_walks: Option<i64>,
    pub sac_hits: Option<i64>,
    pub sac_flies: Option<i64>,
    pub reached_on_error: Option<i64>,
    pub gidp: Option<i64>,
    pub pitchers_used: Option<i64>,
    pub innings_pitched: Option<f64>,
    pub era: Option<f64>,
    pub umpire: Option<String>,
    pub starting_pitcher: Option<String>,
    pub deciding_pitcher: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattingGame {
    pub record: GameRecord,
    pub line: BattingLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchingGame {
    pub record: GameRecord,
    pub line: PitchingLine,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(team: &str, opp: &str, side: HomeAway, rf: u32, ra: u32) -> GameRecord {
        GameRecord {
            season: 2020,
            date: NaiveDate::from_ymd_opt(2020, 7, 25).unwrap(),
            team: team.parse().unwrap(),
            opponent: opp.parse().unwrap(),
            side,
            result: if rf > ra { GameResult::Win } else { GameResult::Loss },
            runs_for: rf,
            runs_against: ra,
        }
    }

    #[test]
    fn both_sides_share_identity() {
        let phi = record("PHI", "MIA", HomeAway::Home, 2, 5);
        let mia = record("MIA", "PHI", HomeAway::Away, 5, 2);
        assert_eq!(phi.identity(), mia.identity());
        assert_eq!(phi.home_team(), mia.home_team());
        assert_eq!(phi.away_team().as_str(), "MIA");
        assert_eq!(phi.matchup(), "PHI vs. MIA");
        assert_eq!(mia.matchup(), "MIA @ PHI");
        assert_eq!(mia.score_label(), "5-2");
    }

    #[test]
    fn result_codes() {
        assert_eq!(GameResult::from_code("W"), Some(GameResult::Win));
        assert_eq!(GameResult::from_code("L-wo"), Some(GameResult::Loss));
        assert_eq!(GameResult::from_code(""), None);
    }
}
