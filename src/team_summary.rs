use anyhow::{Context, Result, anyhow};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::gamelog_parse::cell_text;
use crate::teams::TeamCode;

const SUMMARY_SELECTOR: &str = r#"div[data-template="Partials/Teams/Summary"]"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: u32,
    pub code: TeamCode,
    pub season: i32,
    pub name: String,
    pub league: String,
    pub division: String,
    pub wins: u32,
    pub losses: u32,
}

/// Name, league/division and W-L record from the team page header.
pub fn parse_team_summary(html: &str, code: TeamCode, season: i32) -> Result<TeamSummary> {
    let doc = Html::parse_document(html);
    let summary_sel = selector(SUMMARY_SELECTOR)?;
    let name_sel = selector("h1 span")?;
    let p_sel = selector("p")?;
    let strong_sel = selector("strong")?;
    let a_sel = selector("a")?;

    let summary = doc
        .select(&summary_sel)
        .next()
        .ok_or_else(|| anyhow!("team summary block not found for {code}"))?;

    // First span is the season, second the franchise name.
    let spans = summary.select(&name_sel).map(cell_text).collect::<Vec<_>>();
    let name = spans
        .get(1)
        .or_else(|| spans.first())
        .filter(|s| !s.is_empty())
        .cloned()
        .with_context(|| format!("team name missing for {code}"))?;

    let record_p = summary
        .select(&p_sel)
        .find(|p| {
            p.select(&strong_sel)
                .any(|s| cell_text(s).starts_with("Record"))
        })
        .with_context(|| format!("record line missing for {code}"))?;

    let record_text = cell_text(record_p);
    let (wins, losses) = parse_win_loss(&record_text)
        .with_context(|| format!("unparseable record {record_text:?}"))?;

    let standing = record_p
        .select(&a_sel)
        .map(cell_text)
        .next()
        .with_context(|| format!("division link missing for {code}"))?;
    let (league, division) = split_league_division(&standing)
        .with_context(|| format!("unparseable division {standing:?}"))?;

    Ok(TeamSummary {
        id: code.team_id(),
        code,
        season,
        name,
        league,
        division,
        wins,
        losses,
    })
}

/// First `W-L` token, e.g. `Record: 28-32, 3rd in NL_East`.
pub fn parse_win_loss(raw: &str) -> Option<(u32, u32)> {
    raw.split(|ch: char| ch.is_whitespace() || ch == ',' || ch == ':')
        .find_map(|token| {
            let (w, l) = token.split_once('-')?;
            Some((w.parse().ok()?, l.parse().ok()?))
        })
}

/// `NL_East` or `NL East` -> (`NL`, `East`).
pub fn split_league_division(raw: &str) -> Option<(String, String)> {
    let (league, division) = raw.trim().split_once(['_', ' '])?;
    let division = division.trim().trim_end_matches("Division").trim();
    if league.is_empty() || division.is_empty() {
        return None;
    }
    Some((league.to_string(), division.to_string()))
}

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|err| anyhow!("bad selector {raw:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_loss_tokens() {
        assert_eq!(parse_win_loss("Record: 28-32, 3rd in NL_East"), Some((28, 32)));
        assert_eq!(parse_win_loss("no record"), None);
    }

    #[test]
    fn league_division() {
        assert_eq!(
            split_league_division("NL_East"),
            Some(("NL".to_string(), "East".to_string()))
        );
        assert_eq!(
            split_league_division("AL Central Division"),
            Some(("AL".to_string(), "Central".to_string()))
        );
        assert_eq!(split_league_division("NL"), None);
    }
}
