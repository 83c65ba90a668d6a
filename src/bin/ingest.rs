use anyhow::Result;

use mlb_gamelogs::config::{self, IngestConfig};
use mlb_gamelogs::gamelog_dataset;
use mlb_gamelogs::ingest::{self, HttpPageSource};

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = IngestConfig::resolve(&args)?;
    let directory = cfg.directory()?;

    let mut conn = gamelog_dataset::open_db(&cfg.db_path)?;
    let source = HttpPageSource::new(cfg.request_delay);
    let summary = ingest::ingest_teams(&mut conn, &source, &directory, cfg.season)?;

    println!("Game log ingest complete");
    println!("DB: {}", cfg.db_path.display());
    println!("Season: {}", summary.season);
    println!(
        "Teams: {}/{}",
        summary.teams_succeeded, summary.teams_total
    );
    println!(
        "Rows inserted: {} (already stored: {}, skipped: {})",
        summary.rows.inserted, summary.rows.duplicate, summary.rows.rejected
    );
    for team in &summary.per_team {
        println!(
            "{}: batting {}+{}dup pitching {}+{}dup{}",
            team.team,
            team.batting.inserted,
            team.batting.duplicate,
            team.pitching.inserted,
            team.pitching.duplicate,
            if team.team_inserted { "" } else { " (team already stored)" }
        );
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
