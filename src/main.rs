use std::io::Write;

use anyhow::{Context, Result, anyhow};

use mlb_gamelogs::config::{self, arg_value, parse_seasons};
use mlb_gamelogs::gamelog_dataset::{self, ExportTable, RowFilter};
use mlb_gamelogs::teams::{TeamDirectory, parse_team_codes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = config::resolve_db_path(&args)?;

    let table = arg_value(&args, "--table")
        .as_deref()
        .unwrap_or("t")
        .parse::<ExportTable>()?;

    let format = match arg_value(&args, "--format").as_deref().unwrap_or("json") {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        other => return Err(anyhow!("invalid format {other:?}, expected json or csv")),
    };

    let teams = match arg_value(&args, "--teams") {
        Some(raw) => parse_team_codes(&raw)?,
        None => Vec::new(),
    };
    // Reject codes outside the league before touching the database.
    TeamDirectory::mlb().subset(&teams)?;

    let seasons = match arg_value(&args, "--season") {
        Some(raw) => parse_seasons(&raw)?,
        None => Vec::new(),
    };

    let conn = gamelog_dataset::open_db(&db_path)?;
    let rows = gamelog_dataset::select_rows(&conn, table, &RowFilter { teams, seasons })?;
    tracing::debug!(rows = rows.rows.len(), "export query done");

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "status": "success", "data": rows.to_records() });
            serde_json::to_writer_pretty(&mut stdout, &body).context("write json")?;
            writeln!(stdout).context("write json")?;
        }
        OutputFormat::Csv => {
            stdout
                .write_all(rows.to_csv().as_bytes())
                .context("write csv")?;
        }
    }
    Ok(())
}
