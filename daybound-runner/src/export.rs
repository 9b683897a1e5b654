//! Artifact export: per-row CSV and the JSON batch manifest.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::batch::{BatchResult, EvaluatedRow};

fn ts(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn price(p: Option<f64>) -> String {
    p.map(|p| format!("{:.6}", p)).unwrap_or_default()
}

/// One line per row, in batch order, status tag included.
pub fn export_rows_csv(rows: &[EvaluatedRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "row_id",
        "entry_time",
        "exit_time",
        "classification",
        "status",
        "asked",
        "used",
        "direction",
        "trigger_price",
        "deadline",
        "executed_at",
        "entry_price",
        "tp_pct",
        "sl_pct",
        "intraday_result",
        "outcome_at",
    ])?;

    for row in rows {
        let r = &row.record;
        wtr.write_record([
            &row.row_id.0.to_string(),
            &ts(Some(row.entry_utc)),
            &ts(row.exit_utc),
            row.classification.as_str(),
            r.tag(),
            &r.asked.to_string(),
            &r.used.to_string(),
            r.direction.map(|d| d.as_str()).unwrap_or(""),
            &price(r.trigger_price),
            &ts(r.deadline),
            &ts(r.executed_at),
            &price(r.entry_price),
            &format!("{:.6}", r.tp_pct),
            &format!("{:.6}", r.sl_pct),
            r.intraday_result.as_str(),
            &ts(r.outcome_at),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_json(result: &BatchResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BatchResult to JSON")
}

/// Write `rows.csv` and `manifest.json` into `output_dir`, creating it if needed.
pub fn save_artifacts(result: &BatchResult, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let csv_path = output_dir.join("rows.csv");
    std::fs::write(&csv_path, export_rows_csv(&result.rows)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let manifest_path = output_dir.join("manifest.json");
    std::fs::write(&manifest_path, export_json(result)?)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    Ok(())
}
