//! Result serialization
//!
//! JSON Lines output holds exactly one entry per line. CSV output holds one
//! record per entry, but a multi-turn dialogue keeps its line breaks inside
//! a quoted `text` field, so a record can span several physical lines.

use crate::error::{Error, Result};
use crate::types::ResultEntry;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line with full label rankings
    #[default]
    JsonLines,
    /// One row per entry with the top label of each task
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" | "ndjson" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Write results in order, one entry per record
pub fn write_results(results: &[ResultEntry], path: &Path, format: OutputFormat) -> Result<()> {
    let file = File::create(path)?;

    match format {
        OutputFormat::JsonLines => write_json_lines(results, BufWriter::new(file)),
        OutputFormat::Csv => write_csv(results, file),
    }?;

    tracing::debug!("Wrote {} entries to {}", results.len(), path.display());
    Ok(())
}

fn write_json_lines<W: Write>(results: &[ResultEntry], mut out: W) -> Result<()> {
    for entry in results {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn write_csv<W: Write>(results: &[ResultEntry], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record([
            "id",
            "text",
            "sentiment",
            "sentiment_score",
            "intent",
            "intent_score",
        ])
        .map_err(csv_error)?;

    for entry in results {
        writer
            .write_record([
                entry.id.clone().unwrap_or_default(),
                entry.sentiment.sequence.clone(),
                entry.sentiment.top_label().unwrap_or_default().to_string(),
                format_score(entry.sentiment.top_score()),
                entry.intent.top_label().unwrap_or_default().to_string(),
                format_score(entry.intent.top_score()),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

fn format_score(score: Option<f32>) -> String {
    score.map(|s| format!("{:.4}", s)).unwrap_or_default()
}

fn csv_error(err: csv::Error) -> Error {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => Error::Io(e),
        _ => Error::Io(std::io::Error::new(std::io::ErrorKind::Other, message)),
    }
}
