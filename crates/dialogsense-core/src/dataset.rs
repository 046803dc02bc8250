//! Dialogue dataset loading
//!
//! The dataset name from the config selects a format. Names that are not a
//! known format fall back to the file extension.
//!
//! Supported formats:
//! * `json`  – top-level array of records, or an object with a `data`/`records` array
//! * `jsonl` – one record per line
//! * `csv`   – header row with a `text` (or `dialogue`) column and optional `id`
//! * `text`  – one dialogue per line
//!
//! A JSON record is a plain string, an object with `text` and optional `id`,
//! or an object with `turns: [{ "speaker": ..., "text": ... }]`.

use crate::error::{Error, Result};
use crate::types::DialogueRecord;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::str::FromStr;

/// On-disk dataset format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    JsonLines,
    Csv,
    Text,
}

impl FromStr for DatasetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" | "json_lines" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            "text" | "txt" | "lines" => Ok(Self::Text),
            other => Err(Error::dataset(format!("unknown dataset format: {}", other))),
        }
    }
}

impl DatasetFormat {
    /// Pick the format from the dataset name, else from the file extension
    pub fn resolve(dataset_name: &str, path: &Path) -> Result<Self> {
        if let Ok(format) = dataset_name.parse() {
            return Ok(format);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        ext.parse().map_err(|_| {
            Error::dataset(format!(
                "cannot determine format for dataset '{}' at {}",
                dataset_name,
                path.display()
            ))
        })
    }
}

/// Ordered, immutable collection of dialogue records
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    records: Vec<DialogueRecord>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, records: Vec<DialogueRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DialogueRecord] {
        &self.records
    }
}

/// Load a dataset by name from a path
pub fn load_dataset(dataset_name: &str, path: &Path) -> Result<Dataset> {
    if !path.is_file() {
        return Err(Error::dataset(format!(
            "dataset file not found: {}",
            path.display()
        )));
    }

    let format = DatasetFormat::resolve(dataset_name, path)?;
    tracing::debug!("Reading {:?} dataset from {}", format, path.display());

    let records = match format {
        DatasetFormat::Json => load_json(path)?,
        DatasetFormat::JsonLines => load_json_lines(path)?,
        DatasetFormat::Csv => load_csv(path)?,
        DatasetFormat::Text => load_text(path)?,
    };

    Ok(Dataset::new(dataset_name, records))
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::dataset(format!("failed to read {}: {}", path.display(), e)))
}

fn load_json(path: &Path) -> Result<Vec<DialogueRecord>> {
    let text = read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)
        .map_err(|e| Error::dataset(format!("invalid JSON in {}: {}", path.display(), e)))?;

    let items = match root {
        JsonValue::Array(items) => items,
        JsonValue::Object(mut obj) => match obj.remove("data").or_else(|| obj.remove("records")) {
            Some(JsonValue::Array(items)) => items,
            _ => {
                return Err(Error::dataset(
                    "expected a top-level array or an object with a `data` array",
                ))
            }
        },
        _ => return Err(Error::dataset("expected a top-level JSON array")),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| parse_record(item).map_err(|e| row_error(i, e)))
        .collect()
}

fn load_json_lines(path: &Path) -> Result<Vec<DialogueRecord>> {
    let text = read_to_string(path)?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value: JsonValue = serde_json::from_str(line)
                .map_err(|e| Error::dataset(format!("line {}: invalid JSON: {}", i + 1, e)))?;
            parse_record(value).map_err(|e| Error::dataset(format!("line {}: {}", i + 1, e)))
        })
        .collect()
}

fn load_csv(path: &Path) -> Result<Vec<DialogueRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::dataset(format!("failed to open {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::dataset(format!("failed to read CSV header: {}", e)))?
        .clone();

    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };

    let text_idx = column(&["text", "dialogue", "utterance"])
        .ok_or_else(|| Error::dataset("CSV dataset needs a `text` column"))?;
    let id_idx = column(&["id"]);

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| Error::dataset(format!("row {}: {}", i + 1, e)))?;
        let text = row
            .get(text_idx)
            .ok_or_else(|| Error::dataset(format!("row {}: missing text column", i + 1)))?;

        records.push(DialogueRecord {
            id: id_idx
                .and_then(|idx| row.get(idx))
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            text: text.to_string(),
        });
    }

    Ok(records)
}

fn load_text(path: &Path) -> Result<Vec<DialogueRecord>> {
    let text = read_to_string(path)?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(DialogueRecord::new)
        .collect())
}

#[derive(Debug, Deserialize)]
struct Turn {
    #[serde(alias = "role", default)]
    speaker: Option<String>,
    #[serde(alias = "content", alias = "utterance")]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRecord {
    Plain(String),
    Turns {
        #[serde(default)]
        id: Option<JsonValue>,
        #[serde(alias = "dialog", alias = "messages")]
        turns: Vec<Turn>,
    },
    Flat {
        #[serde(default)]
        id: Option<JsonValue>,
        #[serde(alias = "dialogue", alias = "utterance", alias = "sequence")]
        text: String,
    },
}

fn parse_record(value: JsonValue) -> Result<DialogueRecord> {
    let raw: RawRecord = serde_json::from_value(value).map_err(|_| {
        Error::dataset("record must be a string, an object with `text`, or an object with `turns`")
    })?;

    Ok(match raw {
        RawRecord::Plain(text) => DialogueRecord::new(text),
        RawRecord::Flat { id, text } => DialogueRecord {
            id: id.and_then(id_to_string),
            text,
        },
        RawRecord::Turns { id, turns } => DialogueRecord {
            id: id.and_then(id_to_string),
            text: render_turns(&turns),
        },
    })
}

fn render_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| match &turn.speaker {
            Some(speaker) => format!("{}: {}", speaker, turn.text.trim()),
            None => turn.text.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn id_to_string(id: JsonValue) -> Option<String> {
    match id {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn row_error(index: usize, err: Error) -> Error {
    Error::dataset(format!("record {}: {}", index, err))
}
