//! Column-mapped row import and JSON Lines export.
//!
//! Parsing a tabular file into rows is the caller's concern; this module
//! maps already-parsed rows onto [`Record`]s. Presence of the optional id
//! and reasoning columns is detected from the first row, matching how
//! spreadsheet-shaped sources declare their columns once.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use serde_json::Value;

use crate::error::{AnnotationError, Result};
use crate::types::record::Record;

/// One imported row: column name to value.
pub type Row = serde_json::Map<String, Value>;

/// Maps the library's logical fields onto source column names.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub id: String,
    pub input: String,
    pub output: String,
    pub reasoning: String,
    pub split: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            input: "input".to_string(),
            output: "output".to_string(),
            reasoning: "reasoning".to_string(),
            split: "split".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Identity mapping: logical names are the column names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the id column.
    pub fn with_id(mut self, column: impl Into<String>) -> Self {
        self.id = column.into();
        self
    }

    /// Rename the input column.
    pub fn with_input(mut self, column: impl Into<String>) -> Self {
        self.input = column.into();
        self
    }

    /// Rename the output column.
    pub fn with_output(mut self, column: impl Into<String>) -> Self {
        self.output = column.into();
        self
    }

    /// Rename the reasoning column.
    pub fn with_reasoning(mut self, column: impl Into<String>) -> Self {
        self.reasoning = column.into();
        self
    }

    /// Rename the split column.
    pub fn with_split(mut self, column: impl Into<String>) -> Self {
        self.split = column.into();
        self
    }
}

/// Result of mapping rows onto records.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub records: Vec<Record>,

    /// Whether the source rows carried a reasoning column.
    pub reasoning_present: bool,
}

fn field_string(row: &Row, column: &str) -> Option<String> {
    match row.get(column) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Map column-named rows onto records.
///
/// `input` and `output` are mandatory on every row; a row missing either
/// rejects the whole batch with a data validation error (no partial
/// import). Rows without a split column get `default_split`.
pub fn records_from_rows(
    rows: &[Row],
    mapping: &ColumnMapping,
    default_split: &str,
) -> Result<ImportOutcome> {
    let Some(first) = rows.first() else {
        return Ok(ImportOutcome {
            records: Vec::new(),
            reasoning_present: false,
        });
    };

    // Optional columns are declared by the first row.
    let reasoning_present = field_string(first, &mapping.reasoning).is_some();
    let id_present = field_string(first, &mapping.id).is_some();

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let input = field_string(row, &mapping.input).ok_or_else(|| {
            AnnotationError::validation(format!(
                "row {} is missing required column '{}'",
                i, mapping.input
            ))
        })?;
        let output = field_string(row, &mapping.output).ok_or_else(|| {
            AnnotationError::validation(format!(
                "row {} is missing required column '{}'",
                i, mapping.output
            ))
        })?;

        let split = field_string(row, &mapping.split).unwrap_or_else(|| default_split.to_string());

        let mut record = Record::new(input, output).with_split(split);
        if id_present {
            if let Some(id) = field_string(row, &mapping.id) {
                record = record.with_id(id);
            }
        }
        if reasoning_present {
            if let Some(reasoning) = field_string(row, &mapping.reasoning) {
                record = record.with_reasoning(reasoning);
            }
        }
        records.push(record);
    }

    Ok(ImportOutcome {
        records,
        reasoning_present,
    })
}

/// Serialize records to a JSON Lines file, one record per line.
pub fn write_records_jsonl(path: &Path, records: &[Record]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    for record in records {
        serde_json::to_writer(&mut file, record)?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Read records from a JSON Lines file.
///
/// Empty lines are ignored; an invalid line fails the whole read with its
/// line number.
pub fn read_records_jsonl(path: &Path) -> Result<Vec<Record>> {
    let raw = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(line).map_err(|e| {
            AnnotationError::validation(format!("invalid record at line {}: {}", line_no + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}
