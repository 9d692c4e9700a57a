//! Reading and writing the vocabulary table.
//!
//! The table is a CSV file with a header row. `Front` is required; `Back`,
//! `Audio`, `Definition` and `DL valid` are appended when absent. Columns the
//! tool does not manage are carried through untouched.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::{is_empty_value, WordEntry};

pub const FRONT_COLUMN: &str = "Front";
pub const BACK_COLUMN: &str = "Back";
pub const AUDIO_COLUMN: &str = "Audio";
pub const DEFINITION_COLUMN: &str = "Definition";
pub const DL_VALID_COLUMN: &str = "DL valid";

/// Managed columns in their canonical order.
pub const MANAGED_COLUMNS: &[&str] = &[
    FRONT_COLUMN,
    BACK_COLUMN,
    AUDIO_COLUMN,
    DEFINITION_COLUMN,
    DL_VALID_COLUMN,
];

/// Errors from table input/output.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Input file '{0}' not found")]
    NotFound(PathBuf),
    #[error("Input file '{0}' is empty")]
    Empty(PathBuf),
    #[error("Input file '{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory vocabulary table.
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    columns: Vec<String>,
    entries: Vec<WordEntry>,
    filtered: usize,
}

impl WordTable {
    /// Build a table from entries, using the managed columns as header.
    pub fn from_entries(entries: Vec<WordEntry>) -> Self {
        Self {
            columns: MANAGED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            entries,
            filtered: 0,
        }
    }

    /// Output header, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [WordEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows dropped on load because `Front` was blank.
    pub fn filtered_count(&self) -> usize {
        self.filtered
    }

    /// Render the cell for `column` of `entry`.
    fn cell<'a>(&self, entry: &'a WordEntry, column: &str) -> &'a str {
        match column {
            FRONT_COLUMN => &entry.front,
            BACK_COLUMN => &entry.back,
            AUDIO_COLUMN => &entry.audio_url,
            DEFINITION_COLUMN => &entry.definition_url,
            DL_VALID_COLUMN => format_bool(entry.download_valid),
            other => entry.extra_value(other).unwrap_or(""),
        }
    }
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Read the table at `path`.
pub fn read_table(path: &Path) -> Result<WordTable, TableError> {
    if !path.exists() {
        return Err(TableError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(TableError::Empty(path.to_path_buf()));
    }

    let mut columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let front_idx = columns
        .iter()
        .position(|c| c == FRONT_COLUMN)
        .ok_or_else(|| TableError::MissingColumn {
            path: path.to_path_buf(),
            column: FRONT_COLUMN,
        })?;
    for managed in MANAGED_COLUMNS {
        if !columns.iter().any(|c| c == managed) {
            columns.push(managed.to_string());
        }
    }

    let index_of = |name: &str| headers.iter().position(|h| h == name);
    let back_idx = index_of(BACK_COLUMN);
    let audio_idx = index_of(AUDIO_COLUMN);
    let definition_idx = index_of(DEFINITION_COLUMN);
    let valid_idx = index_of(DL_VALID_COLUMN);

    let mut entries = Vec::new();
    let mut filtered = 0;
    for record in reader.records() {
        let record = record?;
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

        let front = get(Some(front_idx));
        if front.trim().is_empty() {
            filtered += 1;
            continue;
        }

        let mut entry = WordEntry::new(front, get(back_idx));
        entry.audio_url = non_empty(get(audio_idx));
        entry.definition_url = non_empty(get(definition_idx));
        entry.download_valid = parse_bool(get(valid_idx));
        entry.extra = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !MANAGED_COLUMNS.contains(name))
            .map(|(i, name)| (name.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();
        entries.push(entry);
    }

    debug!(
        "Read {} rows from {} ({} filtered)",
        entries.len(),
        path.display(),
        filtered
    );

    Ok(WordTable {
        columns,
        entries,
        filtered,
    })
}

fn non_empty(value: &str) -> String {
    if is_empty_value(value) {
        String::new()
    } else {
        value.to_string()
    }
}

/// Write the full table to `path`, replacing any existing file.
pub fn write_table(path: &Path, table: &WordTable) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for entry in table.entries() {
        let row: Vec<&str> = table
            .columns()
            .iter()
            .map(|column| table.cell(entry, column))
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
