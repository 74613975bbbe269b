use censo_model::ENROLLMENT_COLUMNS;
use csv::{ByteRecord, ReaderBuilder};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Delimiter and encoding of the yearly extracts are fixed by the
/// publisher, not auto-detected.
pub const CSV_DELIMITER: u8 = b';';

pub const KEY_COLUMNS: [&str; 2] = ["CO_ENTIDADE", "NU_ANO_CENSO"];

pub const ATTRIBUTE_COLUMNS: [&str; 12] = [
    "NO_ENTIDADE",
    "CO_REGIAO",
    "NO_REGIAO",
    "CO_UF",
    "SG_UF",
    "NO_UF",
    "CO_MUNICIPIO",
    "NO_MUNICIPIO",
    "CO_MESORREGIAO",
    "NO_MESORREGIAO",
    "CO_MICRORREGIAO",
    "NO_MICRORREGIAO",
];

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SourceError {
    NotFound(PathBuf),
    Malformed(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "source file not found: {}", path.display()),
            Self::Malformed(msg) => write!(f, "malformed source: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// One source line restricted to the selected column subset. Cells that
/// are absent or blank are simply not present; they resolve to zero (or
/// empty) later, per cell, without dropping the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: BTreeMap<&'static str, String>,
}

impl RawRow {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Test scaffolding for pipeline stages that consume rows directly.
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        if let Some(name) = selected_column(column) {
            self.values.insert(name, value.into());
        }
    }
}

/// Lazy, single-pass reader over one extract. Not restartable: re-open the
/// file for a second pass.
#[derive(Debug)]
pub struct RowSource {
    reader: csv::Reader<File>,
    selected: Vec<(usize, &'static str)>,
}

impl RowSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
            _ => SourceError::Malformed(format!("{}: {e}", path.display())),
        })?;
        let mut reader = ReaderBuilder::new()
            .delimiter(CSV_DELIMITER)
            .flexible(true)
            .from_reader(file);
        let headers = reader
            .byte_headers()
            .map_err(|e| SourceError::Malformed(e.to_string()))?
            .clone();

        let mut selected = Vec::new();
        for (idx, raw) in headers.iter().enumerate() {
            let name = latin1_to_string(raw);
            if let Some(column) = selected_column(name.trim()) {
                selected.push((idx, column));
            }
        }
        // A header that does not resolve the key columns is not the
        // expected tabular shape (wrong delimiter, wrong file).
        for key in KEY_COLUMNS {
            if !selected.iter().any(|(_, column)| *column == key) {
                return Err(SourceError::Malformed(format!(
                    "required column {key} missing from header"
                )));
            }
        }
        Ok(Self { reader, selected })
    }
}

impl Iterator for RowSource {
    type Item = Result<RawRow, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = ByteRecord::new();
        match self.reader.read_byte_record(&mut record) {
            Ok(false) => None,
            Err(e) => Some(Err(SourceError::Malformed(e.to_string()))),
            Ok(true) => {
                let mut row = RawRow::default();
                for (idx, column) in &self.selected {
                    let Some(cell) = record.get(*idx) else {
                        continue;
                    };
                    let text = latin1_to_string(cell);
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        row.values.insert(column, trimmed.to_string());
                    }
                }
                Some(Ok(row))
            }
        }
    }
}

fn selected_column(name: &str) -> Option<&'static str> {
    KEY_COLUMNS
        .iter()
        .chain(ATTRIBUTE_COLUMNS.iter())
        .chain(ENROLLMENT_COLUMNS.iter())
        .find(|column| **column == name)
        .copied()
}

/// Latin-1 maps every byte to the code point of the same value.
#[must_use]
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Per-cell count coercion: missing or unparseable cells become 0 and are
/// reported as defaulted, never as an error. Float-formatted integers are
/// accepted because count columns sometimes pass through a float stage.
#[must_use]
pub fn coerce_count(cell: Option<&str>) -> (i64, bool) {
    let Some(raw) = cell else {
        return (0, true);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (0, true);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return (value, false);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => (value as i64, false),
        _ => (0, true),
    }
}

/// Geographic code columns are integers when present; anything else is
/// treated as absent.
#[must_use]
pub fn coerce_code(cell: Option<&str>) -> Option<i64> {
    let trimmed = cell?.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Some(value as i64),
        _ => None,
    }
}
