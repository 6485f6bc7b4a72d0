//! Delimited assessment-roll extracts into [`RawRecord`]s.

mod parser;

use crate::scoring::RawRecord;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub enum IngestError {
    /// The input could not be opened at all. The only fatal input condition.
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::SourceUnavailable { path, source } => write!(
                f,
                "input source {} is unavailable ({}); check the path or set LISTPREDICT_INPUT",
                path.display(),
                source
            ),
            IngestError::Io(err) => write!(f, "failed to read property extract: {}", err),
            IngestError::Csv(err) => write!(f, "invalid property extract data: {}", err),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::SourceUnavailable { source, .. } => Some(source),
            IngestError::Io(err) => Some(err),
            IngestError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Auto,
    Comma,
    Tab,
}

impl Delimiter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Some(Self::Auto),
            "comma" | "csv" | "," => Some(Self::Comma),
            "tab" | "tsv" | "\\t" => Some(Self::Tab),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Comma => "comma",
            Self::Tab => "tab",
        }
    }

    pub(crate) fn resolve(self, buffer: &[u8]) -> u8 {
        match self {
            Self::Auto => parser::sniff_delimiter(buffer),
            Self::Comma => b',',
            Self::Tab => b'\t',
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyImporter {
    delimiter: Delimiter,
}

impl PropertyImporter {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawRecord>, IngestError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| IngestError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let records = self.from_reader(file)?;
        info!(
            path = %path.display(),
            records = records.len(),
            delimiter = self.delimiter.label(),
            "loaded property extract"
        );
        Ok(records)
    }

    /// Missing columns are not an error; they read as absent values.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>, IngestError> {
        parser::parse_records(reader, self.delimiter)
    }
}
