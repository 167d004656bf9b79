//! Strict CSV parser.
//!
//! Rows must have exactly as many fields as the header and every quoted
//! field must be closed; anything else is an input error rather than a
//! silently padded row.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::source::{DataTable, SourceMetadata};
use crate::error::{EtlError, Result};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Parses CSV files into a [`DataTable`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| EtlError::input(path, e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let table = self
            .parse_bytes(&contents)
            .map_err(|message| EtlError::input(path, message))?;

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            table.row_count(),
            table.column_count(),
        );

        tracing::debug!(
            file = %metadata.file,
            rows = metadata.row_count,
            columns = metadata.column_count,
            "parsed dataset"
        );

        Ok((table, metadata))
    }

    /// Parse bytes directly. Errors are returned as messages; the caller
    /// attaches the path.
    fn parse_bytes(&self, bytes: &[u8]) -> std::result::Result<DataTable, String> {
        if let Some(line) = unterminated_quote_line(bytes, self.config.delimiter, self.config.quote)
        {
            return Err(format!("unterminated quoted field starting on line {}", line));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .quote(self.config.quote)
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(describe_csv_error)?
            .iter()
            .map(|s| s.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err("no header row found".to_string());
        }

        let mut seen = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(format!("duplicate column header '{}'", dup));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(describe_csv_error)?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(DataTable::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_csv_error(err: csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
            format!(
                "line {} has {} fields, expected {}",
                line, len, expected_len
            )
        }
        _ => err.to_string(),
    }
}

/// Find a quoted field that is never closed. Quotes only open a field when
/// they are its first byte, matching how the csv reader treats them.
/// Returns the 1-based line where the open quote starts.
fn unterminated_quote_line(bytes: &[u8], delimiter: u8, quote: u8) -> Option<usize> {
    #[derive(PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    let mut line = 1;
    let mut open_line = 1;

    for &b in bytes {
        state = match state {
            State::FieldStart | State::Unquoted if b == b'\n' => State::FieldStart,
            State::FieldStart | State::Unquoted if b == delimiter => State::FieldStart,
            State::FieldStart if b == quote => {
                open_line = line;
                State::Quoted
            }
            State::FieldStart | State::Unquoted => State::Unquoted,
            State::Quoted if b == quote => State::QuoteInQuoted,
            State::Quoted => State::Quoted,
            State::QuoteInQuoted if b == quote => State::Quoted,
            State::QuoteInQuoted if b == b'\n' || b == delimiter => State::FieldStart,
            State::QuoteInQuoted => State::Unquoted,
        };
        if b == b'\n' {
            line += 1;
        }
    }

    (state == State::Quoted).then_some(open_line)
}
