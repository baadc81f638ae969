// Parser/writer configuration and eager validation

use crate::error::{CsvError, Result};
use serde::{Deserialize, Serialize};

/// Default read chunk size for the scanner.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Default flush block size for the writer.
pub const DEFAULT_FLUSH_SIZE: usize = 64 * 1024;

#[cfg(windows)]
pub const PLATFORM_ROW_DELIMITER: &str = "\r\n";
#[cfg(not(windows))]
pub const PLATFORM_ROW_DELIMITER: &str = "\n";

/// Scan options for one pass over a stream.
///
/// Built once and read-only for the duration of a scan. Call
/// [`ParseOptions::validate`] (the scanner does it on construction) to catch
/// conflicting delimiter/quote combinations before any byte is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Separates fields within a row. Empty means "one column per row".
    pub column_delimiter: String,
    /// Separates rows. Must not be empty.
    pub row_delimiter: String,
    /// Optional quote character wrapping fields that contain delimiters.
    pub quote: Option<char>,
    /// Drop rows whose fields are all blank.
    pub skip_empty_rows: bool,
    /// Rows before this index (counted from the start of the stream) are skipped.
    pub start_row: usize,
    /// Empty fields take the target's default instead of failing.
    pub allow_defaults: bool,
    /// Every row must have the same number of columns.
    pub strict_column_count: bool,
    /// Bytes requested from the stream per read.
    pub chunk_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            column_delimiter: ",".to_string(),
            row_delimiter: PLATFORM_ROW_DELIMITER.to_string(),
            quote: Some('"'),
            skip_empty_rows: false,
            start_row: 0,
            allow_defaults: true,
            strict_column_count: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ParseOptions {
    pub fn with_column_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.column_delimiter = delimiter.into();
        self
    }

    pub fn with_row_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.row_delimiter = delimiter.into();
        self
    }

    pub fn with_quote(mut self, quote: Option<char>) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_skip_empty_rows(mut self, skip: bool) -> Self {
        self.skip_empty_rows = skip;
        self
    }

    pub fn with_start_row(mut self, row: usize) -> Self {
        self.start_row = row;
        self
    }

    pub fn with_allow_defaults(mut self, allow: bool) -> Self {
        self.allow_defaults = allow;
        self
    }

    pub fn with_strict_column_count(mut self, strict: bool) -> Self {
        self.strict_column_count = strict;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Check the delimiter/quote invariants.
    pub fn validate(&self) -> Result<()> {
        validate_delimiters(&self.column_delimiter, &self.row_delimiter, self.quote)?;
        if self.chunk_size == 0 {
            return Err(CsvError::config("chunk size must be greater than zero"));
        }
        Ok(())
    }
}

fn validate_delimiters(column: &str, row: &str, quote: Option<char>) -> Result<()> {
    if row.is_empty() {
        return Err(CsvError::config("row delimiter cannot be empty"));
    }
    if let Some(q) = quote {
        if row.contains(q) {
            return Err(CsvError::config(format!(
                "row delimiter {row:?} cannot contain the quote character {q:?}"
            )));
        }
        if column.contains(q) {
            return Err(CsvError::config(format!(
                "column delimiter {column:?} cannot contain the quote character {q:?}"
            )));
        }
    }
    if !column.is_empty() && (row.contains(column) || column.contains(row)) {
        return Err(CsvError::config(format!(
            "column delimiter {column:?} and row delimiter {row:?} overlap"
        )));
    }
    Ok(())
}

/// Options for a reader that may load a header row before the data rows.
///
/// Header overrides left as `None` fall back to the data-row value, so a
/// tab-delimited file only needs the delimiter set once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Options for data rows.
    #[serde(flatten)]
    pub data: ParseOptions,
    /// Read the header row and bind fields by name.
    pub parse_headers: bool,
    pub header_column_delimiter: Option<String>,
    pub header_row_delimiter: Option<String>,
    pub header_quote: Option<Option<char>>,
    pub header_skip_empty_rows: Option<bool>,
    /// Index of the header row, counted from the start of the stream.
    pub header_start_row: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        ReaderOptions {
            data: ParseOptions::default(),
            parse_headers: true,
            header_column_delimiter: None,
            header_row_delimiter: None,
            header_quote: None,
            header_skip_empty_rows: None,
            header_start_row: 0,
        }
    }

    /// Header-less reader: fields bind by ordinal only.
    pub fn headerless() -> Self {
        ReaderOptions {
            parse_headers: false,
            ..Self::new()
        }
    }

    pub fn with_data(mut self, data: ParseOptions) -> Self {
        self.data = data;
        self
    }

    pub fn with_parse_headers(mut self, parse: bool) -> Self {
        self.parse_headers = parse;
        self
    }

    pub fn with_header_column_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.header_column_delimiter = Some(delimiter.into());
        self
    }

    pub fn with_header_row_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.header_row_delimiter = Some(delimiter.into());
        self
    }

    pub fn with_header_quote(mut self, quote: Option<char>) -> Self {
        self.header_quote = Some(quote);
        self
    }

    pub fn with_header_skip_empty_rows(mut self, skip: bool) -> Self {
        self.header_skip_empty_rows = Some(skip);
        self
    }

    pub fn with_header_start_row(mut self, row: usize) -> Self {
        self.header_start_row = row;
        self
    }

    /// Scan options used for the header row.
    pub fn header_options(&self) -> ParseOptions {
        ParseOptions {
            column_delimiter: self
                .header_column_delimiter
                .clone()
                .unwrap_or_else(|| self.data.column_delimiter.clone()),
            row_delimiter: self
                .header_row_delimiter
                .clone()
                .unwrap_or_else(|| self.data.row_delimiter.clone()),
            quote: self.header_quote.unwrap_or(self.data.quote),
            skip_empty_rows: self
                .header_skip_empty_rows
                .unwrap_or(self.data.skip_empty_rows),
            start_row: self.header_start_row,
            allow_defaults: true,
            strict_column_count: false,
            chunk_size: self.data.chunk_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        if self.parse_headers {
            self.header_options().validate()?;
        }
        Ok(())
    }
}

/// Options for [`crate::CsvWriter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    pub column_delimiter: String,
    pub row_delimiter: String,
    pub quote: Option<char>,
    /// Emit the header row from field names before the first record.
    pub write_headers: bool,
    /// Buffered bytes that trigger a flush to the sink.
    pub flush_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            column_delimiter: ",".to_string(),
            row_delimiter: PLATFORM_ROW_DELIMITER.to_string(),
            quote: Some('"'),
            write_headers: true,
            flush_size: DEFAULT_FLUSH_SIZE,
        }
    }
}

impl WriterOptions {
    /// Writer options producing text the given parse options read back.
    pub fn matching(options: &ParseOptions) -> Self {
        WriterOptions {
            column_delimiter: options.column_delimiter.clone(),
            row_delimiter: options.row_delimiter.clone(),
            quote: options.quote,
            ..Self::default()
        }
    }

    pub fn with_write_headers(mut self, write: bool) -> Self {
        self.write_headers = write;
        self
    }

    pub fn with_flush_size(mut self, size: usize) -> Self {
        self.flush_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_delimiters(&self.column_delimiter, &self.row_delimiter, self.quote)?;
        if self.column_delimiter.is_empty() {
            return Err(CsvError::config("writer needs a column delimiter"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ParseOptions::default().validate().is_ok());
        assert!(ReaderOptions::new().validate().is_ok());
        assert!(WriterOptions::default().validate().is_ok());
    }

    #[test]
    fn test_quote_in_row_delimiter_rejected() {
        let opts = ParseOptions::default()
            .with_row_delimiter("|'")
            .with_quote(Some('\''));
        assert!(matches!(opts.validate(), Err(CsvError::Configuration(_))));
    }

    #[test]
    fn test_quote_equal_to_delimiter_rejected() {
        let opts = ParseOptions::default().with_column_delimiter("\"");
        assert!(matches!(opts.validate(), Err(CsvError::Configuration(_))));
    }

    #[test]
    fn test_overlapping_delimiters_rejected() {
        let opts = ParseOptions::default()
            .with_column_delimiter("|")
            .with_row_delimiter("||");
        assert!(matches!(opts.validate(), Err(CsvError::Configuration(_))));

        let opts = ParseOptions::default()
            .with_column_delimiter("\n\n")
            .with_row_delimiter("\n");
        assert!(matches!(opts.validate(), Err(CsvError::Configuration(_))));
    }

    #[test]
    fn test_empty_column_delimiter_allowed() {
        let opts = ParseOptions::default().with_column_delimiter("");
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_empty_row_delimiter_rejected() {
        let opts = ParseOptions::default().with_row_delimiter("");
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_header_options_fall_back_to_data() {
        let opts = ReaderOptions::new()
            .with_data(ParseOptions::default().with_column_delimiter("\t").with_start_row(4))
            .with_header_start_row(2);
        let header = opts.header_options();
        assert_eq!(header.column_delimiter, "\t");
        assert_eq!(header.start_row, 2);

        let opts = opts.with_header_quote(None).with_header_column_delimiter(";");
        let header = opts.header_options();
        assert_eq!(header.quote, None);
        assert_eq!(header.column_delimiter, ";");
    }

    #[test]
    fn test_writer_matching() {
        let parse = ParseOptions::default()
            .with_column_delimiter(":")
            .with_row_delimiter("|||")
            .with_quote(Some('\''));
        let writer = WriterOptions::matching(&parse);
        assert_eq!(writer.column_delimiter, ":");
        assert_eq!(writer.row_delimiter, "|||");
        assert_eq!(writer.quote, Some('\''));
        assert!(writer.write_headers);
    }
}
