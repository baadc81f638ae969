// CSV encoding: field quoting and buffered record writing
//
// Each field is scanned for characters the scanner would treat as
// structure (any char of either delimiter, or the quote char). Such fields
// are wrapped in the quote char with internal quote chars doubled. Empty
// text and the literal `null` are quoted too, so they read back as text
// rather than as absent values.
//
// All output goes into a flat Vec<u8> and is written to the sink whenever
// it grows past the flush size.

use crate::core::{Value, NULL_LITERAL};
use crate::error::{CsvError, Result};
use crate::options::WriterOptions;
use crate::schema::{CsvRecord, FieldDecl};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

// ==========================================================================
// Quoting
// ==========================================================================

/// Write `quote + field_with_doubled_quotes + quote`.
#[inline]
pub fn write_quoted_field(out: &mut Vec<u8>, field: &str, quote: char) {
    let mut utf8 = [0u8; 4];
    let q = quote.encode_utf8(&mut utf8).as_bytes();
    out.extend_from_slice(q);
    for piece in field.split_inclusive(quote) {
        out.extend_from_slice(piece.as_bytes());
        if piece.ends_with(quote) {
            out.extend_from_slice(q);
        }
    }
    out.extend_from_slice(q);
}

/// Whether `field` must be quoted to survive a round trip.
#[inline]
pub fn field_needs_quoting(field: &str, reserved: &[char]) -> bool {
    field.is_empty() || field == NULL_LITERAL || field.contains(reserved)
}

/// Chars that force quoting under the given writer options.
pub fn reserved_chars(options: &WriterOptions) -> Vec<char> {
    let mut reserved: Vec<char> = options
        .column_delimiter
        .chars()
        .chain(options.row_delimiter.chars())
        .chain(options.quote)
        .collect();
    reserved.sort_unstable();
    reserved.dedup();
    reserved
}

// ==========================================================================
// Writer
// ==========================================================================

/// Buffered delimited-text writer.
///
/// Output is only guaranteed to reach the sink after [`flush`](Self::flush)
/// or [`into_inner`](Self::into_inner).
pub struct CsvWriter<W: Write> {
    sink: W,
    options: WriterOptions,
    reserved: Vec<char>,
    out: Vec<u8>,
    header_written: bool,
    rows: usize,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(sink: W, options: WriterOptions) -> Result<Self> {
        options.validate()?;
        debug!(
            column_delimiter = ?options.column_delimiter,
            row_delimiter = ?options.row_delimiter,
            quote = ?options.quote,
            "writer created"
        );
        Ok(CsvWriter {
            sink,
            reserved: reserved_chars(&options),
            out: Vec::with_capacity(options.flush_size.min(1 << 20)),
            options,
            header_written: false,
            rows: 0,
        })
    }

    /// Rows written so far, header included.
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Write the header row for `T`.
    pub fn write_header<T: CsvRecord>(&mut self) -> Result<()> {
        self.write_header_with(&T::fields())
    }

    /// Write the header row from explicit field declarations.
    pub fn write_header_with<T>(&mut self, fields: &[FieldDecl<T>]) -> Result<()> {
        let mut first = true;
        for field in fields.iter().filter(|f| f.is_writable()) {
            if !first {
                self.out.extend_from_slice(self.options.column_delimiter.as_bytes());
            }
            first = false;
            self.push_text(&field.label())?;
        }
        self.header_written = true;
        self.end_row()
    }

    /// Write one record. The header goes out first when enabled.
    pub fn write_record<T: CsvRecord>(&mut self, record: &T) -> Result<()> {
        self.write_with(&T::fields(), record)
    }

    /// Write every record, resolving `T`'s fields once. Returns the count.
    pub fn write_records<'a, T, I>(&mut self, records: I) -> Result<usize>
    where
        T: CsvRecord,
        I: IntoIterator<Item = &'a T>,
    {
        let fields = T::fields();
        let mut count = 0;
        for record in records {
            self.write_with(&fields, record)?;
            count += 1;
        }
        Ok(count)
    }

    /// Write one record using explicit field declarations.
    pub fn write_with<T>(&mut self, fields: &[FieldDecl<T>], record: &T) -> Result<()> {
        if self.options.write_headers && !self.header_written {
            self.write_header_with(fields)?;
        }
        let mut first = true;
        for value in fields.iter().filter_map(|f| f.value_of(record)) {
            if !first {
                self.out.extend_from_slice(self.options.column_delimiter.as_bytes());
            }
            first = false;
            match value {
                Value::Null => self.out.extend_from_slice(NULL_LITERAL.as_bytes()),
                other => self.push_text(&other.to_text())?,
            }
        }
        self.end_row()
    }

    /// Write a row of plain strings.
    pub fn write_row<S: AsRef<str>>(&mut self, row: &[S]) -> Result<()> {
        for (i, field) in row.iter().enumerate() {
            if i > 0 {
                self.out.extend_from_slice(self.options.column_delimiter.as_bytes());
            }
            self.push_text(field.as_ref())?;
        }
        self.end_row()
    }

    /// Write buffered output to the sink and flush it.
    pub fn flush(&mut self) -> Result<()> {
        self.drain()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.sink)
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        if !field_needs_quoting(text, &self.reserved) {
            self.out.extend_from_slice(text.as_bytes());
            return Ok(());
        }
        match self.options.quote {
            Some(q) => {
                write_quoted_field(&mut self.out, text, q);
                Ok(())
            }
            None => Err(CsvError::malformed(
                self.rows + 1,
                format!("field {text:?} needs quoting but no quote character is configured"),
            )),
        }
    }

    fn end_row(&mut self) -> Result<()> {
        self.out.extend_from_slice(self.options.row_delimiter.as_bytes());
        self.rows += 1;
        if self.out.len() >= self.options.flush_size {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        if !self.out.is_empty() {
            self.sink.write_all(&self.out)?;
            self.out.clear();
        }
        Ok(())
    }
}

/// Render records to a string.
pub fn write_to_string<T: CsvRecord>(records: &[T], options: WriterOptions) -> Result<String> {
    let mut writer = CsvWriter::new(Vec::new(), options)?;
    writer.write_records(records)?;
    let bytes = writer.into_inner()?;
    String::from_utf8(bytes)
        .map_err(|e| CsvError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Write records to a file, creating or truncating it.
pub fn write_to_path<T: CsvRecord, P: AsRef<Path>>(
    path: P,
    records: &[T],
    options: WriterOptions,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = CsvWriter::new(file, options)?;
    let count = writer.write_records(records)?;
    writer.flush()?;
    debug!(path = %path.as_ref().display(), records = count, "records written");
    Ok(())
}
