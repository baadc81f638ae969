// Reader facade
//
// Loads the header row (with its own options) on construction, then hands
// the stream to a data scanner producing string rows, header-keyed maps or
// typed records. The stream is never seeked: the header scanner's unscanned
// bytes are passed on to the data scanner.

use crate::core::CastOptions;
use crate::error::{CsvError, Result};
use crate::materialize::{
    default_column_name, MapMaterializer, Materializer, RecordMaterializer, RowMaterializer,
};
use crate::options::ReaderOptions;
use crate::schema::{CsvRecord, FieldDecl, Schema};
use crate::strategy::scanner::{ScanParts, Scanner};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Data rows as string lists.
pub type Rows<R> = Scanner<R, RowMaterializer>;
/// Data rows keyed by header.
pub type Maps<R> = Scanner<R, MapMaterializer>;
/// Data rows as typed records.
pub type Records<R, T> = Scanner<R, RecordMaterializer<T>>;

/// Entry point for reading delimited text.
///
/// Takes the stream by value: pass `&mut stream` to keep ownership, or an
/// owned stream to have it dropped with the reader.
pub struct CsvReader<R> {
    parts: ScanParts<R>,
    options: ReaderOptions,
    headers: Option<Vec<String>>,
}

impl<R: Read> CsvReader<R> {
    /// Validate `options` and, when enabled, load the header row.
    pub fn new(reader: R, options: ReaderOptions) -> Result<Self> {
        options.validate()?;

        if !options.parse_headers {
            return Ok(CsvReader {
                parts: ScanParts::new(reader),
                options,
                headers: None,
            });
        }

        let header_options = options.header_options();
        let quote = header_options.quote;
        let mut scanner = Scanner::new(reader, header_options, RowMaterializer::new(quote))?;
        let headers = match scanner.next() {
            Some(row) => row?,
            None => return Err(CsvError::config("no header row found in the stream")),
        };
        debug!(?headers, row = scanner.row(), "header row loaded");

        Ok(CsvReader {
            parts: scanner.into_parts(),
            options,
            headers: Some(headers),
        })
    }

    /// Header names, `None` in header-less mode.
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Scan data rows as string lists.
    pub fn rows(self) -> Result<Rows<R>> {
        let quote = self.options.data.quote;
        self.scanner(RowMaterializer::new(quote))
    }

    /// Scan data rows as header-keyed maps. Needs a header row. Columns
    /// past the header row are keyed `Column{ordinal}`.
    pub fn maps(self) -> Result<Maps<R>> {
        self.maps_with(default_column_name)
    }

    /// Like [`maps`](Self::maps), with `name` choosing the key of each
    /// column past the header row from its 0-based ordinal.
    pub fn maps_with<F>(mut self, name: F) -> Result<Maps<R>>
    where
        F: Fn(usize) -> String + Send + Sync + 'static,
    {
        let Some(headers) = self.headers.take() else {
            return Err(CsvError::config("map rows need a header row"));
        };
        let width = headers.len();
        let quote = self.options.data.quote;
        let materializer = MapMaterializer::new(headers, quote).with_extra_columns(name);
        Ok(self.scanner(materializer)?.with_expected_columns(width))
    }

    /// Scan data rows into records of `T`.
    pub fn records<T: CsvRecord>(self) -> Result<Records<R, T>> {
        self.records_with(T::fields())
    }

    /// Scan data rows into records described by `fields`.
    pub fn records_with<T: Default>(self, fields: Vec<FieldDecl<T>>) -> Result<Records<R, T>> {
        let schema = Schema::build(self.headers(), fields)?;
        let cast_options = CastOptions {
            quote: self.options.data.quote,
            allow_defaults: self.options.data.allow_defaults,
        };
        self.scanner(RecordMaterializer::new(schema, cast_options))
    }

    /// Release the stream without scanning any data rows.
    pub fn into_inner(self) -> R {
        self.parts.reader
    }

    fn scanner<M: Materializer>(self, materializer: M) -> Result<Scanner<R, M>> {
        let CsvReader {
            parts,
            options,
            headers,
        } = self;
        let scanner = Scanner::resume(parts, options.data, materializer)?;
        Ok(match headers {
            Some(headers) => scanner.with_expected_columns(headers.len()),
            None => scanner,
        })
    }
}

impl<'a> CsvReader<&'a [u8]> {
    /// Reader over in-memory text.
    pub fn from_text(text: &'a str, options: ReaderOptions) -> Result<Self> {
        CsvReader::new(text.as_bytes(), options)
    }
}

impl CsvReader<File> {
    /// Reader over a file. The file is closed when the reader (or the
    /// scanner built from it) is dropped.
    pub fn from_path<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened input file");
        CsvReader::new(file, options)
    }
}

/// Read every record of `T` from `text`.
pub fn read_records<T: CsvRecord>(text: &str, options: ReaderOptions) -> Result<Vec<T>> {
    CsvReader::from_text(text, options)?.records::<T>()?.collect()
}

/// Read every data row of `text` as strings.
pub fn read_rows(text: &str, options: ReaderOptions) -> Result<Vec<Vec<String>>> {
    CsvReader::from_text(text, options)?.rows()?.collect()
}
