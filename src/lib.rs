// streamcsv - Streaming delimited-text codec
//
// Pipeline:
// 1. Scanner: chunked reads, quote tracking, delimiter watchers (strategy::scanner)
// 2. Materializer: column spans → string rows, maps or typed records (materialize)
// 3. Schema + caster: header/ordinal binding and strict value conversion (schema, core::cast)
// 4. Optional ordered parallel stage over finished rows (strategy::parallel)
// 5. Writer: quoting, escaping and buffered output (strategy::encode)

pub mod core;
pub mod error;
pub mod materialize;
pub mod memory;
pub mod options;
pub mod reader;
pub mod schema;
pub mod strategy;

// ============================================================================
// Public API
// ============================================================================

pub use crate::core::{cast, CastOptions, FieldKind, FieldType, FieldValue, Value, Watcher};
pub use error::{ConversionError, CsvError, Result};
pub use materialize::{
    default_column_name, ColumnNamer, MapMaterializer, Materializer, RecordMaterializer,
    RowMaterializer,
};
pub use options::{ParseOptions, ReaderOptions, WriterOptions};
pub use reader::{read_records, read_rows, CsvReader, Maps, Records, Rows};
pub use schema::{ColumnSource, CsvRecord, FieldBinding, FieldDecl, Schema};
pub use strategy::encode::{write_to_path, write_to_string, CsvWriter};
pub use strategy::parallel::map_ordered;
pub use strategy::scanner::{CancellationToken, ScanParts, ScanSummary, Scanner};

// Re-exported so downstream crates can name field types without adding deps
pub use chrono::{NaiveDate, NaiveDateTime};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
