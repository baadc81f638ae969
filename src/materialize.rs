// Row materializers
//
// The scanner hands each finished column to a `Materializer`, which turns a
// sequence of column spans into one output row. Three shapes are provided:
// plain string lists, header-keyed maps and typed records.

use crate::core::{cast, is_blank, unescape_quotes, CastOptions, Value};
use crate::error::ConversionError;
use crate::schema::Schema;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds one output row from the column spans of that row.
///
/// Spans arrive in column order with wrapping quotes already removed. The
/// scanner calls [`take`](Materializer::take) when a row surfaces and
/// [`reset`](Materializer::reset) when it is dropped.
pub trait Materializer {
    type Output;

    /// Consume the next column of the current row.
    fn add_column(&mut self, span: &str, quoted: bool, doubled: bool)
        -> Result<(), ConversionError>;

    /// No non-blank value has been observed in the current row.
    fn is_empty(&self) -> bool;

    /// At least one column has been added to the current row.
    fn is_column_set(&self) -> bool {
        self.column_count() > 0
    }

    fn column_count(&self) -> usize;

    /// Hand out the current row and start a fresh one.
    fn take(&mut self) -> Self::Output;

    /// Discard the current row.
    fn reset(&mut self);
}

// ============================================================================
// Vec<String> rows
// ============================================================================

/// Collects every column as an owned string.
#[derive(Debug, Clone)]
pub struct RowMaterializer {
    quote: Option<char>,
    row: Vec<String>,
    non_blank: bool,
}

impl RowMaterializer {
    pub fn new(quote: Option<char>) -> Self {
        RowMaterializer {
            quote,
            row: Vec::new(),
            non_blank: false,
        }
    }
}

impl Materializer for RowMaterializer {
    type Output = Vec<String>;

    fn add_column(&mut self, span: &str, _quoted: bool, doubled: bool) -> Result<(), ConversionError> {
        if !is_blank(span) {
            self.non_blank = true;
        }
        self.row
            .push(unescape_quotes(span, self.quote, doubled).into_owned());
        Ok(())
    }

    fn is_empty(&self) -> bool {
        !self.non_blank
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }

    fn take(&mut self) -> Vec<String> {
        let width = self.row.len();
        self.non_blank = false;
        std::mem::replace(&mut self.row, Vec::with_capacity(width))
    }

    fn reset(&mut self) {
        self.row.clear();
        self.non_blank = false;
    }
}

// ============================================================================
// Header-keyed maps
// ============================================================================

/// Names a column that has no header, given its 0-based ordinal.
pub type ColumnNamer = Arc<dyn Fn(usize) -> String + Send + Sync>;

/// Default name for a column past the header row: `Column{ordinal}`.
pub fn default_column_name(ordinal: usize) -> String {
    format!("Column{ordinal}")
}

/// Keys each column by its header. Columns past the header row are keyed
/// by the extra-column namer (`Column2`, `Column3`, ... by default).
#[derive(Clone)]
pub struct MapMaterializer {
    quote: Option<char>,
    headers: Vec<String>,
    extra: ColumnNamer,
    row: HashMap<String, String>,
    columns: usize,
    non_blank: bool,
}

impl MapMaterializer {
    pub fn new(headers: Vec<String>, quote: Option<char>) -> Self {
        let capacity = headers.len();
        MapMaterializer {
            quote,
            headers,
            extra: Arc::new(default_column_name),
            row: HashMap::with_capacity(capacity),
            columns: 0,
            non_blank: false,
        }
    }

    /// Replace how columns past the header row are named.
    pub fn with_extra_columns<F>(mut self, name: F) -> Self
    where
        F: Fn(usize) -> String + Send + Sync + 'static,
    {
        self.extra = Arc::new(name);
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl fmt::Debug for MapMaterializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapMaterializer")
            .field("quote", &self.quote)
            .field("headers", &self.headers)
            .field("row", &self.row)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl Materializer for MapMaterializer {
    type Output = HashMap<String, String>;

    fn add_column(&mut self, span: &str, _quoted: bool, doubled: bool) -> Result<(), ConversionError> {
        let key = match self.headers.get(self.columns) {
            Some(header) => header.clone(),
            None => (self.extra)(self.columns),
        };
        if !is_blank(span) {
            self.non_blank = true;
        }
        let value = unescape_quotes(span, self.quote, doubled).into_owned();
        self.row.insert(key, value);
        self.columns += 1;
        Ok(())
    }

    fn is_empty(&self) -> bool {
        !self.non_blank
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn take(&mut self) -> HashMap<String, String> {
        self.columns = 0;
        self.non_blank = false;
        std::mem::replace(&mut self.row, HashMap::with_capacity(self.headers.len()))
    }

    fn reset(&mut self) {
        self.row.clear();
        self.columns = 0;
        self.non_blank = false;
    }
}

// ============================================================================
// Typed records
// ============================================================================

/// Casts bound columns into fields of `T`; unbound columns are skipped.
pub struct RecordMaterializer<T> {
    schema: Schema<T>,
    options: CastOptions,
    current: T,
    columns: usize,
    non_blank: bool,
}

impl<T: Default> RecordMaterializer<T> {
    pub fn new(schema: Schema<T>, options: CastOptions) -> Self {
        RecordMaterializer {
            schema,
            options,
            current: T::default(),
            columns: 0,
            non_blank: false,
        }
    }

    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }
}

impl<T: Default> Materializer for RecordMaterializer<T> {
    type Output = T;

    fn add_column(&mut self, span: &str, quoted: bool, doubled: bool) -> Result<(), ConversionError> {
        let ordinal = self.columns;
        self.columns += 1;

        let Some(binding) = self.schema.binding(ordinal) else {
            return Ok(());
        };
        if !is_blank(span) {
            self.non_blank = true;
        }

        let field_type = binding.field_type();
        let value = cast(span, quoted, doubled, field_type, &self.options)?;
        if value == Value::Null && !field_type.nullable {
            // absent: keep the default
            return Ok(());
        }
        if !binding.assign(&mut self.current, value) {
            return Err(ConversionError::new(
                span,
                field_type.kind.name(),
                format!("value does not fit field '{}'", binding.label()),
            ));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        !self.non_blank
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn take(&mut self) -> T {
        self.columns = 0;
        self.non_blank = false;
        std::mem::take(&mut self.current)
    }

    fn reset(&mut self) {
        self.current = T::default();
        self.columns = 0;
        self.non_blank = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDecl;

    #[test]
    fn test_row_materializer() {
        let mut m = RowMaterializer::new(Some('"'));
        assert!(!m.is_column_set());
        m.add_column("a", false, false).unwrap();
        m.add_column("say \"\"hi\"\"", true, true).unwrap();
        assert_eq!(m.column_count(), 2);
        assert!(!m.is_empty());
        assert_eq!(m.take(), vec!["a".to_string(), "say \"hi\"".to_string()]);
        assert!(!m.is_column_set());
        assert!(m.is_empty());
    }

    #[test]
    fn test_row_materializer_blank_row() {
        let mut m = RowMaterializer::new(Some('"'));
        m.add_column("  ", false, false).unwrap();
        m.add_column("", false, false).unwrap();
        assert!(m.is_column_set());
        assert!(m.is_empty());
        m.reset();
        assert_eq!(m.column_count(), 0);
    }

    #[test]
    fn test_map_materializer_names_extra_columns() {
        let headers = vec!["name".to_string(), "cost".to_string()];
        let mut m = MapMaterializer::new(headers, Some('"'));
        m.add_column("Claws", false, false).unwrap();
        m.add_column("3", false, false).unwrap();
        m.add_column("extra", false, false).unwrap();
        assert_eq!(m.column_count(), 3);
        let row = m.take();
        assert_eq!(row.len(), 3);
        assert_eq!(row["name"], "Claws");
        assert_eq!(row["cost"], "3");
        assert_eq!(row["Column2"], "extra");
    }

    #[test]
    fn test_map_materializer_custom_extra_names() {
        let headers = vec!["name".to_string()];
        let mut m = MapMaterializer::new(headers, None).with_extra_columns(|i| format!("extra_{}", i + 1));
        m.add_column("Claws", false, false).unwrap();
        m.add_column("x", false, false).unwrap();
        m.add_column("y", false, false).unwrap();
        let row = m.take();
        assert_eq!(row["extra_2"], "x");
        assert_eq!(row["extra_3"], "y");
        assert_eq!(m.headers(), ["name"]);
    }

    #[derive(Debug, Default, PartialEq)]
    struct Card {
        name: String,
        cost: i32,
        rating: Option<f64>,
    }

    fn card_materializer(allow_defaults: bool) -> RecordMaterializer<Card> {
        let headers: Vec<String> = ["name", "id", "cost", "rating"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let fields = vec![
            FieldDecl::header_setter("name", |c: &mut Card, v| c.name = v),
            FieldDecl::header_setter("cost", |c: &mut Card, v| c.cost = v),
            FieldDecl::header_setter("rating", |c: &mut Card, v| c.rating = v),
        ];
        let schema = Schema::build(Some(headers.as_slice()), fields).unwrap();
        RecordMaterializer::new(
            schema,
            CastOptions {
                quote: Some('"'),
                allow_defaults,
            },
        )
    }

    #[test]
    fn test_record_materializer_casts_bound_columns() {
        let mut m = card_materializer(true);
        m.add_column("Claws", false, false).unwrap();
        m.add_column("not-a-number", false, false).unwrap(); // unbound "id"
        m.add_column("3", false, false).unwrap();
        m.add_column("4.5", false, false).unwrap();
        assert_eq!(
            m.take(),
            Card {
                name: "Claws".into(),
                cost: 3,
                rating: Some(4.5),
            }
        );
    }

    #[test]
    fn test_record_materializer_defaults_and_nulls() {
        let mut m = card_materializer(true);
        m.add_column("Claws", false, false).unwrap();
        m.add_column("", false, false).unwrap();
        m.add_column("", false, false).unwrap();
        m.add_column("null", false, false).unwrap();
        let card = m.take();
        assert_eq!(card.cost, 0);
        assert_eq!(card.rating, None);
    }

    #[test]
    fn test_record_materializer_conversion_error() {
        let mut m = card_materializer(false);
        m.add_column("Claws", false, false).unwrap();
        m.add_column("", false, false).unwrap();
        let err = m.add_column("", false, false).unwrap_err();
        assert_eq!(err.expected, "i32");

        let err = {
            m.reset();
            m.add_column("Claws", false, false).unwrap();
            m.add_column("x", false, false).unwrap();
            m.add_column("three", false, false).unwrap_err()
        };
        assert_eq!(err.value, "three");
    }

    #[test]
    fn test_record_emptiness_counts_bound_columns_only() {
        let mut m = card_materializer(true);
        m.add_column("", false, false).unwrap();
        m.add_column("id-only", false, false).unwrap();
        assert!(m.is_column_set());
        assert!(m.is_empty());
        m.reset();
        assert_eq!(m.take(), Card::default());
    }
}
