// Field declarations and column → field binding
//
// A record type describes its columns as a list of `FieldDecl`s. Each decl
// names its column source (header name or fixed ordinal), its target type,
// and type-erased accessors. `Schema::build` resolves the decls against the
// header row once; the result is an ordinal-indexed table the materializer
// consults per column without any further lookups.

use crate::core::{FieldType, FieldValue, Value};
use crate::error::{CsvError, Result};
use std::borrow::Cow;
use tracing::debug;

type Setter<T> = Box<dyn Fn(&mut T, Value) -> bool + Send + Sync>;
type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;

/// Where a field's value comes from in each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// Column whose header text equals this name.
    Header(String),
    /// Fixed zero-based column position.
    Index(usize),
}

/// One field of a record type `T`.
pub struct FieldDecl<T> {
    source: ColumnSource,
    field_type: FieldType,
    set: Setter<T>,
    get: Option<Getter<T>>,
    required: bool,
}

impl<T: 'static> FieldDecl<T> {
    /// Field bound by header name, readable and writable.
    pub fn header<V, S, G>(name: impl Into<String>, set: S, get: G) -> Self
    where
        V: FieldValue + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self::build(ColumnSource::Header(name.into()), set, Some(erase_getter(get)))
    }

    /// Field bound by column ordinal, readable and writable.
    pub fn index<V, S, G>(ordinal: usize, set: S, get: G) -> Self
    where
        V: FieldValue + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self::build(ColumnSource::Index(ordinal), set, Some(erase_getter(get)))
    }

    /// Read-only field bound by header name. Skipped by the writer.
    pub fn header_setter<V, S>(name: impl Into<String>, set: S) -> Self
    where
        V: FieldValue + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::build(ColumnSource::Header(name.into()), set, None)
    }

    /// Read-only field bound by ordinal. Skipped by the writer.
    pub fn index_setter<V, S>(ordinal: usize, set: S) -> Self
    where
        V: FieldValue + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::build(ColumnSource::Index(ordinal), set, None)
    }

    fn build<V, S>(source: ColumnSource, set: S, get: Option<Getter<T>>) -> Self
    where
        V: FieldValue + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let set: Setter<T> = Box::new(move |record, value| match V::from_value(value) {
            Some(v) => {
                set(record, v);
                true
            }
            None => false,
        });
        FieldDecl {
            source,
            field_type: V::field_type(),
            set,
            get,
            required: false,
        }
    }

    /// Fail schema resolution when the column cannot be found.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

fn erase_getter<T, V, G>(get: G) -> Getter<T>
where
    V: FieldValue,
    G: Fn(&T) -> V + Send + Sync + 'static,
{
    Box::new(move |record| get(record).to_value())
}

impl<T> FieldDecl<T> {
    pub fn source(&self) -> &ColumnSource {
        &self.source
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_writable(&self) -> bool {
        self.get.is_some()
    }

    /// Header label written for this field.
    pub fn label(&self) -> Cow<'_, str> {
        match &self.source {
            ColumnSource::Header(name) => Cow::Borrowed(name),
            ColumnSource::Index(ordinal) => Cow::Owned(ordinal.to_string()),
        }
    }

    /// Current value of this field, `None` for setter-only fields.
    pub fn value_of(&self, record: &T) -> Option<Value> {
        self.get.as_ref().map(|get| get(record))
    }
}

impl<T> std::fmt::Debug for FieldDecl<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDecl")
            .field("source", &self.source)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("writable", &self.get.is_some())
            .finish()
    }
}

/// A record type that can be read from and written to delimited text.
///
/// A fresh `T::default()` is the starting point for every row; columns that
/// are absent or empty leave the default in place.
pub trait CsvRecord: Default + Sized + 'static {
    fn fields() -> Vec<FieldDecl<Self>>;
}

/// A declaration resolved to a concrete column.
pub struct FieldBinding<T> {
    label: String,
    field_type: FieldType,
    set: Setter<T>,
}

impl<T> FieldBinding<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Assign `value`. Returns `false` when the value does not fit the field.
    #[inline]
    pub fn assign(&self, record: &mut T, value: Value) -> bool {
        (self.set)(record, value)
    }
}

/// Ordinal-indexed field table. `None` entries are unbound columns.
pub struct Schema<T> {
    bindings: Vec<Option<FieldBinding<T>>>,
}

impl<T> Schema<T> {
    /// Resolve `decls` against the header row (`None` in header-less mode).
    pub fn build(headers: Option<&[String]>, decls: Vec<FieldDecl<T>>) -> Result<Self> {
        let mut bindings: Vec<Option<FieldBinding<T>>> = Vec::new();

        for decl in decls {
            let label = decl.label().into_owned();
            let ordinal = match (&decl.source, headers) {
                (ColumnSource::Header(name), Some(headers)) => {
                    headers.iter().position(|h| h == name)
                }
                (ColumnSource::Header(name), None) => {
                    debug!(field = %name, "header-bound field left unbound without a header row");
                    None
                }
                (ColumnSource::Index(ordinal), Some(headers)) if *ordinal >= headers.len() => None,
                (ColumnSource::Index(ordinal), _) => Some(*ordinal),
            };

            let Some(ordinal) = ordinal else {
                if decl.required && headers.is_some() {
                    return Err(CsvError::config(format!(
                        "required column '{label}' is missing from the header row"
                    )));
                }
                debug!(field = %label, "column not present, field left unbound");
                continue;
            };

            if bindings.len() <= ordinal {
                bindings.resize_with(ordinal + 1, || None);
            }
            if let Some(existing) = &bindings[ordinal] {
                return Err(CsvError::config(format!(
                    "fields '{}' and '{label}' both bind to column {ordinal}",
                    existing.label
                )));
            }
            bindings[ordinal] = Some(FieldBinding {
                label,
                field_type: decl.field_type,
                set: decl.set,
            });
        }

        debug!(
            bound = bindings.iter().filter(|b| b.is_some()).count(),
            width = bindings.len(),
            "schema resolved"
        );
        Ok(Schema { bindings })
    }

    #[inline]
    pub fn binding(&self, ordinal: usize) -> Option<&FieldBinding<T>> {
        self.bindings.get(ordinal).and_then(Option::as_ref)
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.iter().filter(|b| b.is_some()).count()
    }

    /// One past the highest bound ordinal.
    pub fn width(&self) -> usize {
        self.bindings.len()
    }
}
