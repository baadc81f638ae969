// Text span → typed value conversion
//
// The caster is the only place that interprets field text. It is strict:
// a value that does not parse is an error, never a silent default. The
// null/default rules are:
//   - unquoted `null` on a nullable target      → Value::Null
//   - empty span, defaults allowed              → Value::Null (absent)
//   - empty span, defaults disallowed           → ConversionError
//   - quoted empty span on a string target      → empty string

use super::field::unescape_quotes;
use crate::error::ConversionError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::str::FromStr;
use uuid::Uuid;

/// Literal accepted as "absent" for nullable targets.
pub const NULL_LITERAL: &str = "null";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
    Uuid,
    Date,
    DateTime,
    /// Variant names, matched case-sensitively.
    Enum(&'static [&'static str]),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Char => "char",
            FieldKind::I8 => "i8",
            FieldKind::I16 => "i16",
            FieldKind::I32 => "i32",
            FieldKind::I64 => "i64",
            FieldKind::U8 => "u8",
            FieldKind::U16 => "u16",
            FieldKind::U32 => "u32",
            FieldKind::U64 => "u64",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::Decimal => "decimal",
            FieldKind::String => "string",
            FieldKind::Uuid => "uuid",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Enum(_) => "enum",
        }
    }
}

/// Target type descriptor for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldType {
    pub const fn new(kind: FieldKind) -> Self {
        FieldType {
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(kind: FieldKind) -> Self {
        FieldType {
            kind,
            nullable: true,
        }
    }
}

/// A converted field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Float32(f32),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Enum(&'static str),
}

impl Value {
    /// Textual form used by the writer. `Null` renders as the null literal.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(NULL_LITERAL),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
            Value::Char(c) => Cow::Owned(c.to_string()),
            Value::Int(v) => Cow::Owned(v.to_string()),
            Value::UInt(v) => Cow::Owned(v.to_string()),
            Value::Float32(v) => Cow::Owned(v.to_string()),
            Value::Float(v) => Cow::Owned(v.to_string()),
            Value::Decimal(v) => Cow::Owned(v.to_string()),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Uuid(v) => Cow::Owned(v.hyphenated().to_string()),
            Value::Date(v) => Cow::Owned(v.format(DATE_FORMAT).to_string()),
            Value::DateTime(v) => Cow::Owned(v.format(DATETIME_FORMATS[0]).to_string()),
            Value::Enum(name) => Cow::Borrowed(name),
        }
    }
}

/// Cast settings that come from the parse options rather than the field.
#[derive(Debug, Clone, Copy)]
pub struct CastOptions {
    pub quote: Option<char>,
    pub allow_defaults: bool,
}

impl Default for CastOptions {
    fn default() -> Self {
        CastOptions {
            quote: Some('"'),
            allow_defaults: true,
        }
    }
}

/// Convert a column span (quotes already stripped) into a value of `ty`.
pub fn cast(
    span: &str,
    quoted: bool,
    doubled: bool,
    ty: &FieldType,
    opts: &CastOptions,
) -> Result<Value, ConversionError> {
    if ty.nullable && !quoted && span == NULL_LITERAL {
        return Ok(Value::Null);
    }
    if span.is_empty() {
        if quoted && ty.kind == FieldKind::String {
            return Ok(Value::Text(String::new()));
        }
        if opts.allow_defaults {
            return Ok(Value::Null);
        }
        return Err(ConversionError::new(
            span,
            ty.kind.name(),
            "empty field and defaults are disabled",
        ));
    }

    let expected = ty.kind.name();
    match ty.kind {
        FieldKind::String => Ok(Value::Text(
            unescape_quotes(span, opts.quote, doubled).into_owned(),
        )),
        FieldKind::Char => {
            let text = unescape_quotes(span, opts.quote, doubled);
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(ConversionError::new(span, expected, "expected exactly one character")),
            }
        }
        FieldKind::Bool => {
            if span.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if span.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(ConversionError::new(span, expected, "expected true or false"))
            }
        }
        FieldKind::I8 => parse::<i8>(span, expected).map(|v| Value::Int(v.into())),
        FieldKind::I16 => parse::<i16>(span, expected).map(|v| Value::Int(v.into())),
        FieldKind::I32 => parse::<i32>(span, expected).map(|v| Value::Int(v.into())),
        FieldKind::I64 => parse::<i64>(span, expected).map(Value::Int),
        FieldKind::U8 => parse::<u8>(span, expected).map(|v| Value::UInt(v.into())),
        FieldKind::U16 => parse::<u16>(span, expected).map(|v| Value::UInt(v.into())),
        FieldKind::U32 => parse::<u32>(span, expected).map(|v| Value::UInt(v.into())),
        FieldKind::U64 => parse::<u64>(span, expected).map(Value::UInt),
        FieldKind::F32 => parse::<f32>(span, expected).map(Value::Float32),
        FieldKind::F64 => parse::<f64>(span, expected).map(Value::Float),
        FieldKind::Decimal => parse::<Decimal>(span, expected).map(Value::Decimal),
        FieldKind::Uuid => Uuid::try_parse(span)
            .map(Value::Uuid)
            .map_err(|e| ConversionError::new(span, expected, e)),
        FieldKind::Date => NaiveDate::parse_from_str(span, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| ConversionError::new(span, expected, e)),
        FieldKind::DateTime => parse_datetime(span).map(Value::DateTime),
        FieldKind::Enum(variants) => variants
            .iter()
            .find(|name| **name == span)
            .map(|name| Value::Enum(*name))
            .ok_or_else(|| ConversionError::new(span, expected, "unknown variant")),
    }
}

#[inline]
fn parse<T>(span: &str, expected: &'static str) -> Result<T, ConversionError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    span.parse::<T>()
        .map_err(|e| ConversionError::new(span, expected, e))
}

fn parse_datetime(span: &str) -> Result<NaiveDateTime, ConversionError> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(span, format) {
            return Ok(dt);
        }
    }
    DateTime::parse_from_rfc3339(span)
        .map(|dt| dt.naive_utc())
        .map_err(|e| ConversionError::new(span, "datetime", e))
}

/// Rust types that can be bound to a column.
///
/// Implemented for the primitive kinds, `String`, `Decimal`, `Uuid`,
/// `NaiveDate`, `NaiveDateTime` and `Option` of any of them. Enums use
/// [`csv_enum!`](crate::csv_enum).
pub trait FieldValue: Sized {
    fn field_type() -> FieldType;
    /// `None` when the value does not fit this type.
    fn from_value(value: Value) -> Option<Self>;
    fn to_value(&self) -> Value;
}

macro_rules! impl_field_value {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl FieldValue for $ty {
            fn field_type() -> FieldType {
                FieldType::new(FieldKind::$kind)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => v.try_into().ok(),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone().into())
            }
        }
    };
}

impl_field_value!(bool, Bool, Bool);
impl_field_value!(char, Char, Char);
impl_field_value!(i8, I8, Int);
impl_field_value!(i16, I16, Int);
impl_field_value!(i32, I32, Int);
impl_field_value!(i64, I64, Int);
impl_field_value!(u8, U8, UInt);
impl_field_value!(u16, U16, UInt);
impl_field_value!(u32, U32, UInt);
impl_field_value!(u64, U64, UInt);
impl_field_value!(f32, F32, Float32);
impl_field_value!(f64, F64, Float);
impl_field_value!(Decimal, Decimal, Decimal);
impl_field_value!(String, String, Text);
impl_field_value!(Uuid, Uuid, Uuid);
impl_field_value!(NaiveDate, Date, Date);
impl_field_value!(NaiveDateTime, DateTime, DateTime);

impl<V: FieldValue> FieldValue for Option<V> {
    fn field_type() -> FieldType {
        FieldType::nullable(V::field_type().kind)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => V::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

/// Implement [`FieldValue`] for a fieldless enum, mapping variants by name.
///
/// ```
/// #[derive(Debug, Clone, Copy, Default, PartialEq)]
/// enum CardType { #[default] Attachment, Spell }
/// streamcsv::csv_enum!(CardType { Attachment, Spell });
/// ```
#[macro_export]
macro_rules! csv_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::FieldValue for $ty {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::new($crate::FieldKind::Enum(&[$(stringify!($variant)),+]))
            }

            fn from_value(value: $crate::Value) -> ::core::option::Option<Self> {
                match value {
                    $crate::Value::Enum(name) => match name {
                        $(stringify!($variant) => ::core::option::Option::Some($ty::$variant),)+
                        _ => ::core::option::Option::None,
                    },
                    _ => ::core::option::Option::None,
                }
            }

            fn to_value(&self) -> $crate::Value {
                match self {
                    $($ty::$variant => $crate::Value::Enum(stringify!($variant)),)+
                }
            }
        }
    };
}
