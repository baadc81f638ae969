// Core primitives for delimited-text scanning

pub mod cast;
pub mod field;
pub mod watcher;

pub use cast::{cast, CastOptions, FieldKind, FieldType, FieldValue, Value, NULL_LITERAL};
pub use field::*;
pub use watcher::Watcher;
