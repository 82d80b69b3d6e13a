//! Record descriptors and the zero-value policy.
//!
//! A [`Record`] describes its fields once, in declaration order. The same
//! descriptor renders SELECT column lists, picks filter/assignment columns, and
//! fixes the positional binding used when rows are scanned back, so the three
//! can never disagree about column order.
//!
//! Usually derived:
//!
//! ```ignore
//! use rowbind::Record;
//!
//! #[derive(Record)]
//! struct UserFilter {
//!     name: String,
//!     age: i32,
//! }
//! ```

use crate::value::{FieldKind, SqlType, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// One column of a record descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl Column {
    pub const fn new(name: &'static str, kind: FieldKind, nullable: bool) -> Self {
        Self {
            name,
            kind,
            nullable,
        }
    }

    /// Descriptor entry for a field of Rust type `T`.
    pub const fn of<T: SqlType>(name: &'static str) -> Self {
        Self::new(name, T::KIND, T::NULLABLE)
    }
}

/// A single introspected field of a record instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub column: Column,
    pub value: Value,
}

impl FieldValue {
    pub fn of<T: SqlType>(column: Column, value: &T) -> Self {
        Self {
            column,
            value: value.to_value(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.column.name
    }

    pub fn is_unset(&self) -> bool {
        is_unset(&self.column, &self.value)
    }
}

/// A typed record with a fixed, ordered set of named fields.
///
/// Field order is part of the contract: it is the SQL column order and the
/// positional order used by [`crate::FromRow`]. Reordering fields is a
/// breaking change for stored data access.
pub trait Record {
    /// Columns in declaration order.
    const COLUMNS: &'static [Column];

    /// The instance's fields, in the same order as [`Record::COLUMNS`].
    fn fields(&self) -> Vec<FieldValue>;
}

/// The empty record: no columns, so it never filters anything.
impl Record for () {
    const COLUMNS: &'static [Column] = &[];

    fn fields(&self) -> Vec<FieldValue> {
        Vec::new()
    }
}

/// Whether a field counts as "unset" and is left out of filters and assignments.
///
/// - nullable (`Option<T>`): unset iff absent, so `Some(0)` is an explicit zero
/// - text: the empty string
/// - integer / float: exactly zero
/// - bool: never
/// - timestamp / timestamptz / date: the Unix epoch
/// - uuid / json: never
pub fn is_unset(column: &Column, value: &Value) -> bool {
    if column.nullable || value.is_null() {
        return value.is_null();
    }
    match (column.kind, value) {
        (FieldKind::Text, Value::Text(s)) => s.is_empty(),
        (FieldKind::Integer, Value::Int(i)) => *i == 0,
        (FieldKind::Float, Value::Float(f)) => *f == 0.0,
        (FieldKind::Bool, _) => false,
        (FieldKind::Timestamp, Value::Timestamp(t)) => *t == NaiveDateTime::default(),
        (FieldKind::TimestampTz, Value::TimestampTz(t)) => *t == DateTime::<Utc>::default(),
        (FieldKind::Date, Value::Date(d)) => *d == NaiveDate::default(),
        _ => false,
    }
}

/// The set fields of `record`, in declaration order.
pub fn present_fields<R: Record + ?Sized>(record: &R) -> Vec<FieldValue> {
    record
        .fields()
        .into_iter()
        .filter(|f| !f.is_unset())
        .collect()
}
