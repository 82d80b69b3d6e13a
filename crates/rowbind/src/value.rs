//! SQL values and the Rust types that map onto them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

/// An owned SQL value, used both for statement parameters and decoded row columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Date(_) => "date",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }
}

/// The kind of a record field, as far as SQL generation and the zero-value policy care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Bool,
    Timestamp,
    TimestampTz,
    Date,
    Uuid,
    Json,
}

impl FieldKind {
    pub fn is_text(self) -> bool {
        matches!(self, FieldKind::Text)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Timestamp => "timestamp",
            FieldKind::TimestampTz => "timestamptz",
            FieldKind::Date => "date",
            FieldKind::Uuid => "uuid",
            FieldKind::Json => "json",
        };
        f.write_str(name)
    }
}

/// A failed conversion from a [`Value`] into a Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertError {
    pub expected: &'static str,
    pub found: &'static str,
    pub detail: Option<String>,
}

impl ConvertError {
    fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.type_name(),
            detail: None,
        }
    }

    fn out_of_range(
        expected: &'static str,
        found: &'static str,
        value: impl fmt::Display,
    ) -> Self {
        Self {
            expected,
            found,
            detail: Some(format!("{value} is out of range")),
        }
    }
}

/// Narrow a double to `f32`, rejecting finite values that would overflow to
/// infinity. NaN and infinities pass through unchanged.
pub(crate) fn narrow_f32(value: f64) -> Result<f32, ConvertError> {
    let narrowed = value as f32;
    if value.is_finite() && !narrowed.is_finite() {
        return Err(ConvertError::out_of_range("f32", "float", format!("{value:e}")));
    }
    Ok(narrowed)
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConvertError {}

/// A Rust type that can be a record field.
///
/// `KIND` and `NULLABLE` end up in the record's column descriptor; the two
/// conversions are used for parameters and for row scanning respectively.
///
/// Integers are carried as `i64`, so the supported widths are those that
/// widen losslessly: `i8`, `i16`, `i32`, `i64`, `u8`, `u16` and `u32`.
/// `u64`, `usize` and `i128` are not fields; store them as `i64` instead.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be a record field",
    note = "supported field types: String, bool, f32, f64, i8..=i64, u8..=u32, \
            chrono dates and timestamps, uuid::Uuid, serde_json::Value, and Option of those"
)]
pub trait SqlType: Sized {
    const KIND: FieldKind;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConvertError>;
}

impl SqlType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ConvertError::mismatch("text", &other)),
        }
    }
}

macro_rules! impl_sql_type_int {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(
            impl SqlType for $t {
                const KIND: FieldKind = FieldKind::Integer;

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, ConvertError> {
                    match value {
                        Value::Int(i) => {
                            <$t>::try_from(i).map_err(|_| ConvertError::out_of_range($name, "integer", i))
                        }
                        other => Err(ConvertError::mismatch($name, &other)),
                    }
                }
            }
        )*
    };
}

impl_sql_type_int!(
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
);

impl SqlType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(ConvertError::mismatch("float", &other)),
        }
    }
}

impl SqlType for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        narrow_f32(f64::from_value(value)?)
    }
}

impl SqlType for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(b) => Ok(b),
            // MySQL reports BOOL columns as TINYINT(1)
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => Err(ConvertError::mismatch("bool", &other)),
        }
    }
}

impl SqlType for NaiveDateTime {
    const KIND: FieldKind = FieldKind::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::TimestampTz(t) => Ok(t.naive_utc()),
            other => Err(ConvertError::mismatch("timestamp", &other)),
        }
    }
}

impl SqlType for DateTime<Utc> {
    const KIND: FieldKind = FieldKind::TimestampTz;

    fn to_value(&self) -> Value {
        Value::TimestampTz(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::TimestampTz(t) => Ok(t),
            Value::Timestamp(t) => Ok(t.and_utc()),
            other => Err(ConvertError::mismatch("timestamptz", &other)),
        }
    }
}

impl SqlType for NaiveDate {
    const KIND: FieldKind = FieldKind::Date;

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(ConvertError::mismatch("date", &other)),
        }
    }
}

impl SqlType for uuid::Uuid {
    const KIND: FieldKind = FieldKind::Uuid;

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(s) => uuid::Uuid::parse_str(&s).map_err(|e| ConvertError {
                expected: "uuid",
                found: "text",
                detail: Some(e.to_string()),
            }),
            other => Err(ConvertError::mismatch("uuid", &other)),
        }
    }
}

impl SqlType for serde_json::Value {
    const KIND: FieldKind = FieldKind::Json;

    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| ConvertError {
                expected: "json",
                found: "text",
                detail: Some(e.to_string()),
            }),
            other => Err(ConvertError::mismatch("json", &other)),
        }
    }
}

// `None` is "absent": excluded from filters/assignments and scanned from NULL.
impl<T: SqlType> SqlType for Option<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
