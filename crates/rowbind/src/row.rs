//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::field::Record;
use crate::value::{SqlType, Value};

/// A row returned by a driver, addressed by column position.
pub trait Row {
    /// Number of columns in the row.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column label reported by the driver, if any.
    fn column_name(&self, idx: usize) -> Option<&str>;

    /// Decode the column at `idx` into a [`Value`].
    fn value_at(&self, idx: usize) -> OrmResult<Value>;

    /// Decode the column at `idx` into `T`, returning [`OrmError::Scan`] on failure.
    fn get_at<T: SqlType>(&self, idx: usize) -> OrmResult<T> {
        let value = self.value_at(idx)?;
        T::from_value(value).map_err(|e| {
            let column = self.column_name(idx).unwrap_or("?");
            OrmError::scan(idx, column, e.to_string())
        })
    }
}

/// Trait for converting a database row into a Rust struct.
///
/// Binding is positional: column `i` of the row goes to field `i` of the
/// record's descriptor. This trait should typically be derived together with
/// [`Record`] so both come from the same field list:
///
/// ```ignore
/// use rowbind::{FromRow, Record};
///
/// #[derive(Record, FromRow)]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row<R: Row + ?Sized>(row: &R) -> OrmResult<Self>;
}

/// Check that a row carries exactly as many columns as `T` declares.
pub fn check_arity<T: Record, R: Row + ?Sized>(row: &R) -> OrmResult<()> {
    let expected = T::COLUMNS.len();
    let got = row.len();
    if got != expected {
        let column = T::COLUMNS
            .get(got.min(expected))
            .map(|c| c.name)
            .unwrap_or("?");
        return Err(OrmError::scan(
            got.min(expected),
            column,
            format!(
                "row has {got} columns but {} declares {expected}",
                std::any::type_name::<T>()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Column, FieldValue};

    struct VecRow(Vec<(&'static str, Value)>);

    impl Row for VecRow {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn column_name(&self, idx: usize) -> Option<&str> {
            self.0.get(idx).map(|(n, _)| *n)
        }

        fn value_at(&self, idx: usize) -> OrmResult<Value> {
            self.0
                .get(idx)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| OrmError::scan(idx, "?", "no such column"))
        }
    }

    struct Pair;

    impl Record for Pair {
        const COLUMNS: &'static [Column] = &[Column::of::<i64>("id"), Column::of::<String>("name")];

        fn fields(&self) -> Vec<FieldValue> {
            Vec::new()
        }
    }

    #[test]
    fn get_at_reports_column_on_mismatch() {
        let row = VecRow(vec![("id", Value::Text("x".into()))]);
        let err = row.get_at::<i64>(0).unwrap_err();
        match err {
            OrmError::Scan { index, column, .. } => {
                assert_eq!(index, 0);
                assert_eq!(column, "id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn arity_mismatch_is_a_scan_error() {
        let row = VecRow(vec![("id", Value::Int(1))]);
        let err = check_arity::<Pair, _>(&row).unwrap_err();
        assert!(err.is_scan());
        assert!(err.to_string().contains("row has 1 columns"));

        let row = VecRow(vec![("id", Value::Int(1)), ("name", Value::Null)]);
        assert!(check_arity::<Pair, _>(&row).is_ok());
    }
}
