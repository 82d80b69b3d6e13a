//! Result materializer: turns driver rows into new record instances.

use crate::error::OrmResult;
use crate::row::{FromRow, Row};
use futures_core::Stream;
use futures_util::StreamExt;

/// Scan an optional single row. An absent row stays `None`; it is never
/// confused with a row whose fields all hold default values.
pub fn scan_opt<T: FromRow, R: Row>(row: Option<R>) -> OrmResult<Option<T>> {
    row.as_ref().map(T::from_row).transpose()
}

/// Append one record per cursor row to `out`, in cursor order.
///
/// Stops at the first cursor or scan error and returns it. Records appended
/// before the failure stay in `out`, so callers must not assume `out` is
/// untouched on error. Returns the number of records appended.
pub async fn scan_into<T, R, C>(mut rows: C, out: &mut Vec<T>) -> OrmResult<usize>
where
    T: FromRow,
    R: Row,
    C: Stream<Item = OrmResult<R>> + Unpin,
{
    let mut appended = 0;
    while let Some(row) = rows.next().await {
        let record = T::from_row(&row?)?;
        out.push(record);
        appended += 1;
    }
    Ok(appended)
}
