use super::{Clause, Dialect, SqlWriter, StatementKind, check_table};
use crate::error::OrmResult;
use crate::field::FieldValue;

pub(super) fn build(dialect: Dialect, table: &str, filter: Vec<FieldValue>) -> OrmResult<Clause> {
    let table = check_table(table)?;

    let mut w = SqlWriter::new(dialect, "DELETE FROM ");
    w.push(table).push_filter(filter);

    Ok(w.finish(StatementKind::Delete))
}
