use super::{Clause, Dialect, SqlWriter, StatementKind, check_table};
use crate::error::{OrmError, OrmResult};
use crate::field::FieldValue;

pub(super) fn build(
    dialect: Dialect,
    table: &str,
    values: Vec<FieldValue>,
    filter: Vec<FieldValue>,
) -> OrmResult<Clause> {
    let table = check_table(table)?;
    if values.is_empty() {
        return Err(OrmError::invalid_argument(format!(
            "UPDATE {table} has no set fields to assign"
        )));
    }

    let mut w = SqlWriter::new(dialect, "UPDATE ");
    w.push(table)
        .push(" SET ")
        .push_assignments(values, ", ")
        .push_filter(filter);

    Ok(w.finish(StatementKind::Update))
}
