use super::{Clause, Dialect, SqlWriter, StatementKind, check_table};
use crate::error::OrmResult;
use crate::field::FieldValue;

pub(super) fn build(dialect: Dialect, table: &str, values: Vec<FieldValue>) -> OrmResult<Clause> {
    let table = check_table(table)?;

    let columns: Vec<&str> = values.iter().map(FieldValue::name).collect();
    let mut w = SqlWriter::new(dialect, "INSERT INTO ");
    w.push(table).push("(").push(&columns.join(", ")).push(") VALUES (");
    for (i, field) in values.into_iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push_bind(field.value);
    }
    w.push(")");

    Ok(w.finish(StatementKind::Insert))
}
