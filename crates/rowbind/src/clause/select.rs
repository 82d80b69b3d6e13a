use super::{Clause, Dialect, SqlWriter, StatementKind, check_table};
use crate::error::{OrmError, OrmResult};
use crate::field::{FieldValue, Record};

pub(super) fn build<R: Record>(
    dialect: Dialect,
    table: &str,
    filter: Vec<FieldValue>,
) -> OrmResult<Clause> {
    let table = check_table(table)?;
    if R::COLUMNS.is_empty() {
        return Err(OrmError::unsupported_type(format!(
            "{} declares no columns to select",
            std::any::type_name::<R>()
        )));
    }

    let mut w = SqlWriter::new(dialect, "SELECT ");
    for (i, column) in R::COLUMNS.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        // Optional text keeps NULL so it can scan back to `None`.
        if column.kind.is_text() && !column.nullable {
            let expr = w.dialect().coalesce_text(column.name);
            w.push(&expr);
        } else {
            w.push(column.name);
        }
    }
    w.push(" FROM ").push(table).push_filter(filter);

    Ok(w.finish(StatementKind::Select))
}
