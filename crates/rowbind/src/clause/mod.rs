//! Clause builders: typed records in, SQL text plus ordered parameters out.
//!
//! Every builder picks its columns through [`present_fields`], so the rule for
//! what counts as "unset" is the same for SELECT filters, INSERT columns,
//! UPDATE assignments and DELETE filters.
//!
//! ```ignore
//! use rowbind::clause;
//!
//! let c = clause::select::<User, _>("users", &UserFilter { name: "".into(), age: 30 })?;
//! assert_eq!(c.sql(), "SELECT id, IFNULL(name, '') AS name, age FROM users WHERE age = ?");
//! ```
//!
//! An all-unset selector produces UPDATE/DELETE statements **without** a WHERE
//! clause, which affect every row. [`Clause::has_where`] exposes this so callers
//! (and [`crate::ClientConfig`] policies) can refuse such statements.

mod delete;
mod insert;
mod select;
mod update;

use crate::error::{OrmError, OrmResult};
use crate::field::{FieldValue, Record, present_fields};
use crate::row::FromRow;
use crate::value::Value;
use std::fmt;

/// The statement kinds the builders produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        })
    }
}

/// Placeholder and null-coalescing syntax of the target server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `?` placeholders, `IFNULL(col, '')`.
    #[default]
    MySql,
    /// `$n` placeholders, `COALESCE(col, '')`.
    Postgres,
}

impl Dialect {
    /// Placeholder for the `n`-th (1-based) parameter.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::MySql => "?".to_string(),
            Dialect::Postgres => format!("${n}"),
        }
    }

    /// Expression that reads a text column with NULL mapped to `''`.
    pub fn coalesce_text(self, column: &str) -> String {
        match self {
            Dialect::MySql => format!("IFNULL({column}, '') AS {column}"),
            Dialect::Postgres => format!("COALESCE({column}, '') AS {column}"),
        }
    }
}

/// Generated SQL text plus its ordered parameter list.
///
/// Parameters appear in exactly the order of the placeholders in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    kind: StatementKind,
    sql: String,
    params: Vec<Value>,
    has_where: bool,
}

impl Clause {
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Whether a WHERE clause was emitted.
    ///
    /// `false` for UPDATE/DELETE means the statement affects every row.
    pub fn has_where(&self) -> bool {
        self.has_where
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Incremental SQL text with placeholders numbered as parameters are pushed.
pub(crate) struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
    has_where: bool,
}

impl SqlWriter {
    pub(crate) fn new(dialect: Dialect, initial: &str) -> Self {
        Self {
            dialect,
            sql: initial.to_string(),
            params: Vec::new(),
            has_where: false,
        }
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn push(&mut self, s: &str) -> &mut Self {
        self.sql.push_str(s);
        self
    }

    pub(crate) fn push_bind(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self
    }

    /// `<name> = ?` pairs joined by `sep`.
    pub(crate) fn push_assignments(&mut self, fields: Vec<FieldValue>, sep: &str) -> &mut Self {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            self.push(field.name()).push(" = ");
            self.push_bind(field.value);
        }
        self
    }

    /// ` WHERE a = ? AND b = ?` over the set fields, or nothing at all.
    pub(crate) fn push_filter(&mut self, fields: Vec<FieldValue>) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        self.has_where = true;
        self.push(" WHERE ").push_assignments(fields, " AND ")
    }

    pub(crate) fn finish(self, kind: StatementKind) -> Clause {
        Clause {
            kind,
            sql: self.sql,
            params: self.params,
            has_where: self.has_where,
        }
    }
}

pub(crate) fn check_table(table: &str) -> OrmResult<&str> {
    let table = table.trim();
    if table.is_empty() {
        return Err(OrmError::invalid_argument("table name must not be empty"));
    }
    Ok(table)
}

/// Builds clauses for one [`Dialect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClauseBuilder {
    dialect: Dialect,
}

impl ClauseBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `SELECT <columns of R> FROM <table> [WHERE ...]`.
    ///
    /// `R` is the result record type; it fixes the projected columns whether
    /// one record or a collection is materialized.
    pub fn select<R, S>(&self, table: &str, selector: &S) -> OrmResult<Clause>
    where
        R: Record + FromRow,
        S: Record,
    {
        select::build::<R>(self.dialect, table, present_fields(selector))
    }

    /// `INSERT INTO <table>(<set columns>) VALUES (...)`.
    pub fn insert<V: Record>(&self, table: &str, values: &V) -> OrmResult<Clause> {
        insert::build(self.dialect, table, present_fields(values))
    }

    /// `UPDATE <table> SET ... [WHERE ...]`; SET parameters come before WHERE parameters.
    pub fn update<S, V>(&self, table: &str, selector: &S, values: &V) -> OrmResult<Clause>
    where
        S: Record,
        V: Record,
    {
        update::build(
            self.dialect,
            table,
            present_fields(values),
            present_fields(selector),
        )
    }

    /// `DELETE FROM <table> [WHERE ...]`.
    pub fn delete<S: Record>(&self, table: &str, selector: &S) -> OrmResult<Clause> {
        delete::build(self.dialect, table, present_fields(selector))
    }
}

/// [`ClauseBuilder::select`] with the default dialect.
pub fn select<R, S>(table: &str, selector: &S) -> OrmResult<Clause>
where
    R: Record + FromRow,
    S: Record,
{
    ClauseBuilder::default().select::<R, S>(table, selector)
}

/// [`ClauseBuilder::insert`] with the default dialect.
pub fn insert<V: Record>(table: &str, values: &V) -> OrmResult<Clause> {
    ClauseBuilder::default().insert(table, values)
}

/// [`ClauseBuilder::update`] with the default dialect.
pub fn update<S: Record, V: Record>(table: &str, selector: &S, values: &V) -> OrmResult<Clause> {
    ClauseBuilder::default().update(table, selector, values)
}

/// [`ClauseBuilder::delete`] with the default dialect.
pub fn delete<S: Record>(table: &str, selector: &S) -> OrmResult<Clause> {
    ClauseBuilder::default().delete(table, selector)
}
