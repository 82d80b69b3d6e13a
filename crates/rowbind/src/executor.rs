//! Statement executor: runs a built [`Clause`] through one of the three driver
//! primitives on an already open [`Session`].
//!
//! The parameters handed to the driver are exactly [`Clause::params`], in
//! order, so placeholder/parameter alignment is decided once by the builder.

use crate::clause::{Clause, ClauseBuilder, Dialect, StatementKind};
use crate::config::{ClientConfig, DangerousDmlPolicy, handle_dangerous_dml};
use crate::error::{OrmError, OrmResult};
use crate::field::Record;
use crate::materialize::{scan_into, scan_opt};
use crate::row::FromRow;
use crate::session::Session;
use std::future::Future;
use std::time::Duration;

/// The driver primitive a statement is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Single-row query.
    QueryRow,
    /// Multi-row query returning a cursor.
    Query,
    /// Statement returning an affected-row count.
    Exec,
}

/// Result target of a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    One,
    Many,
}

impl Primitive {
    pub fn for_statement(kind: StatementKind, target: Target) -> Self {
        match (kind, target) {
            (StatementKind::Select, Target::One) => Primitive::QueryRow,
            (StatementKind::Select, Target::Many) => Primitive::Query,
            _ => Primitive::Exec,
        }
    }
}

/// Builds clauses in one dialect and applies the write-safety policies.
///
/// Everything a planner rejects is rejected before a session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Planner {
    builder: ClauseBuilder,
    update_without_where: DangerousDmlPolicy,
    delete_without_where: DangerousDmlPolicy,
    insert_without_values: DangerousDmlPolicy,
}

impl Planner {
    pub fn new(dialect: Dialect, config: &ClientConfig) -> Self {
        Self {
            builder: ClauseBuilder::new(dialect),
            update_without_where: config.update_without_where,
            delete_without_where: config.delete_without_where,
            insert_without_values: config.insert_without_values,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.builder.dialect()
    }

    pub fn select<R, F>(&self, table: &str, selector: &F) -> OrmResult<Clause>
    where
        R: Record + FromRow,
        F: Record,
    {
        self.builder.select::<R, F>(table, selector)
    }

    pub fn insert<V: Record>(&self, table: &str, values: &V) -> OrmResult<Clause> {
        let clause = self.builder.insert(table, values)?;
        if clause.params().is_empty() {
            handle_dangerous_dml(
                self.insert_without_values,
                "INSERT without values",
                clause.sql(),
            )?;
        }
        Ok(clause)
    }

    pub fn update<F, V>(&self, table: &str, selector: &F, values: &V) -> OrmResult<Clause>
    where
        F: Record,
        V: Record,
    {
        let clause = self.builder.update(table, selector, values)?;
        if !clause.has_where() {
            handle_dangerous_dml(
                self.update_without_where,
                "UPDATE without WHERE",
                clause.sql(),
            )?;
        }
        Ok(clause)
    }

    pub fn delete<F: Record>(&self, table: &str, selector: &F) -> OrmResult<Clause> {
        let clause = self.builder.delete(table, selector)?;
        if !clause.has_where() {
            handle_dangerous_dml(
                self.delete_without_where,
                "DELETE without WHERE",
                clause.sql(),
            )?;
        }
        Ok(clause)
    }
}

/// Runs clauses on a borrowed session.
///
/// Besides the three raw primitives, the executor offers record-level CRUD
/// that plans the clause in the session's dialect and materializes results.
///
/// ```ignore
/// let exec = Executor::new(&session).with_config(&ClientConfig::new().strict());
/// exec.insert("users", &new_user).await?;
/// let users: Vec<User> = exec.select_all("users", &UserFilter::by_age(30)).await?;
/// ```
#[derive(Debug)]
pub struct Executor<'s, S: Session> {
    session: &'s S,
    planner: Planner,
    timeout: Option<Duration>,
    max_logged_sql: Option<usize>,
}

impl<'s, S: Session> Executor<'s, S> {
    pub fn new(session: &'s S) -> Self {
        Self::with_defaults(session, &ClientConfig::default())
    }

    fn with_defaults(session: &'s S, config: &ClientConfig) -> Self {
        Self {
            session,
            planner: Planner::new(session.dialect(), config),
            timeout: config.query_timeout,
            max_logged_sql: config.max_logged_sql,
        }
    }

    /// Take timeout, logging and write-safety settings from `config`.
    pub fn with_config(self, config: &ClientConfig) -> Self {
        Self::with_defaults(self.session, config)
    }

    /// Fail statements that take longer than `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Truncate SQL in log events to `len` bytes; `None` logs it whole.
    pub fn max_logged_sql(mut self, len: Option<usize>) -> Self {
        self.max_logged_sql = len;
        self
    }

    pub fn session(&self) -> &'s S {
        self.session
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Single-row query: `Ok(None)` when no row came back.
    pub async fn query_row(&self, clause: &Clause) -> OrmResult<Option<S::Row>> {
        self.check_primitive(clause, Primitive::QueryRow)?;
        self.trace(clause, Primitive::QueryRow);
        self.with_timeout(self.session.query_row(clause.sql(), clause.params()))
            .await
    }

    /// Multi-row query returning the driver's cursor.
    pub async fn query(&self, clause: &Clause) -> OrmResult<S::Rows> {
        self.check_primitive(clause, Primitive::Query)?;
        self.trace(clause, Primitive::Query);
        self.with_timeout(self.session.query(clause.sql(), clause.params()))
            .await
    }

    /// Statement returning the affected row count.
    pub async fn exec(&self, clause: &Clause) -> OrmResult<u64> {
        self.check_primitive(clause, Primitive::Exec)?;
        self.trace(clause, Primitive::Exec);
        self.with_timeout(self.session.exec(clause.sql(), clause.params()))
            .await
    }

    /// Run a SELECT clause and scan its first row, if any.
    pub async fn fetch_opt<R: FromRow>(&self, clause: &Clause) -> OrmResult<Option<R>> {
        let row = self.query_row(clause).await?;
        scan_opt(row)
    }

    /// Run a SELECT clause and append every row to `out`.
    ///
    /// On a mid-cursor failure the records scanned so far stay in `out`.
    pub async fn fetch_into<R: FromRow>(
        &self,
        clause: &Clause,
        out: &mut Vec<R>,
    ) -> OrmResult<usize> {
        let rows = self.query(clause).await?;
        scan_into(rows, out).await
    }

    // ==================== Record-level CRUD ====================

    /// SELECT a single record; `Ok(None)` when no row matches.
    pub async fn select_opt<R, F>(&self, table: &str, selector: &F) -> OrmResult<Option<R>>
    where
        R: Record + FromRow,
        F: Record,
    {
        let clause = self.planner.select::<R, F>(table, selector)?;
        self.fetch_opt(&clause).await
    }

    /// SELECT a single record; [`OrmError::NotFound`] when no row matches.
    pub async fn select_one<R, F>(&self, table: &str, selector: &F) -> OrmResult<R>
    where
        R: Record + FromRow,
        F: Record,
    {
        self.select_opt(table, selector)
            .await?
            .ok_or_else(|| not_found::<F>(table))
    }

    /// SELECT into `out`, appending in cursor order.
    ///
    /// On a mid-cursor failure the records scanned so far stay in `out`.
    pub async fn select_into<R, F>(
        &self,
        table: &str,
        selector: &F,
        out: &mut Vec<R>,
    ) -> OrmResult<usize>
    where
        R: Record + FromRow,
        F: Record,
    {
        let clause = self.planner.select::<R, F>(table, selector)?;
        self.fetch_into(&clause, out).await
    }

    /// SELECT all matching records.
    pub async fn select_all<R, F>(&self, table: &str, selector: &F) -> OrmResult<Vec<R>>
    where
        R: Record + FromRow,
        F: Record,
    {
        let mut out = Vec::new();
        self.select_into(table, selector, &mut out).await?;
        Ok(out)
    }

    /// INSERT the set fields of `values`; returns the affected row count.
    pub async fn insert<V: Record>(&self, table: &str, values: &V) -> OrmResult<u64> {
        let clause = self.planner.insert(table, values)?;
        self.exec(&clause).await
    }

    /// UPDATE rows matching `selector` with the set fields of `values`.
    pub async fn update<F, V>(&self, table: &str, selector: &F, values: &V) -> OrmResult<u64>
    where
        F: Record,
        V: Record,
    {
        let clause = self.planner.update(table, selector, values)?;
        self.exec(&clause).await
    }

    /// DELETE rows matching `selector`.
    pub async fn delete<F: Record>(&self, table: &str, selector: &F) -> OrmResult<u64> {
        let clause = self.planner.delete(table, selector)?;
        self.exec(&clause).await
    }

    fn check_primitive(&self, clause: &Clause, primitive: Primitive) -> OrmResult<()> {
        let target = match primitive {
            Primitive::Query => Target::Many,
            _ => Target::One,
        };
        if Primitive::for_statement(clause.kind(), target) != primitive {
            return Err(OrmError::invalid_argument(format!(
                "{} statement cannot run as {primitive:?}",
                clause.kind()
            )));
        }
        Ok(())
    }

    async fn with_timeout<T, F>(&self, future: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>>,
    {
        match self.timeout {
            Some(timeout) => {
                tokio::pin!(future);
                tokio::select! {
                    result = &mut future => result,
                    _ = tokio::time::sleep(timeout) => {
                        self.session.cancel();
                        Err(OrmError::Timeout(timeout))
                    }
                }
            }
            None => future.await,
        }
    }

    fn trace(&self, clause: &Clause, primitive: Primitive) {
        let sql = truncate_sql(clause.sql(), self.max_logged_sql);
        tracing::debug!(
            target: "rowbind::sql",
            kind = %clause.kind(),
            primitive = ?primitive,
            param_count = clause.params().len(),
            filtered = clause.has_where(),
            sql = %sql,
            "executing statement"
        );
    }
}

pub(crate) fn not_found<F>(table: &str) -> OrmError {
    OrmError::not_found(format!(
        "no row in {table} matches the {} selector",
        std::any::type_name::<F>()
    ))
}

fn truncate_sql(sql: &str, max: Option<usize>) -> std::borrow::Cow<'_, str> {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end]).into()
        }
        _ => sql.into(),
    }
}
