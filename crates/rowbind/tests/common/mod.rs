//! In-memory driver that records every call, for tests that must not need a server.

#![allow(dead_code)]

use futures_util::stream;
use rowbind::{Connect, Dialect, OrmError, OrmResult, Row, Session, Value};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub primitive: &'static str,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct Log {
    pub opened: usize,
    pub closed: usize,
    /// Sessions dropped without `close`.
    pub dropped: usize,
    pub pings: usize,
    pub cancels: usize,
    pub calls: Vec<Call>,
}

impl Log {
    /// Every opened session was released one way or the other.
    pub fn balanced(&self) -> bool {
        self.opened == self.closed + self.dropped
    }
}

/// What the fake server answers.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub dialect: Dialect,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
    /// Yield a cursor error instead of the row at this index.
    pub fail_at_row: Option<usize>,
    pub affected: u64,
    pub fail_open: bool,
    pub fail_ping: bool,
    pub fail_close: bool,
    pub fail_statement: bool,
    /// Statements never complete.
    pub hang: bool,
    /// `close` never completes; the session is only released by dropping it.
    pub hang_close: bool,
}

#[derive(Clone)]
pub struct MockDb {
    log: Arc<Mutex<Log>>,
    script: Script,
}

impl MockDb {
    pub fn new(script: Script) -> Self {
        Self {
            log: Arc::new(Mutex::new(Log::default())),
            script,
        }
    }

    pub fn log(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }
}

impl Connect for MockDb {
    type Session = MockSession;

    fn dialect(&self) -> Dialect {
        self.script.dialect
    }

    async fn open(&self, _conn_string: &str) -> OrmResult<MockSession> {
        if self.script.fail_open {
            return Err(OrmError::connection(std::io::Error::other("connection refused")));
        }
        self.log().opened += 1;
        Ok(MockSession {
            log: self.log.clone(),
            script: self.script.clone(),
            closed: false,
        })
    }
}

pub struct MockSession {
    log: Arc<Mutex<Log>>,
    script: Script,
    closed: bool,
}

#[derive(Debug)]
pub struct MockRow {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Row for MockRow {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.columns.get(idx).copied()
    }

    fn value_at(&self, idx: usize) -> OrmResult<Value> {
        self.values
            .get(idx)
            .cloned()
            .ok_or_else(|| OrmError::scan(idx, "?", "no such column"))
    }
}

pub type MockRows = stream::Iter<std::vec::IntoIter<OrmResult<MockRow>>>;

impl MockSession {
    async fn run(&self, primitive: &'static str, sql: &str, params: &[Value]) -> OrmResult<()> {
        self.log.lock().unwrap().calls.push(Call {
            primitive,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if self.script.hang {
            std::future::pending::<()>().await;
        }
        if self.script.fail_statement {
            return Err(OrmError::execution(std::io::Error::other("syntax error")));
        }
        Ok(())
    }

    fn rows(&self) -> Vec<OrmResult<MockRow>> {
        self.script
            .rows
            .iter()
            .enumerate()
            .map(|(i, values)| {
                if self.script.fail_at_row == Some(i) {
                    return Err(OrmError::execution(std::io::Error::other("connection reset")));
                }
                Ok(MockRow {
                    columns: self.script.columns.clone(),
                    values: values.clone(),
                })
            })
            .collect()
    }
}

impl Session for MockSession {
    type Row = MockRow;
    type Rows = MockRows;

    fn dialect(&self) -> Dialect {
        self.script.dialect
    }

    async fn ping(&self) -> OrmResult<()> {
        self.log.lock().unwrap().pings += 1;
        if self.script.fail_ping {
            return Err(OrmError::execution(std::io::Error::other("server gone")));
        }
        Ok(())
    }

    async fn query_row(&self, sql: &str, params: &[Value]) -> OrmResult<Option<MockRow>> {
        self.run("query_row", sql, params).await?;
        self.rows().into_iter().next().transpose()
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<MockRows> {
        self.run("query", sql, params).await?;
        Ok(stream::iter(self.rows()))
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.run("exec", sql, params).await?;
        Ok(self.script.affected)
    }

    fn cancel(&self) {
        self.log.lock().unwrap().cancels += 1;
    }

    async fn close(mut self) -> OrmResult<()> {
        if self.script.hang_close {
            std::future::pending::<()>().await;
        }
        self.closed = true;
        self.log.lock().unwrap().closed += 1;
        if self.script.fail_close {
            return Err(OrmError::connection(std::io::Error::other("broken pipe")));
        }
        Ok(())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if !self.closed {
            self.log.lock().unwrap().dropped += 1;
        }
    }
}
