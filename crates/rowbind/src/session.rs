//! Driver seam: how rowbind talks to a database server.
//!
//! A [`Connect`] implementation opens [`Session`]s from an opaque connection
//! string. rowbind never inspects that string and never shares a session
//! between calls of [`crate::Client`]; concurrent use is safe as long as the
//! driver tolerates independent sessions.

use crate::clause::Dialect;
use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use futures_core::Stream;
use std::future::Future;

/// Opens sessions against a database server.
pub trait Connect: Send + Sync {
    type Session: Session;

    /// Placeholder syntax of the sessions this connector opens.
    fn dialect(&self) -> Dialect;

    /// Open a new session. Failures are [`crate::OrmError::Connection`].
    fn open(&self, conn_string: &str) -> impl Future<Output = OrmResult<Self::Session>> + Send;
}

/// One open connection to the server.
///
/// Dropping a session must release it, so a session abandoned mid-call (for
/// example when the caller's future is dropped) does not leak. [`Session::close`]
/// is the orderly path and reports errors.
pub trait Session: Send + Sync {
    /// A single returned row.
    type Row: Row + Send;

    /// Cursor over returned rows, in server order.
    type Rows: Stream<Item = OrmResult<Self::Row>> + Send + Unpin;

    /// Placeholder syntax this server expects.
    fn dialect(&self) -> Dialect;

    /// Verify the session is usable. Failures are [`crate::OrmError::Connection`].
    fn ping(&self) -> impl Future<Output = OrmResult<()>> + Send;

    /// Run a query and return its first row, if any.
    fn query_row(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Option<Self::Row>>> + Send;

    /// Run a query and return a cursor over all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Self::Rows>> + Send;

    /// Run a statement and return the number of affected rows.
    fn exec(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Best-effort cancellation of the statement currently running on this session.
    ///
    /// Called when a statement exceeds its timeout. The default does nothing.
    fn cancel(&self) {}

    /// Close the session.
    fn close(self) -> impl Future<Output = OrmResult<()>> + Send;
}
