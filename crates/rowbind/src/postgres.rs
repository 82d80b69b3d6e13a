//! PostgreSQL driver built on `tokio-postgres`.
//!
//! Sessions speak the [`Dialect::Postgres`] placeholder syntax (`$1, $2, ...`).
//! Each [`PgSession`] owns one server connection whose I/O runs on a spawned
//! task; closing or dropping the session shuts that task down.

use crate::clause::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::session::{Connect, Session};
use crate::value::{Value, narrow_f32};
use bytes::BytesMut;
use futures_core::Stream;
use futures_util::StreamExt;
use std::error::Error;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};
use tokio_postgres::{NoTls, RowStream};

/// Opens plain-TCP (or unix socket) sessions from a libpq-style connection string.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

impl Connect for PgConnector {
    type Session = PgSession;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn open(&self, conn_string: &str) -> OrmResult<PgSession> {
        let (client, connection) = tokio_postgres::connect(conn_string, NoTls)
            .await
            .map_err(OrmError::connection)?;
        let connection = tokio::spawn(connection);
        tracing::trace!(target: "rowbind::postgres", "session opened");
        Ok(PgSession {
            client,
            connection: Some(connection),
        })
    }
}

/// One open PostgreSQL connection.
pub struct PgSession {
    client: tokio_postgres::Client,
    connection: Option<JoinHandle<Result<(), tokio_postgres::Error>>>,
}

impl PgSession {
    /// The underlying `tokio-postgres` client, for statements rowbind does not build.
    pub fn client(&self) -> &tokio_postgres::Client {
        &self.client
    }
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
    }
}

fn bind(params: &[Value]) -> impl ExactSizeIterator<Item = &(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync))
}

impl Session for PgSession {
    type Row = tokio_postgres::Row;
    type Rows = PgRows;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn ping(&self) -> OrmResult<()> {
        self.client
            .batch_execute("SELECT 1")
            .await
            .map_err(OrmError::connection)
    }

    async fn query_row(
        &self,
        sql: &str,
        params: &[Value],
    ) -> OrmResult<Option<tokio_postgres::Row>> {
        let mut rows = self.query(sql, params).await?;
        rows.next().await.transpose()
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<PgRows> {
        let stream = self
            .client
            .query_raw(sql, bind(params))
            .await
            .map_err(OrmError::execution)?;
        Ok(PgRows::new(stream))
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.client
            .execute_raw(sql, bind(params))
            .await
            .map_err(OrmError::execution)
    }

    fn cancel(&self) {
        let token = self.client.cancel_token();
        tokio::spawn(async move {
            if let Err(err) = token.cancel_query(NoTls).await {
                tracing::debug!(target: "rowbind::postgres", error = %err, "cancel request failed");
            }
        });
    }

    async fn close(mut self) -> OrmResult<()> {
        let connection = self.connection.take();
        // Dropping the last client handle makes the connection task terminate.
        drop(self);
        match connection {
            Some(connection) => {
                let mut task = AbortOnDrop(connection);
                (&mut task.0)
                    .await
                    .map_err(OrmError::connection)?
                    .map_err(OrmError::connection)
            }
            None => Ok(()),
        }
    }
}

/// Aborts the connection task if an in-progress `close` is dropped, e.g. when
/// it exceeds its timeout against an unresponsive server.
struct AbortOnDrop(JoinHandle<Result<(), tokio_postgres::Error>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Cursor over the rows of a PostgreSQL query.
pub struct PgRows {
    inner: Pin<Box<RowStream>>,
}

impl PgRows {
    fn new(stream: RowStream) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for PgRows {
    type Item = OrmResult<tokio_postgres::Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(OrmError::execution(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ==================== Row decoding ====================

fn decode<T, F>(
    row: &tokio_postgres::Row,
    idx: usize,
    wrap: F,
) -> Result<Value, tokio_postgres::Error>
where
    T: for<'a> FromSql<'a>,
    F: FnOnce(T) -> Value,
{
    Ok(row.try_get::<_, Option<T>>(idx)?.map_or(Value::Null, wrap))
}

impl Row for tokio_postgres::Row {
    fn len(&self) -> usize {
        self.columns().len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.columns().get(idx).map(|c| c.name())
    }

    fn value_at(&self, idx: usize) -> OrmResult<Value> {
        let column = self.columns().get(idx).ok_or_else(|| {
            OrmError::scan(idx, "?", format!("row has only {} columns", self.columns().len()))
        })?;
        let ty = column.type_();

        let decoded = match *ty {
            Type::BOOL => decode(self, idx, Value::Bool),
            Type::INT2 => decode(self, idx, |v: i16| Value::Int(v.into())),
            Type::INT4 => decode(self, idx, |v: i32| Value::Int(v.into())),
            Type::INT8 => decode(self, idx, Value::Int),
            Type::FLOAT4 => decode(self, idx, |v: f32| Value::Float(v.into())),
            Type::FLOAT8 => decode(self, idx, Value::Float),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                decode(self, idx, Value::Text)
            }
            Type::TIMESTAMP => decode(self, idx, Value::Timestamp),
            Type::TIMESTAMPTZ => decode(self, idx, Value::TimestampTz),
            Type::DATE => decode(self, idx, Value::Date),
            Type::UUID => decode(self, idx, Value::Uuid),
            Type::JSON | Type::JSONB => decode(self, idx, Value::Json),
            _ => {
                return Err(OrmError::unsupported_type(format!(
                    "column {idx} ('{}') has PostgreSQL type {ty}",
                    column.name()
                )));
            }
        };
        decoded.map_err(|e| OrmError::scan(idx, column.name(), e.to_string()))
    }
}

// ==================== Parameter encoding ====================

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            // Integers are carried as i64; narrow to the width the server asked for.
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => narrow_f32(*v)?.to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}
