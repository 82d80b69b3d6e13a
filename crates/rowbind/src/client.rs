//! High-level client: one scoped session per call.

use crate::clause::Clause;
use crate::config::{ClientConfig, ConnectionProvider};
use crate::error::{OrmError, OrmResult};
use crate::executor::{Executor, Planner, not_found};
use crate::field::Record;
use crate::row::FromRow;
use crate::session::{Connect, Session};
use std::future::Future;

/// CRUD over typed records, opening a fresh session for every call.
///
/// Each operation first builds its statement, so invalid input and policy
/// violations fail without touching the server. It then opens a session,
/// optionally pings it, runs exactly one statement and closes the session
/// again, on success and on error. If the caller drops the returned future
/// midway, the session is dropped with it, which releases it as well. No state
/// is kept between calls, so a `Client` can be shared freely across tasks.
///
/// # Example
///
/// ```ignore
/// use rowbind::{Client, ClientConfig, ConnectionConfig, FromRow, Record};
/// use rowbind::postgres::PgConnector;
///
/// #[derive(Record, FromRow)]
/// struct User { id: i64, name: String, age: i32 }
///
/// #[derive(Record)]
/// struct ByAge { age: i32 }
///
/// let client = Client::connect(
///     PgConnector,
///     ConnectionConfig::from_env()?,
///     ClientConfig::new().strict(),
/// )
/// .await?;
///
/// let thirty: Vec<User> = client.select_all("users", &ByAge { age: 30 }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client<C, P> {
    connector: C,
    provider: P,
    config: ClientConfig,
}

impl<C, P> Client<C, P>
where
    C: Connect,
    P: ConnectionProvider,
{
    /// Create a client without touching the server.
    pub fn new(connector: C, provider: P) -> Self {
        Self {
            connector,
            provider,
            config: ClientConfig::default(),
        }
    }

    /// Create a client after checking once that a session can be opened and pinged.
    pub async fn connect(connector: C, provider: P, config: ClientConfig) -> OrmResult<Self> {
        let client = Self::new(connector, provider).with_config(config);
        let session = client.open().await?;
        let probed = client.ping(&session).await;
        client.release(session, probed).await?;
        tracing::debug!(target: "rowbind::client", "connection probe succeeded");
        Ok(client)
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ==================== Operations ====================

    /// SELECT one record; [`OrmError::NotFound`] when no row matches.
    pub async fn select_one<R, F>(&self, table: &str, selector: &F) -> OrmResult<R>
    where
        R: Record + FromRow,
        F: Record,
    {
        self.select_opt(table, selector)
            .await?
            .ok_or_else(|| not_found::<F>(table))
    }

    /// SELECT one record; `Ok(None)` when no row matches.
    pub async fn select_opt<R, F>(&self, table: &str, selector: &F) -> OrmResult<Option<R>>
    where
        R: Record + FromRow,
        F: Record,
    {
        let clause = self.planner().select::<R, F>(table, selector)?;
        let session = self.acquire().await?;
        let result = self.executor(&session).fetch_opt(&clause).await;
        self.release(session, result).await
    }

    /// SELECT into `out`, appending in cursor order. Returns the number appended.
    ///
    /// On error, records appended before the failure stay in `out`.
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
        let clause = self.planner().select::<R, F>(table, selector)?;
        let session = self.acquire().await?;
        let result = self.executor(&session).fetch_into(&clause, out).await;
        self.release(session, result).await
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

    /// INSERT the set fields of `values`.
    pub async fn insert<V: Record>(&self, table: &str, values: &V) -> OrmResult<u64> {
        let clause = self.planner().insert(table, values)?;
        self.exec(&clause).await
    }

    /// UPDATE rows matching `selector` with the set fields of `values`.
    ///
    /// An all-unset selector updates every row unless
    /// [`ClientConfig::update_without_where`] says otherwise.
    pub async fn update<F, V>(&self, table: &str, selector: &F, values: &V) -> OrmResult<u64>
    where
        F: Record,
        V: Record,
    {
        let clause = self.planner().update(table, selector, values)?;
        self.exec(&clause).await
    }

    /// DELETE rows matching `selector`.
    ///
    /// An all-unset selector deletes every row unless
    /// [`ClientConfig::delete_without_where`] says otherwise.
    pub async fn delete<F: Record>(&self, table: &str, selector: &F) -> OrmResult<u64> {
        let clause = self.planner().delete(table, selector)?;
        self.exec(&clause).await
    }

    async fn exec(&self, clause: &Clause) -> OrmResult<u64> {
        let session = self.acquire().await?;
        let result = self.executor(&session).exec(clause).await;
        self.release(session, result).await
    }

    /// Clause planning in this client's dialect and write policies.
    pub fn planner(&self) -> Planner {
        Planner::new(self.connector.dialect(), &self.config)
    }

    // ==================== Sessions ====================

    /// Open a session (and ping it, unless disabled) for several statements.
    ///
    /// The caller owns the session; close it with [`Session::close`].
    pub async fn acquire(&self) -> OrmResult<C::Session> {
        let session = self.open().await?;
        if !self.config.ping_on_acquire {
            return Ok(session);
        }
        match self.ping(&session).await {
            Ok(()) => Ok(session),
            Err(err) => self.release(session, Err(err)).await,
        }
    }

    /// An executor over `session` carrying this client's configuration.
    pub fn executor<'s>(&self, session: &'s C::Session) -> Executor<'s, C::Session> {
        Executor::new(session).with_config(&self.config)
    }

    async fn open(&self) -> OrmResult<C::Session> {
        let conn = self.provider.connection_string();
        self.bounded(self.connector.open(&conn)).await
    }

    async fn ping(&self, session: &C::Session) -> OrmResult<()> {
        self.bounded(session.ping()).await
    }

    /// Apply the statement timeout to session setup and teardown, mapping
    /// failures to [`OrmError::Connection`].
    async fn bounded<T, F>(&self, future: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>>,
    {
        let result = match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| OrmError::Timeout(timeout))?,
            None => future.await,
        };
        result.map_err(as_connection_error)
    }

    /// Close `session` and hand back `result`.
    ///
    /// A close failure is logged and never replaces the statement's outcome:
    /// a write that succeeded has happened regardless. Closing is bounded by
    /// the statement timeout; on expiry the session is dropped instead.
    async fn release<T>(&self, session: C::Session, result: OrmResult<T>) -> OrmResult<T> {
        if let Err(err) = self.bounded(session.close()).await {
            tracing::warn!(target: "rowbind::client", error = %err, "failed to close session");
        }
        result
    }
}

fn as_connection_error(err: OrmError) -> OrmError {
    match err {
        OrmError::Connection(_) | OrmError::Timeout(_) => err,
        other => OrmError::connection(other),
    }
}
