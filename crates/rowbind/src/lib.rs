//! # rowbind
//!
//! Plain typed records in, parameterized CRUD statements out, and rows back
//! into typed records. No per-entity SQL.
//!
//! ## Features
//!
//! - **Records as filters**: every set field of a selector record becomes an
//!   `AND`-ed equality condition; unset fields (empty text, zero numbers, the
//!   epoch, `None`) are left out
//! - **Positional mapping**: result columns are emitted in field order and
//!   scanned back by position via [`FromRow`]
//! - **Always parameterized**: values are bound, never spliced into SQL text
//! - **Scoped sessions**: [`Client`] opens, pings and closes a session per call
//! - **Write safety**: opt-in policies refuse UPDATE/DELETE without WHERE
//!
//! ## Quick start
//!
//! ```ignore
//! use rowbind::prelude::*;
//! use rowbind::postgres::PgConnector;
//!
//! #[derive(Debug, Record, FromRow)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! #[derive(Record, Default)]
//! struct UserFilter {
//!     name: String,
//!     age: i32,
//! }
//!
//! let client = Client::connect(PgConnector, ConnectionConfig::from_env()?, ClientConfig::new())
//!     .await?;
//!
//! // SELECT id, COALESCE(name, '') AS name, age FROM users WHERE age = $1
//! let users: Vec<User> = client
//!     .select_all("users", &UserFilter { age: 30, ..Default::default() })
//!     .await?;
//!
//! // UPDATE users SET name = $1 WHERE age = $2
//! client
//!     .update(
//!         "users",
//!         &UserFilter { age: 30, ..Default::default() },
//!         &UserFilter { name: "thirty".into(), ..Default::default() },
//!     )
//!     .await?;
//! ```
//!
//! ## Building statements only
//!
//! ```ignore
//! let clause = rowbind::clause::select::<User, _>("users", &UserFilter { age: 30, ..Default::default() })?;
//! assert_eq!(clause.sql(), "SELECT id, IFNULL(name, '') AS name, age FROM users WHERE age = ?");
//! ```

pub mod clause;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod field;
pub mod materialize;
pub mod postgres;
pub mod prelude;
pub mod row;
pub mod session;
pub mod value;

pub use clause::{Clause, ClauseBuilder, Dialect, StatementKind};
pub use client::Client;
pub use config::{
    ClientConfig, ConnectionConfig, ConnectionProvider, DangerousDmlPolicy, Settings, Transport,
};
pub use error::{OrmError, OrmResult};
pub use executor::{Executor, Planner, Primitive, Target};
pub use field::{Column, FieldValue, Record, is_unset, present_fields};
pub use materialize::{scan_into, scan_opt};
pub use row::{FromRow, Row, check_arity};
pub use session::{Connect, Session};
pub use value::{ConvertError, FieldKind, SqlType, Value};

#[cfg(feature = "derive")]
pub use rowbind_derive::{FromRow, Record};
