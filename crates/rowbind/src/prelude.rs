//! Convenient imports for typical `rowbind` usage.
//!
//! ```ignore
//! use rowbind::prelude::*;
//! ```

pub use crate::{
    Client, ClientConfig, ConnectionConfig, DangerousDmlPolicy, FromRow, OrmError, OrmResult,
    Record,
};
