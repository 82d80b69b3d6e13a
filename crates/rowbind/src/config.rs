//! Connection parameters and client behaviour.
//!
//! Both can be built in code or loaded from TOML:
//!
//! ```toml
//! [connection]
//! host = "localhost"
//! port = 5432
//! user = "app"
//! password = "secret"
//! database = "app"
//!
//! [client]
//! query_timeout_ms = 5000
//! delete_without_where = "error"
//! ```

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Supplies the opaque connection string handed to [`crate::Connect::open`].
pub trait ConnectionProvider: Send + Sync {
    fn connection_string(&self) -> String;
}

impl ConnectionProvider for str {
    fn connection_string(&self) -> String {
        self.to_string()
    }
}

impl ConnectionProvider for String {
    fn connection_string(&self) -> String {
        self.clone()
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    fn connection_string(&self) -> String {
        (**self).connection_string()
    }
}

/// How the client reaches the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    #[default]
    Tcp,
    /// `host` is the directory holding the server's socket.
    Unix,
}

/// Connection parameters, rendered as a libpq-style `key=value` string.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub transport: Transport,
    /// Extra driver options, appended verbatim as `key=value` pairs.
    pub options: BTreeMap<String, String>,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Read `ROWBIND_HOST`, `ROWBIND_PORT`, `ROWBIND_USER`, `ROWBIND_PASSWORD`,
    /// `ROWBIND_DATABASE` and `ROWBIND_TRANSPORT` (`tcp` or `unix`).
    pub fn from_env() -> OrmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let require = |key: &str| {
            lookup(key).ok_or_else(|| OrmError::config(format!("{key} is not set")))
        };

        let mut config = Self::new(
            require("ROWBIND_HOST")?,
            require("ROWBIND_USER")?,
            require("ROWBIND_DATABASE")?,
        );
        config.password = lookup("ROWBIND_PASSWORD");
        if let Some(port) = lookup("ROWBIND_PORT") {
            config.port = Some(
                port.parse()
                    .map_err(|e| OrmError::config(format!("ROWBIND_PORT '{port}': {e}")))?,
            );
        }
        if let Some(transport) = lookup("ROWBIND_TRANSPORT") {
            config.transport = match transport.to_ascii_lowercase().as_str() {
                "tcp" => Transport::Tcp,
                "unix" => Transport::Unix,
                other => {
                    return Err(OrmError::config(format!(
                        "ROWBIND_TRANSPORT must be 'tcp' or 'unix', got '{other}'"
                    )));
                }
            };
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OrmResult<()> {
        if self.host.trim().is_empty() {
            return Err(OrmError::config("connection host must not be empty"));
        }
        if self.transport == Transport::Unix && !self.host.starts_with('/') {
            return Err(OrmError::config(format!(
                "unix transport expects an absolute socket directory, got '{}'",
                self.host
            )));
        }
        Ok(())
    }
}

impl ConnectionProvider for ConnectionConfig {
    fn connection_string(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = vec![("host", self.host.as_str())];
        let port = self.port.map(|p| p.to_string());
        if let Some(port) = &port {
            pairs.push(("port", port.as_str()));
        }
        if !self.user.is_empty() {
            pairs.push(("user", self.user.as_str()));
        }
        if let Some(password) = &self.password {
            pairs.push(("password", password.as_str()));
        }
        if !self.database.is_empty() {
            pairs.push(("dbname", self.database.as_str()));
        }
        for (k, v) in &self.options {
            pairs.push((k.as_str(), v.as_str()));
        }

        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={}", quote_value(v)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("transport", &self.transport)
            .field("options", &self.options)
            .finish()
    }
}

fn quote_value(v: &str) -> String {
    let needs_quotes =
        v.is_empty() || v.chars().any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return v.to_string();
    }
    let escaped = v.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// What to do with a statement that would touch every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerousDmlPolicy {
    #[default]
    Allow,
    Warn,
    Error,
}

pub(crate) fn handle_dangerous_dml(
    policy: DangerousDmlPolicy,
    rule: &str,
    sql: &str,
) -> OrmResult<()> {
    match policy {
        DangerousDmlPolicy::Allow => Ok(()),
        DangerousDmlPolicy::Warn => {
            tracing::warn!(target: "rowbind::policy", rule, sql, "statement affects every row");
            Ok(())
        }
        DangerousDmlPolicy::Error => Err(OrmError::invalid_argument(format!(
            "SQL policy violation: {rule}: {sql}"
        ))),
    }
}

/// Configuration for [`crate::Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Per-statement timeout, also bounding session open and ping.
    /// `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
    /// Ping each freshly opened session before using it.
    pub ping_on_acquire: bool,
    /// UPDATE whose selector has no set fields.
    pub update_without_where: DangerousDmlPolicy,
    /// DELETE whose selector has no set fields.
    pub delete_without_where: DangerousDmlPolicy,
    /// INSERT whose values record has no set fields.
    pub insert_without_values: DangerousDmlPolicy,
    /// Truncate logged SQL to this many bytes. `None` logs it whole.
    pub max_logged_sql: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            ping_on_acquire: true,
            update_without_where: DangerousDmlPolicy::Allow,
            delete_without_where: DangerousDmlPolicy::Allow,
            insert_without_values: DangerousDmlPolicy::Allow,
            max_logged_sql: Some(200),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set statement timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }

    /// Skip the ping after opening a session.
    pub fn no_ping(mut self) -> Self {
        self.ping_on_acquire = false;
        self
    }

    /// Configure how UPDATE without WHERE is handled.
    pub fn update_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.update_without_where = policy;
        self
    }

    /// Configure how DELETE without WHERE is handled.
    pub fn delete_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.delete_without_where = policy;
        self
    }

    /// Configure how INSERT without any column is handled.
    pub fn insert_without_values(mut self, policy: DangerousDmlPolicy) -> Self {
        self.insert_without_values = policy;
        self
    }

    /// Refuse UPDATE/DELETE without WHERE and empty INSERTs.
    pub fn strict(self) -> Self {
        self.update_without_where(DangerousDmlPolicy::Error)
            .delete_without_where(DangerousDmlPolicy::Error)
            .insert_without_values(DangerousDmlPolicy::Error)
    }

    /// Set maximum SQL length to log.
    pub fn max_logged_sql(mut self, len: usize) -> Self {
        self.max_logged_sql = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql = None;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClientConfigFile {
    query_timeout_ms: Option<u64>,
    ping_on_acquire: Option<bool>,
    update_without_where: Option<DangerousDmlPolicy>,
    delete_without_where: Option<DangerousDmlPolicy>,
    insert_without_values: Option<DangerousDmlPolicy>,
    max_logged_sql: Option<usize>,
}

impl From<ClientConfigFile> for ClientConfig {
    fn from(file: ClientConfigFile) -> Self {
        let defaults = ClientConfig::default();
        Self {
            query_timeout: file.query_timeout_ms.map(Duration::from_millis),
            ping_on_acquire: file.ping_on_acquire.unwrap_or(defaults.ping_on_acquire),
            update_without_where: file
                .update_without_where
                .unwrap_or(defaults.update_without_where),
            delete_without_where: file
                .delete_without_where
                .unwrap_or(defaults.delete_without_where),
            insert_without_values: file
                .insert_without_values
                .unwrap_or(defaults.insert_without_values),
            max_logged_sql: file.max_logged_sql.or(defaults.max_logged_sql),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    connection: ConnectionConfig,
    #[serde(default)]
    client: ClientConfigFile,
}

/// A connection plus client configuration, as loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub connection: ConnectionConfig,
    pub client: ClientConfig,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        let file: SettingsFile = toml::from_str(raw)?;
        file.connection.validate()?;
        Ok(Self {
            connection: file.connection,
            client: file.client.into(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
            .map_err(|e| OrmError::config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn renders_key_value_connection_string() {
        let config = ConnectionConfig::new("db.internal", "app", "shop")
            .port(5433)
            .password("s3cret")
            .option("sslmode", "disable");
        assert_eq!(
            config.connection_string(),
            "host=db.internal port=5433 user=app password=s3cret dbname=shop sslmode=disable"
        );
    }

    #[test]
    fn quotes_values_with_spaces_and_quotes() {
        let config = ConnectionConfig::new("localhost", "app", "shop").password("it's a pw");
        assert_eq!(
            config.connection_string(),
            r"host=localhost user=app password='it\'s a pw' dbname=shop"
        );
    }

    #[test]
    fn debug_redacts_password() {
        let config = ConnectionConfig::new("localhost", "app", "shop").password("hunter2");
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn loads_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("ROWBIND_HOST", "/var/run/postgresql"),
            ("ROWBIND_USER", "app"),
            ("ROWBIND_DATABASE", "shop"),
            ("ROWBIND_PORT", "5432"),
            ("ROWBIND_TRANSPORT", "unix"),
        ]
        .into_iter()
        .collect();
        let config =
            ConnectionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.transport, Transport::Unix);
        assert_eq!(config.port, Some(5432));
        assert_eq!(config.password, None);
    }

    #[test]
    fn missing_env_is_a_config_error() {
        let err = ConnectionConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, OrmError::Config(ref m) if m.contains("ROWBIND_HOST")));
    }

    #[test]
    fn unix_transport_needs_socket_directory() {
        let config = ConnectionConfig::new("localhost", "app", "shop").transport(Transport::Unix);
        assert!(config.validate().is_err());
    }

    #[test]
    fn settings_from_toml() {
        let settings = Settings::from_toml_str(
            r#"
            [connection]
            host = "localhost"
            user = "app"
            database = "shop"

            [connection.options]
            application_name = "rowbind"

            [client]
            query_timeout_ms = 1500
            delete_without_where = "error"
            "#,
        )
        .unwrap();
        assert_eq!(settings.connection.options["application_name"], "rowbind");
        assert_eq!(settings.client.query_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(settings.client.delete_without_where, DangerousDmlPolicy::Error);
        assert_eq!(settings.client.update_without_where, DangerousDmlPolicy::Allow);
        assert!(settings.client.ping_on_acquire);
    }

    #[test]
    fn unknown_client_keys_are_rejected() {
        let err = Settings::from_toml_str(
            r#"
            [connection]
            host = "localhost"

            [client]
            query_timeout = 3
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn strict_rejects_everything_dangerous() {
        let config = ClientConfig::new().strict();
        let err = handle_dangerous_dml(
            config.delete_without_where,
            "DELETE without WHERE",
            "DELETE FROM t",
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(handle_dangerous_dml(DangerousDmlPolicy::Warn, "x", "y").is_ok());
    }
}
