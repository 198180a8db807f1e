//! Connection pool settings derived from a connection URL.
//!
//! Passwords are never copied out of the URL; only the pool holds them.

use crate::Result;
use crate::error::SchemaDocError;
use std::time::Duration;

/// Pool and session settings shared by the sqlx-backed sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Database host address
    pub host: String,
    /// Port number (engine default when absent from the URL)
    pub port: u16,
    /// Database named in the URL path
    pub database: Option<String>,
    /// User named in the URL
    pub username: Option<String>,
    /// Time allowed to acquire a connection
    pub connect_timeout: Duration,
    /// Per-statement timeout applied to every session
    pub query_timeout: Duration,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl std::fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)?;
        if let Some(database) = &self.database {
            write!(f, "/{}", database)?;
        }
        Ok(())
    }
}

impl ConnectionSettings {
    /// Parses settings from a connection URL.
    ///
    /// Recognised query parameters: `connect_timeout` (seconds, 1-300),
    /// `statement_timeout` (milliseconds) and `pool_max_conns` (1-100).
    /// Out-of-range values are ignored.
    ///
    /// # Errors
    /// Returns a configuration error if the URL is malformed, uses another
    /// scheme or has no host.
    pub fn from_url(connection_string: &str, schemes: &[&str], default_port: u16) -> Result<Self> {
        let url = super::parse_connection_url(connection_string, schemes[0])?;

        if !schemes.contains(&url.scheme()) {
            return Err(SchemaDocError::configuration(format!(
                "Connection string must use {}:// scheme",
                schemes[0]
            )));
        }

        let mut settings = Self {
            host: url.host_str().unwrap_or("localhost").to_string(),
            port: url.port().unwrap_or(default_port),
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(30),
            max_connections: 2,
        };

        let database = url.path().trim_start_matches('/');
        if !database.is_empty() {
            settings.database = Some(database.to_string());
        }

        if !url.username().is_empty() {
            settings.username = Some(url.username().to_string());
        }

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "connect_timeout" => {
                    if let Ok(secs) = value.parse::<u64>()
                        && (1..=300).contains(&secs)
                    {
                        settings.connect_timeout = Duration::from_secs(secs);
                    }
                }
                "statement_timeout" => {
                    if let Ok(millis) = value.parse::<u64>()
                        && millis > 0
                    {
                        settings.query_timeout = Duration::from_millis(millis);
                    }
                }
                "pool_max_conns" => {
                    if let Ok(max) = value.parse::<u32>()
                        && (1..=100).contains(&max)
                    {
                        settings.max_connections = max;
                    }
                }
                _ => {}
            }
        }

        Ok(settings)
    }
}
