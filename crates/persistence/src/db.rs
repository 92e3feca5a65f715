//! Database connection management.

use std::fmt;

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use validator::Validate;

/// Database configuration.
///
/// The four connection settings are required and have no defaults.
#[derive(Clone, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1, message = "Database name must be set"))]
    pub database: String,

    #[validate(length(min = 1, message = "Database user must be set"))]
    pub user: String,

    pub password: String,

    #[validate(length(min = 1, message = "Database host must be set"))]
    pub host: String,

    #[serde(default = "default_port")]
    #[validate(range(min = 1, message = "Database port cannot be 0"))]
    pub port: u16,
}

fn default_port() -> u16 {
    5432
}

impl DatabaseConfig {
    pub fn new(
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port: default_port(),
        }
    }

    /// Builds driver connect options from this configuration.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Opens a single PostgreSQL connection with the given configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgConnection, sqlx::Error> {
    PgConnection::connect_with(&config.connect_options()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        let config = DatabaseConfig::new("clients", "postgres", "secret", "localhost");
        assert_eq!(config.port, 5432);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_host_fails_validation() {
        let config = DatabaseConfig::new("clients", "postgres", "secret", "");
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("host"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DatabaseConfig::new("clients", "postgres", "secret", "localhost");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("localhost"));
    }

    #[test]
    fn test_connect_options() {
        let mut config = DatabaseConfig::new("clients", "postgres", "secret", "db.internal");
        config.port = 6543;
        let options = config.connect_options();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "postgres");
        assert_eq!(options.get_database(), Some("clients"));
    }
}
