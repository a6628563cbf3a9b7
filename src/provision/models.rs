//! Connection settings and provisioning results.

/// Character set requested for every provisioning connection
pub const CHARSET: &str = "utf8mb4";

/// Environment variables the provisioner reads, in connection order
pub const ENDPOINT_VAR: &str = "DATABASE_ENDPOINT";
pub const USERNAME_VAR: &str = "DATABASE_USERNAME";
pub const PASSWORD_VAR: &str = "DATABASE_PASSWORD";
pub const PROJECT_VAR: &str = "PROJECT_NAME";

/// Flat connection record. Missing values stay `None` and are handed to the
/// driver as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database_name: Option<String>,
    pub charset: String,
}

impl ConnectionConfig {
    /// Build a config from explicit values (used by tests and embedders)
    pub fn new(
        host: Option<String>,
        username: Option<String>,
        password: Option<String>,
        database_name: Option<String>,
    ) -> Self {
        ConnectionConfig {
            host,
            username,
            password,
            database_name,
            charset: CHARSET.to_string(),
        }
    }

    /// Read the four provisioning variables from the process environment.
    ///
    /// No validation happens here: an unset or non-UTF-8 variable becomes `None`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConnectionConfig::from_env`] but with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            lookup(ENDPOINT_VAR),
            lookup(USERNAME_VAR),
            lookup(PASSWORD_VAR),
            lookup(PROJECT_VAR),
        )
    }

    /// Database name as sent to the server; empty when unset
    pub fn database_label(&self) -> &str {
        self.database_name.as_deref().unwrap_or("")
    }
}

// Hand-written so the password never ends up in logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database_name", &self.database_name)
            .field("charset", &self.charset)
            .finish()
    }
}

/// What happened to the `CREATE DATABASE` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created { database: String },
    Failed { database: String, message: String },
}

/// Build the provisioning statement.
///
/// The name is concatenated verbatim, with no quoting or escaping.
pub fn create_database_statement(name: Option<&str>) -> String {
    format!("CREATE DATABASE {}", name.unwrap_or(""))
}
