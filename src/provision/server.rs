//! Database server access.
//!
//! `DatabaseServer` hands out single `Session`s; `MySqlServer` implements it on top of
//! sqlx, driving the async driver on a private current-thread runtime so callers stay
//! synchronous.

use std::sync::Arc;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tokio::runtime::Runtime;

use super::models::ConnectionConfig;

/// Driver-level failure, carrying the driver's own message
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{0}")]
    Driver(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

/// Something that can open a connection to a database server
pub trait DatabaseServer {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>, DbError>;
}

/// One open connection
pub trait Session {
    /// Run a statement as plain text, returning the affected row count
    fn execute(&mut self, sql: &str) -> Result<u64, DbError>;

    /// Close the connection, consuming it
    fn close(self: Box<Self>) -> Result<(), DbError>;
}

/// sqlx-backed MySQL server handle
pub struct MySqlServer {
    runtime: Arc<Runtime>,
}

impl MySqlServer {
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(MySqlServer {
            runtime: Arc::new(runtime),
        })
    }
}

/// Translate the config into driver options.
///
/// Unset fields are left at the driver's defaults rather than being validated.
fn connect_options(config: &ConnectionConfig) -> MySqlConnectOptions {
    let mut opts = MySqlConnectOptions::new().charset(&config.charset);
    if let Some(host) = &config.host {
        opts = opts.host(host);
    }
    if let Some(user) = &config.username {
        opts = opts.username(user);
    }
    if let Some(password) = &config.password {
        opts = opts.password(password);
    }
    opts
}

impl DatabaseServer for MySqlServer {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>, DbError> {
        let opts = connect_options(config);
        let conn = self.runtime.block_on(MySqlConnection::connect_with(&opts))?;
        tracing::debug!(host = ?config.host, "mysql connection established");
        Ok(Box::new(MySqlSession {
            conn,
            runtime: Arc::clone(&self.runtime),
        }))
    }
}

struct MySqlSession {
    conn: MySqlConnection,
    runtime: Arc<Runtime>,
}

impl Session for MySqlSession {
    fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        // raw_sql goes over the text protocol, so DDL is sent exactly as written.
        let result = self
            .runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut self.conn))?;
        Ok(result.rows_affected())
    }

    fn close(self: Box<Self>) -> Result<(), DbError> {
        let MySqlSession { conn, runtime } = *self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}
