//! The provisioning operation: connect, issue one `CREATE DATABASE`, close.

use super::models::{create_database_statement, ConnectionConfig, ProvisionOutcome};
use super::server::{DatabaseServer, DbError, Session};

/// Failures that happen before the statement is ever sent
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("failed to connect to database server")]
    Connect(#[source] DbError),

    #[error("failed to start database runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Owns a session and closes it when dropped, whichever path got us there
struct SessionGuard {
    session: Option<Box<dyn Session>>,
}

impl SessionGuard {
    fn new(session: Box<dyn Session>) -> Self {
        SessionGuard {
            session: Some(session),
        }
    }

    fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        match self.session.as_mut() {
            Some(session) => session.execute(sql),
            None => Err(DbError::Other("session already closed".to_string())),
        }
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close() {
                tracing::warn!(error = %e, "failed to close database connection cleanly");
            } else {
                tracing::debug!("database connection closed");
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Create the configured database on the server.
///
/// A connection failure is an `Err`. Once connected, a failing statement is reported
/// as [`ProvisionOutcome::Failed`] so the caller decides what it means for the exit
/// status. The connection is closed on every path.
pub fn provision(
    server: &dyn DatabaseServer,
    config: &ConnectionConfig,
) -> Result<ProvisionOutcome, ProvisionError> {
    let database = config.database_label().to_string();
    let statement = create_database_statement(config.database_name.as_deref());

    let password_state = if config.password.is_some() { "set" } else { "unset" };
    tracing::info!(
        host = ?config.host,
        user = ?config.username,
        password = password_state,
        database = %database,
        charset = %config.charset,
        "connecting to database server"
    );

    let session = server.connect(config).map_err(ProvisionError::Connect)?;
    let mut guard = SessionGuard::new(session);

    let outcome = match guard.execute(&statement) {
        Ok(rows) => {
            tracing::info!(database = %database, rows, "database created");
            ProvisionOutcome::Created { database }
        }
        Err(e) => {
            tracing::error!(database = %database, error = %e, "CREATE DATABASE failed");
            ProvisionOutcome::Failed {
                database,
                message: e.to_string(),
            }
        }
    };

    guard.close();
    Ok(outcome)
}
