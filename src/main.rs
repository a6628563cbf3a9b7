//! runkit: project database provisioning and demo experiment tracking.
//!
//! `create-db` issues one `CREATE DATABASE` against a MySQL server configured through
//! environment variables. `track` logs a param, a metric and an artifact directory to
//! an MLflow tracking server.

mod cli;
mod logging;
mod provision;
mod tracking;

use std::io::Write;

use anyhow::{Context, Result};
use cli::{Cli, Commands, TrackingConfig};
use provision::{ConnectionConfig, DatabaseServer, MySqlServer, ProvisionError, ProvisionOutcome};
use tracking::{MlflowClient, Tracker};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Loaded before logging so RUST_LOG in .env applies. A missing .env is fine.
    let dotenv = dotenvy::dotenv();
    logging::init_logging(&cli.log_level);
    if let Ok(path) = &dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match cli.command {
        Commands::CreateDb { fail_on_error } => create_db(fail_on_error),
        Commands::Track {
            tracking_uri,
            experiment_id,
            output_dir,
        } => {
            let config =
                TrackingConfig::from_track_command(tracking_uri, experiment_id, output_dir);
            track(&config)
        }
    }
}

fn create_db(fail_on_error: bool) -> Result<()> {
    let config = ConnectionConfig::from_env();
    let server = MySqlServer::new().map_err(ProvisionError::Runtime)?;
    let stdout = std::io::stdout();
    run_create_db(&server, &config, fail_on_error, &mut stdout.lock())
}

/// Provision and map the outcome to an exit status.
///
/// A failed statement is printed to `out` and only becomes an error with
/// `fail_on_error`; a connection failure is always an error.
fn run_create_db(
    server: &dyn DatabaseServer,
    config: &ConnectionConfig,
    fail_on_error: bool,
    out: &mut impl Write,
) -> Result<()> {
    let outcome = provision::provision(server, config)
        .with_context(|| format!("failed to provision database {:?}", config.database_label()))?;

    match outcome {
        ProvisionOutcome::Created { database } => {
            tracing::info!(%database, "provisioning complete");
        }
        ProvisionOutcome::Failed { database, message } => {
            writeln!(out, "Exception occurred: {message}")?;
            if fail_on_error {
                anyhow::bail!("CREATE DATABASE {database} failed: {message}");
            }
        }
    }

    Ok(())
}

fn track(config: &TrackingConfig) -> Result<()> {
    println!("Running runkit track");

    let client = MlflowClient::new(&config.tracking_uri)
        .with_context(|| "failed to create tracking client")?;
    tracing::info!(uri = %client.base_url(), experiment_id = %config.experiment_id, "tracking to");

    let mut tracker = Tracker::new(client, config.experiment_id.clone());
    let mut rng = rand::thread_rng();
    let report = tracking::run_demo(&mut tracker, config, &mut rng)
        .with_context(|| format!("tracking run against {} failed", config.tracking_uri))?;

    println!(
        "Logged run {}: param1={} foo={:?} artifacts={:?}",
        report.run_id, report.param_value, report.metric_values, report.uploaded
    );
    tracing::debug!(path = %report.artifact_path.display(), "artifact file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use provision::fake::{config, FakeServer};

    fn printed(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_create_db_success_prints_nothing() {
        let server = FakeServer::new();
        let mut out = Vec::new();

        run_create_db(&server, &config(Some("analytics")), true, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(server.journal.borrow().closes, 1);
    }

    #[test]
    fn test_create_db_failure_prints_and_exits_cleanly() {
        let server = FakeServer::with_existing("analytics");
        let mut out = Vec::new();

        run_create_db(&server, &config(Some("analytics")), false, &mut out).unwrap();
        assert_eq!(
            printed(out),
            "Exception occurred: 1007 (HY000): Can't create database 'analytics'; \
             database exists\n"
        );
    }

    #[test]
    fn test_create_db_failure_with_flag_is_an_error() {
        let server = FakeServer::with_existing("analytics");
        let mut out = Vec::new();

        let err = run_create_db(&server, &config(Some("analytics")), true, &mut out).unwrap_err();
        assert!(err.to_string().contains("CREATE DATABASE analytics failed"));
        assert!(printed(out).starts_with("Exception occurred: "));
        assert_eq!(server.journal.borrow().closes, 1);
    }

    #[test]
    fn test_create_db_connect_failure_is_an_error() {
        let mut server = FakeServer::new();
        server.refuse_connect = true;
        let mut out = Vec::new();

        let err = run_create_db(&server, &config(Some("analytics")), false, &mut out).unwrap_err();
        assert!(err.to_string().contains("failed to provision database"));
        assert!(out.is_empty());
    }
}
