//! Command-line interface argument parsing for runkit.
//!
//! - `runkit create-db` creates `$PROJECT_NAME` on `$DATABASE_ENDPOINT`
//! - `runkit track` logs a demo run to the tracking server

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tracking server used when `--tracking-uri` isn't given
pub const DEFAULT_TRACKING_URI: &str =
    "http://mlf-mlfl-1uwakolwv4vok.qka77hxkue.us-west-2.elasticbeanstalk.com/";

/// Experiment every run lands in unless overridden ("Default" on the server)
pub const DEFAULT_EXPERIMENT_ID: &str = "0";

/// Provision project databases and log demo runs to an MLflow tracking server.
#[derive(Parser, Debug)]
#[command(name = "runkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project database named by PROJECT_NAME
    ///
    /// Reads DATABASE_ENDPOINT, DATABASE_USERNAME, DATABASE_PASSWORD and PROJECT_NAME.
    CreateDb {
        /// Exit non-zero when the CREATE DATABASE statement fails
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Log a demo run: one param, one metric three times, and an artifact directory
    Track {
        /// Tracking server base URL
        #[arg(long)]
        tracking_uri: Option<String>,

        /// Experiment to create the run in
        #[arg(long)]
        experiment_id: Option<String>,

        /// Local directory written and uploaded as artifacts
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration for the run logger
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    pub tracking_uri: String,
    pub experiment_id: String,
    pub output_dir: PathBuf,
    pub artifact_file: String,
    pub artifact_contents: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            tracking_uri: DEFAULT_TRACKING_URI.to_string(),
            experiment_id: DEFAULT_EXPERIMENT_ID.to_string(),
            output_dir: PathBuf::from("outputs"),
            artifact_file: "test2.txt".to_string(),
            artifact_contents: "hello world 2!".to_string(),
        }
    }
}

impl TrackingConfig {
    /// Create TrackingConfig from the `track` subcommand's flags
    pub fn from_track_command(
        tracking_uri: Option<String>,
        experiment_id: Option<String>,
        output_dir: Option<PathBuf>,
    ) -> Self {
        let defaults = TrackingConfig::default();
        TrackingConfig {
            tracking_uri: tracking_uri.unwrap_or(defaults.tracking_uri),
            experiment_id: experiment_id.unwrap_or(defaults.experiment_id),
            output_dir: output_dir.unwrap_or(defaults.output_dir),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackingConfig::from_track_command(None, None, None);
        assert_eq!(config.tracking_uri, DEFAULT_TRACKING_URI);
        assert_eq!(config.experiment_id, "0");
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.artifact_file, "test2.txt");
        assert_eq!(config.artifact_contents, "hello world 2!");
    }

    #[test]
    fn test_overrides() {
        let config = TrackingConfig::from_track_command(
            Some("http://localhost:5000".to_string()),
            Some("12".to_string()),
            Some(PathBuf::from("/tmp/out")),
        );
        assert_eq!(config.tracking_uri, "http://localhost:5000");
        assert_eq!(config.experiment_id, "12");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_subcommands_need_no_arguments() {
        let cli = Cli::try_parse_from(["runkit", "create-db"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::CreateDb {
                fail_on_error: false
            }
        ));
        assert_eq!(cli.log_level, "info");

        let cli = Cli::try_parse_from(["runkit", "track"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Track {
                tracking_uri: None,
                experiment_id: None,
                output_dir: None
            }
        ));
    }

    #[test]
    fn test_global_log_level_after_subcommand() {
        let cli = Cli::try_parse_from(["runkit", "track", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
    }
}
