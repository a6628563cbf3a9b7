//! tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Filter for `level`, unless `RUST_LOG` is set in the environment (or a loaded `.env`)
fn build_filter(level: &str) -> EnvFilter {
    let default = format!("{level},sqlx=warn,reqwest=warn,hyper=warn");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber, writing to stderr.
///
/// `level` is the base level; `RUST_LOG` still overrides it.
pub fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_from_env_file_overrides_level() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "RUST_LOG=runkit=trace\n").unwrap();

        dotenvy::from_path_override(&env_file).unwrap();
        let filter = build_filter("info").to_string();
        assert!(filter.contains("runkit=trace"));
        assert!(!filter.contains("sqlx=warn"));
    }
}
