//! Database provisioning: create a project's database on a MySQL server.
//!
//! Connection settings come from `DATABASE_ENDPOINT`, `DATABASE_USERNAME`,
//! `DATABASE_PASSWORD` and `PROJECT_NAME`.

#[cfg(test)]
pub mod fake;
mod models;
mod provisioner;
mod server;

pub use models::{ConnectionConfig, ProvisionOutcome};
pub use provisioner::{provision, ProvisionError};
pub use server::{DatabaseServer, MySqlServer};
