//! Run logging against an MLflow-compatible tracking server.
//!
//! Handles creating runs, logging params and metrics, and uploading artifact directories.

mod artifacts;
mod client;
mod demo;
mod error;
#[cfg(test)]
mod memory;
mod models;
mod tracker;

pub use client::MlflowClient;
pub use demo::run_demo;
pub use tracker::Tracker;
