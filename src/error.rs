use crate::pipeline::types::RowFailure;
use std::path::PathBuf;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to open or decode image {}: {source}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Table {} is missing required column(s): {}", .path.display(), .missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },
    #[error("Failed to read table {}: {source}", .path.display())]
    TableRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(
        "{} row(s) in {} have invalid color codes: {}",
        .failures.len(),
        .path.display(),
        list_failures(.failures)
    )]
    ColorDecode {
        path: PathBuf,
        failures: Vec<RowFailure>,
    },
    #[error("Failed to write report {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write run summary {}: {source}", .path.display())]
    SummaryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Pipeline task failed: {0}")]
    Task(String),
}

fn list_failures(failures: &[RowFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Configuration(e.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Task(e.to_string())
    }
}
