//! Checks which named records declare a color that never appears in a
//! reference image.
//!
//! The run is a fixed pipeline: the image's distinct colors are extracted
//! into a [`Palette`], the table is decoded into a [`RecordSet`], every record
//! is classified by exact palette membership, and the unmatched ones are
//! written out as a table.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::Configuration;
pub use error::AppError;
pub use pipeline::{
    Color, Palette, ReconciliationPipeline, ReconciliationResult, Record, RecordSet, RunError,
    RunOutcome,
};
