#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use crudgen_core::{AppError, StageError};
use derive_more::{Display, From};
use std::path::PathBuf;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// A core failure outside of any pipeline stage.
    #[display("{}", _0)]
    Core(AppError),

    /// A single-entity run failed in one of its stages.
    #[display("{}", _0)]
    Stage(StageError),

    /// Batch mode found nothing to generate.
    #[display("No schema files found in {}", _0.display())]
    #[from(ignore)]
    NoSchemas(PathBuf),
}

/// Manual implementation of the standard Error trait.
///
/// `NoSchemas` wraps a `PathBuf`, which is not an error, so `source()` is
/// spelled out by hand.
impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Core(e) => Some(e),
            CliError::Stage(e) => Some(e),
            CliError::NoSchemas(_) => None,
        }
    }
}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
