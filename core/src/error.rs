//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Stage failures (`SchemaParse`, `Render`, `RegistryWrite`) abort the entity being
//! processed. `ConfigCorrupt` is constructed only to be logged: shared configuration
//! documents that fail to parse are reset to their defaults instead of aborting.

use derive_more::{Display, From};
use std::path::Path;

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML schema parsing errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Wrapper for fragment template errors.
    #[display("Template Error: {_0}")]
    Template(minijinja::Error),

    /// A schema document is unreadable, malformed, or violates a descriptor invariant.
    #[from(ignore)]
    #[display("Schema Parse Error in {path}: {reason}")]
    SchemaParse {
        /// Path of the offending schema document.
        path: String,
        /// Human readable cause.
        reason: String,
    },

    /// An existing shared configuration document could not be parsed.
    #[from(ignore)]
    #[display("Corrupt configuration {path}: {reason}")]
    ConfigCorrupt {
        /// Path of the corrupt document.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// A template fragment or descriptor could not be rendered.
    #[from(ignore)]
    #[display("Render Error: {_0}")]
    Render(String),

    /// Writing a shared document (registry, index, config) failed.
    #[from(ignore)]
    #[display("Registry Write Error for {path}: {cause}")]
    RegistryWrite {
        /// Path of the document being written.
        path: String,
        /// Underlying IO failure.
        cause: std::io::Error,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Builds a `SchemaParse` error for the given schema path.
    pub fn schema(path: &Path, reason: impl Into<String>) -> Self {
        AppError::SchemaParse {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Builds a `RegistryWrite` error for the given document path.
    pub fn registry_write(path: &Path, cause: std::io::Error) -> Self {
        AppError::RegistryWrite {
            path: path.display().to_string(),
            cause,
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};
    use std::path::PathBuf;

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_schema_error_display() {
        let err = AppError::schema(&PathBuf::from("schemas/team.schema.json"), "missing properties");
        assert_eq!(
            err.to_string(),
            "Schema Parse Error in schemas/team.schema.json: missing properties"
        );
    }

    #[test]
    fn test_registry_write_display() {
        let err = AppError::registry_write(
            &PathBuf::from("routes/mod.rs"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().starts_with("Registry Write Error for routes/mod.rs"));
    }
}
