//! Error types for configuration loading, validation, and saving.

use quarry_files::FileError;

/// Errors that can occur when loading, validating, or saving a `quarry.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(String),

    /// Writing the configuration back failed.
    #[error(transparent)]
    File(#[from] FileError),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("project.top_package".to_string());
        assert_eq!(format!("{err}"), "missing required field: project.top_package");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("duplicate repository 'central'".to_string());
        assert_eq!(
            format!("{err}"),
            "validation error: duplicate repository 'central'"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read configuration:"));
    }

    #[test]
    fn file_error_is_transparent() {
        let err = ConfigError::from(FileError::OutsideRoot {
            path: "../quarry.toml".into(),
        });
        assert!(format!("{err}").contains("outside the project root"));
    }
}
