//! Error types for the search integration.

use quarry_config::ConfigError;
use quarry_files::FileError;
use quarry_metadata::MetadataError;
use quarry_model::ModelError;
use quarry_xml::XmlError;

/// Errors returned by project operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Metadata computation failed on a broken invariant.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// A project file could not be read or written.
    #[error(transparent)]
    File(#[from] FileError),

    /// A markup file could not be parsed or written.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// The project descriptor is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A type declaration could not be read or written.
    #[error("{path}: {source}")]
    Declaration {
        /// The declaration file.
        path: std::path::PathBuf,
        /// The underlying failure.
        source: ModelError,
    },

    /// A user action was rejected before anything was changed.
    #[error("{0}")]
    Precondition(String),
}

/// Problems with the options attached to a type through an annotation.
///
/// These never fail a computation: the provider logs them and yields no
/// artifact for the type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    /// The annotation carries an attribute the provider does not know.
    #[error("unknown option '{key}' on @{annotation}")]
    UnknownOption {
        /// The annotation's simple name.
        annotation: String,
        /// The unrecognized attribute.
        key: String,
    },

    /// An option was given a non-string value.
    #[error("option '{key}' must be a string")]
    NotAString {
        /// The offending attribute.
        key: String,
    },

    /// An option names a method that is not a valid identifier.
    #[error("option '{key}' = '{value}' is not a valid method name")]
    InvalidName {
        /// The offending attribute.
        key: String,
        /// The value given.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_displays_message_only() {
        let err = SearchError::Precondition(
            "Can only add elasticsearch for concrete types".to_string(),
        );
        assert_eq!(err.to_string(), "Can only add elasticsearch for concrete types");
    }

    #[test]
    fn unknown_option_display() {
        let err = OptionsError::UnknownOption {
            annotation: "RooElasticsearchSearchable".into(),
            key: "indexMethd".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown option 'indexMethd' on @RooElasticsearchSearchable"
        );
    }

    #[test]
    fn file_errors_are_transparent() {
        let err = SearchError::from(FileError::OutsideRoot {
            path: "../x".into(),
        });
        assert!(err.to_string().contains("outside the project root"));
    }
}
