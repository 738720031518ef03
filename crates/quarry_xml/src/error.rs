//! Error types for markup documents.

use quarry_files::FileError;

/// Errors raised while reading, writing, or merging markup documents.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The text is not well-formed markup.
    #[error("failed to parse document: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The document has no root element.
    #[error("document has no root element")]
    MissingRoot,

    /// Serializing the tree failed.
    #[error("failed to write document: {reason}")]
    Write {
        /// Description of the write failure.
        reason: String,
    },

    /// Reading or writing the file failed.
    #[error(transparent)]
    File(#[from] FileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = XmlError::Parse {
            reason: "unexpected end of input".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse document: unexpected end of input"
        );
    }

    #[test]
    fn file_error_is_transparent() {
        let err: XmlError = FileError::OutsideRoot {
            path: "../views.xml".into(),
        }
        .into();
        assert!(err.to_string().contains("outside the project root"));
    }
}
