//! Error types for the declaration model.

/// Errors raised while building or loading declarations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A type name is malformed.
    #[error("invalid type name '{name}': {reason}")]
    InvalidTypeName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A declaration file could not be (de)serialized.
    #[error("invalid type declaration: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_name_display() {
        let err = ModelError::InvalidTypeName {
            name: "com..Person".into(),
            reason: "empty segment".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid type name 'com..Person': empty segment"
        );
    }
}
