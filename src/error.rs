//! Error types for yaml-config-edit

use thiserror::Error;

/// Errors that can occur when editing a configuration document
#[derive(Debug, Error)]
pub enum YamlError {
    /// I/O error when reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The text could not be parsed as YAML
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    /// The operation needs document content, but there is none
    #[error("tried to set a value in an empty document")]
    EmptyDocument,

    /// The requested root key is absent or does not hold a map
    #[error("config key not found: {0:?}")]
    RootKeyNotFound(String),

    /// A path step found a map where an array was required, or vice versa
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// An array index lies beyond the append position
    #[error("array index {index} out of range (length {len})")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// The length of the array
        len: usize,
    },

    /// The write would produce the reserved `{secure: ...}` shape
    #[error("\"secure\" key in maps of length 1 are reserved")]
    SecureKeyReserved,

    /// A key or property path could not be parsed
    #[error("invalid key: {0}")]
    InvalidKeyPath(String),
}

/// Result type for yaml-config-edit operations
pub type YamlResult<T> = Result<T, YamlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            YamlError::SecureKeyReserved.to_string(),
            "\"secure\" key in maps of length 1 are reserved"
        );
        assert_eq!(
            YamlError::RootKeyNotFound("app".to_string()).to_string(),
            "config key not found: \"app\""
        );
        assert_eq!(
            YamlError::IndexOutOfRange { index: 5, len: 2 }.to_string(),
            "array index 5 out of range (length 2)"
        );
    }

    #[test]
    fn test_io_source() {
        let err: YamlError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
