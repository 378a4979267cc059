use thiserror::Error;

use crate::core::types::ConceptId;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Concept not found: {0}")]
    ConceptNotFound(ConceptId),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Unrecognized message type: {0}")]
    UnrecognizedMessage(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl TutorError {
    /// Protocol errors are recovered locally: the frame is dropped and the
    /// channel stays open.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            TutorError::MalformedFrame(_) | TutorError::UnrecognizedMessage(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_classification() {
        assert!(TutorError::MalformedFrame("x".into()).is_protocol());
        assert!(TutorError::UnrecognizedMessage("PING".into()).is_protocol());
        assert!(!TutorError::TransportClosed.is_protocol());
        assert!(!TutorError::ConceptNotFound(ConceptId(9)).is_protocol());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TutorError::ConceptNotFound(ConceptId(42)).to_string(),
            "Concept not found: 42"
        );
    }
}
