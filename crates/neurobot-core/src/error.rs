//! Error types for NEUROBOT.

use thiserror::Error;

/// A shared error type for every NEUROBOT library crate.
///
/// Variants are grouped by the failure taxonomy of a chat turn: input
/// validation, access denial, provider/transport failure and
/// persistence/parse failure, plus the usual infrastructure errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeurobotError {
    /// Submission was empty or whitespace-only.
    #[error("Message is empty")]
    EmptyInput,

    /// The system is in maintenance mode and the caller is not an administrator.
    #[error("System is in maintenance mode")]
    Maintenance,

    /// An administrator-only action was attempted without elevation.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A send was issued while another one is still streaming.
    #[error("A request is already in flight")]
    RequestInFlight,

    /// A turn with the same id already exists in the conversation log.
    #[error("Duplicate turn id '{id}'")]
    DuplicateTurn { id: String },

    /// Generation parameters outside their allowed ranges.
    #[error("Invalid generation config: {0}")]
    InvalidConfig(String),

    /// The model provider answered with an error.
    #[error("Provider error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Provider {
        status: Option<u16>,
        message: String,
    },

    /// The connection to the provider failed or broke mid-stream.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Key-value persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NeurobotError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an AccessDenied error for the given action.
    pub fn access_denied(action: impl Into<String>) -> Self {
        Self::AccessDenied(action.into())
    }

    /// Creates a Provider error
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an access denial
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }

    /// Check if the failure came from the provider or the transport to it.
    ///
    /// These are the errors that end up as the fixed error turn in the log.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Transport(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a storage or IO error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for NeurobotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for NeurobotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NeurobotError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for NeurobotError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, NeurobotError>`.
pub type Result<T> = std::result::Result<T, NeurobotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display_includes_status() {
        let err = NeurobotError::provider(Some(429), "RESOURCE_EXHAUSTED: quota");
        assert_eq!(
            err.to_string(),
            "Provider error (429): RESOURCE_EXHAUSTED: quota"
        );

        let err = NeurobotError::provider(None, "no candidates");
        assert_eq!(err.to_string(), "Provider error: no candidates");
    }

    #[test]
    fn test_provider_failure_classification() {
        assert!(NeurobotError::transport("reset").is_provider_failure());
        assert!(NeurobotError::provider(Some(500), "boom").is_provider_failure());
        assert!(!NeurobotError::Maintenance.is_provider_failure());
        assert!(!NeurobotError::storage("disk full").is_provider_failure());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: NeurobotError = parse_err.into();
        assert!(err.is_serialization());
    }
}
