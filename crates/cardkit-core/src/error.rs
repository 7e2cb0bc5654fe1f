//! Error types for the CardKit workspace.

use thiserror::Error;

/// A shared error type for the entire CardKit workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Variants are message-based
/// rather than source-wrapping so they stay cheap to clone and hand across
/// the UI boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CardError {
    /// The byte stream is not a supported image container or carries no
    /// embedded card metadata.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The embedded character-book field was a string that failed to parse
    /// as JSON. Fatal for the load it occurred in.
    #[error("Character book parse error: {0}")]
    BookParse(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Export was requested while the model holds no meaningful data.
    #[error("Nothing to export: load a card or enter data first")]
    EmptyExport,

    /// A destructive operation was requested while unsaved edits exist.
    /// Surfaced so the UI can prompt for confirmation.
    #[error("Unsaved changes present: save or discard them first")]
    UnsavedChanges,

    /// A load was requested while another load is still in flight.
    #[error("A load operation is already in progress")]
    LoadInProgress,

    /// Database error (record store layer)
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", "TOML", etc.
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CardError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Creates a BookParse error
    pub fn book_parse(message: impl Into<String>) -> Self {
        Self::BookParse(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Check if this error should be surfaced as a confirmation prompt
    /// rather than a hard failure.
    pub fn is_unsaved_changes(&self) -> bool {
        matches!(self, Self::UnsavedChanges)
    }

    /// Check if this is an EmptyExport error
    pub fn is_empty_export(&self) -> bool {
        matches!(self, Self::EmptyExport)
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CardError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for CardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CardError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CardError>`.
pub type Result<T> = std::result::Result<T, CardError>;
