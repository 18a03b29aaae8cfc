//! Error types for CloudControl tooling
//!
//! Every failure a command can report is a variant of [`Error`]. Each variant
//! maps to a machine-readable identifier ([`Error::error_id`]), a category
//! ([`Error::category`]) and an optional target object ([`Error::target`]),
//! which together form the structured error record emitted by commands.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::ResourceKind;

/// Result type alias for CloudControl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an error, used when reporting error records
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorCategory {
    InvalidArgument,
    ObjectNotFound,
    ResourceExists,
    InvalidOperation,
    InvalidData,
    WriteError,
    SecurityError,
    OperationTimeout,
    OperationStopped,
    ConnectionError,
    NotSpecified,
}

/// Core error type for CloudControl tooling
#[derive(Error, Debug)]
pub enum Error {
    /// No connection name was supplied and no default connection is configured
    #[error(
        "The connection name was not specified and no default connection has been configured."
    )]
    ConnectionRequired {
        /// The command that needed a connection
        command: String,
    },

    /// No connection profile with the given name exists
    #[error("A connection named '{0}' does not exist.")]
    ConnectionDoesNotExist(String),

    /// A connection profile with the given name already exists
    #[error("A connection named '{0}' already exists.")]
    ConnectionExists(String),

    /// The client for a connection was closed while in use
    #[error("The connection '{0}' has been closed.")]
    ConnectionClosed(String),

    /// Remote lookup by id found nothing
    #[error("Cannot find a {kind} with Id '{id}'.")]
    ResourceNotFoundById {
        /// Kind of resource that was requested
        kind: ResourceKind,
        /// Requested id
        id: String,
    },

    /// Remote lookup by name found nothing
    #[error("{message}")]
    ResourceNotFoundByName {
        /// Kind of resource that was requested
        kind: ResourceKind,
        /// Requested name
        name: String,
        /// Human-readable description of the miss
        message: String,
    },

    /// The remote API returned a non-success response
    #[error("CloudControl API error ({response_code}): {message}")]
    Api {
        /// The API's own response code (e.g. `RESOURCE_NOT_FOUND`)
        response_code: String,
        /// The API's message
        message: String,
        /// The operation reported by the API, if any
        operation: Option<String>,
        /// The API request id, if any
        request_id: Option<String>,
    },

    /// A command parameter was invalid
    #[error("Invalid value for parameter '{parameter}': {message}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// What was wrong with it
        message: String,
    },

    /// A command reached a code path with no matching input combination
    #[error("Unrecognised parameter-set: '{0}'.")]
    UnrecognizedParameterSet(String),

    /// A named item does not exist in a local collection
    #[error("No item named '{0}' was found.")]
    NotFound(String),

    /// The connection store exists but cannot be parsed
    #[error("Connection store {path} is corrupt: {message}")]
    StoreCorrupt {
        /// Store file path
        path: PathBuf,
        /// Parse failure detail
        message: String,
    },

    /// The connection store could not be written
    #[error("Failed to write connection store {path}: {message}")]
    StoreWriteFailed {
        /// Store file path
        path: PathBuf,
        /// I/O failure detail
        message: String,
    },

    /// Protected data could not be decrypted
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// A resource did not reach the target state in time
    #[error("{kind} '{id}' did not reach state '{target_state}' within {timeout:?}.")]
    Timeout {
        /// Kind of resource being polled
        kind: ResourceKind,
        /// Resource id
        id: String,
        /// Target state
        target_state: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// The operation was cancelled
    #[error("The operation was cancelled.")]
    Cancelled,

    /// Transport-level HTTP failure (connect, TLS, timeout, 5xx)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a "connection required" error for a command
    pub fn connection_required(command: impl Into<String>) -> Self {
        Self::ConnectionRequired {
            command: command.into(),
        }
    }

    /// Create a "not found by id" error
    pub fn not_found_by_id(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::ResourceNotFoundById {
            kind,
            id: id.into(),
        }
    }

    /// Create a "not found by name" error with a default message
    pub fn not_found_by_name(
        kind: ResourceKind,
        name: impl Into<String>,
        parent: Option<&str>,
    ) -> Self {
        let name = name.into();
        let message = match parent {
            Some(parent) => format!(
                "No {} named '{}' was found in {} '{}'.",
                kind,
                name,
                kind.parent_description(),
                parent
            ),
            None => format!("No {} named '{}' was found.", kind, name),
        };

        Self::ResourceNotFoundByName {
            kind,
            name,
            message,
        }
    }

    /// Create an API error from a response code and message
    pub fn api(response_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            response_code: response_code.into(),
            message: message.into(),
            operation: None,
            request_id: None,
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an unrecognised-parameter-set error
    pub fn unrecognized_parameter_set(parameter_set: impl Into<String>) -> Self {
        Self::UnrecognizedParameterSet(parameter_set.into())
    }

    /// Create a store-corrupt error
    pub fn store_corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StoreCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a store-write-failed error
    pub fn store_write_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StoreWriteFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a decryption error
    pub fn decryption_failed(msg: impl Into<String>) -> Self {
        Self::DecryptionFailed(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Machine-readable identifier for this error
    pub fn error_id(&self) -> String {
        match self {
            Error::ConnectionRequired { .. } => "CloudControl.Connection.Required".to_string(),
            Error::ConnectionDoesNotExist(_) => "CloudControl.Connection.DoesNotExist".to_string(),
            Error::ConnectionExists(_) => "CloudControl.Connection.Exists".to_string(),
            Error::ConnectionClosed(_) => "CloudControl.Connection.Closed".to_string(),
            Error::ResourceNotFoundById { kind, .. } | Error::ResourceNotFoundByName { kind, .. } => {
                format!("CloudControl.{}.NotFound", kind.type_name())
            }
            Error::Api { response_code, .. } => format!("CloudControl.Api.{}", response_code),
            Error::InvalidParameter { .. } => "CloudControl.InvalidParameter".to_string(),
            Error::UnrecognizedParameterSet(_) => "UnrecognisedParameterSet".to_string(),
            Error::NotFound(_) => "CloudControl.NotFound".to_string(),
            Error::StoreCorrupt { .. } => "CloudControl.Store.Corrupt".to_string(),
            Error::StoreWriteFailed { .. } => "CloudControl.Store.WriteFailed".to_string(),
            Error::DecryptionFailed(_) => "CloudControl.Store.DecryptionFailed".to_string(),
            Error::Timeout { .. } => "CloudControl.Poll.Timeout".to_string(),
            Error::Cancelled => "CloudControl.Cancelled".to_string(),
            Error::Http(_) => "CloudControl.Http".to_string(),
            Error::Config(_) => "CloudControl.Config".to_string(),
            Error::Io(_) => "CloudControl.IO".to_string(),
            Error::Json(_) => "CloudControl.Json".to_string(),
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ConnectionRequired { .. }
            | Error::InvalidParameter { .. }
            | Error::UnrecognizedParameterSet(_) => ErrorCategory::InvalidArgument,
            Error::ConnectionDoesNotExist(_)
            | Error::ResourceNotFoundById { .. }
            | Error::ResourceNotFoundByName { .. }
            | Error::NotFound(_) => ErrorCategory::ObjectNotFound,
            Error::ConnectionExists(_) => ErrorCategory::ResourceExists,
            Error::ConnectionClosed(_) | Error::Http(_) => ErrorCategory::ConnectionError,
            Error::Api { .. } => ErrorCategory::InvalidOperation,
            Error::StoreCorrupt { .. } | Error::Json(_) => ErrorCategory::InvalidData,
            Error::StoreWriteFailed { .. } | Error::Io(_) => ErrorCategory::WriteError,
            Error::DecryptionFailed(_) => ErrorCategory::SecurityError,
            Error::Timeout { .. } => ErrorCategory::OperationTimeout,
            Error::Cancelled => ErrorCategory::OperationStopped,
            Error::Config(_) => ErrorCategory::NotSpecified,
        }
    }

    /// The object the error is about, for diagnostics
    pub fn target(&self) -> Option<String> {
        match self {
            Error::ConnectionRequired { command } => Some(command.clone()),
            Error::ConnectionDoesNotExist(name)
            | Error::ConnectionExists(name)
            | Error::ConnectionClosed(name)
            | Error::NotFound(name) => Some(name.clone()),
            Error::ResourceNotFoundById { id, .. } | Error::Timeout { id, .. } => Some(id.clone()),
            Error::ResourceNotFoundByName { name, .. } => Some(name.clone()),
            Error::Api { request_id, .. } => request_id.clone(),
            Error::InvalidParameter { parameter, .. } => Some(parameter.clone()),
            Error::UnrecognizedParameterSet(set) => Some(set.clone()),
            Error::StoreCorrupt { path, .. } | Error::StoreWriteFailed { path, .. } => {
                Some(path.display().to_string())
            }
            _ => None,
        }
    }

    /// Whether the error stops the current command entirely
    ///
    /// Expected, per-item conditions (not-found, already-exists, API failures,
    /// poll timeouts) are non-fatal: processing continues with the next input.
    /// Setup and persistence failures are fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::ConnectionExists(_)
                | Error::ResourceNotFoundById { .. }
                | Error::ResourceNotFoundByName { .. }
                | Error::Api { .. }
                | Error::InvalidParameter { .. }
                | Error::NotFound(_)
                | Error::Timeout { .. }
                | Error::Http(_)
        )
    }

    /// Whether the error is a transient transport condition worth retrying
    ///
    /// Only the resource-state poller retries; explicit API error responses
    /// are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_ids() {
        assert_eq!(
            Error::connection_required("Get-Vlan").error_id(),
            "CloudControl.Connection.Required"
        );
        assert_eq!(
            Error::not_found_by_id(ResourceKind::Vlan, "abc").error_id(),
            "CloudControl.Vlan.NotFound"
        );
        assert_eq!(
            Error::api("RESOURCE_BUSY", "busy").error_id(),
            "CloudControl.Api.RESOURCE_BUSY"
        );
        assert_eq!(
            Error::unrecognized_parameter_set("By Magic").error_id(),
            "UnrecognisedParameterSet"
        );
    }

    #[test]
    fn test_fatality_follows_propagation_policy() {
        assert!(Error::connection_required("x").is_fatal());
        assert!(Error::store_corrupt("/tmp/x.json", "bad").is_fatal());
        assert!(Error::unrecognized_parameter_set("x").is_fatal());
        assert!(Error::Cancelled.is_fatal());

        assert!(!Error::ConnectionExists("a".into()).is_fatal());
        assert!(!Error::not_found_by_id(ResourceKind::Server, "1").is_fatal());
        assert!(!Error::api("INVALID_INPUT_DATA", "nope").is_fatal());
    }

    #[test]
    fn test_not_found_by_name_message_mentions_parent() {
        let err = Error::not_found_by_name(ResourceKind::Vlan, "web", Some("nd-1"));
        assert_eq!(
            err.to_string(),
            "No VLAN named 'web' was found in network domain 'nd-1'."
        );
        assert_eq!(err.target().as_deref(), Some("web"));
    }

    #[test]
    fn test_only_transport_errors_are_transient() {
        assert!(Error::http("connection reset").is_transient());
        assert!(!Error::api("SERVER_ERROR", "x").is_transient());
        assert!(!Error::Cancelled.is_transient());
    }
}
