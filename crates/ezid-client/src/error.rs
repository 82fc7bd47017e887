//! Error taxonomy for EZID client operations.

use ezid_anvl::AnvlError;

/// Errors that can occur while talking to the EZID service.
///
/// Service-reported failures carry the service's own message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EzidError {
    /// Login was rejected
    #[error("authentication failed (status {status}): {message}")]
    Authentication {
        /// HTTP status code
        status: u16,
        /// Message from the service
        message: String,
    },
    /// Operation attempted before a successful login
    #[error("session is not logged in")]
    SessionNotActive,
    /// Operation attempted after logout
    #[error("session has been closed by logout")]
    SessionClosed,
    /// The service no longer accepts the session cookie; log in again
    #[error("session expired: {message}")]
    SessionExpired {
        /// Message from the service
        message: String,
    },
    /// Login attempted while a session cookie is already held
    #[error("session is already logged in")]
    AlreadyAuthenticated,
    /// Response body was not well-formed ANVL
    #[error("protocol format error: {0}")]
    ProtocolFormat(String),
    /// Create conflicted with an existing identifier
    #[error("identifier already exists: {identifier}: {message}")]
    IdentifierExists {
        /// Identifier that was requested
        identifier: String,
        /// Message from the service
        message: String,
    },
    /// Identifier is unknown to the service
    #[error("identifier not found: {identifier}: {message}")]
    NotFound {
        /// Identifier that was requested
        identifier: String,
        /// Message from the service
        message: String,
    },
    /// The service rejected the request
    #[error("operation failed (status {status}): {message}")]
    Operation {
        /// HTTP status code
        status: u16,
        /// Message from the service
        message: String,
    },
    /// No response was received
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Identifier or shoulder without a `doi:` or `ark:` prefix
    #[error("invalid identifier {0:?}: expected a doi: or ark: prefix")]
    InvalidIdentifier(String),
    /// Client construction or configuration failed
    #[error("config error: {0}")]
    Config(String),
}

impl From<AnvlError> for EzidError {
    fn from(err: AnvlError) -> Self {
        Self::ProtocolFormat(err.to_string())
    }
}

/// Transport-level failures: the request produced no HTTP response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request exceeded its timeout
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Connection, TLS, or body transfer failed
    #[error("request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
