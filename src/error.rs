//! Error types for the listing wizard.

/// Top-level error type for the wizard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from enrichment lookups (geocoding, pincode directory, logo
/// discovery). The controller always swallows these and degrades to
/// "no data"; they exist so the HTTP adapters can report what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Lookup {capability} request failed: {reason}")]
    RequestFailed { capability: String, reason: String },

    #[error("Lookup {capability} returned status {status}")]
    BadStatus { capability: String, status: u16 },

    #[error("Lookup {capability} returned an unparseable body: {reason}")]
    BadBody { capability: String, reason: String },
}

/// A remote write failure, classified by how the orchestrator may react.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never completed (DNS, connect, timeout). Retryable.
    #[error("Network failure calling {endpoint}: {reason}")]
    Network { endpoint: String, reason: String },

    /// The server answered with a non-2xx status. 4xx is terminal, 5xx may
    /// get one degraded retry.
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
}

impl ApiError {
    /// Whether this is a client rejection (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }

    /// Whether this is a server fault (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (500..600).contains(status))
    }
}

/// Terminal submission failures returned by the orchestrator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    /// A required field was missing from the answer record. Caught before
    /// any network call is made.
    #[error("Cannot submit: missing required field {field}")]
    MissingField { field: String },

    /// A gig needs either state+district or a coordinate pair.
    #[error("Cannot submit: no usable location (need state+district or coordinates)")]
    NoLocation,

    /// The server rejected the payload (4xx). The message is surfaced to the
    /// user verbatim.
    #[error("{entity} was rejected: {message}")]
    Rejected { entity: String, message: String },

    /// Retries exhausted on network failure or an unrecoverable 5xx.
    #[error("{entity} could not be created after {attempts} attempt(s): {reason}")]
    Exhausted {
        entity: String,
        attempts: u32,
        reason: String,
    },
}

/// Persistence errors (snapshot store, conversation log).
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conversation log append failed: {0}")]
    LogAppend(String),
}

/// Result type alias for the wizard.
pub type Result<T> = std::result::Result<T, Error>;
