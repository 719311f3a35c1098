//! Error types for the workflow publisher.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! `ClientError` covers the HTTP layer (SPARQL endpoints, the Wikibase API, the
//! citation service); `ExportError` covers the run-level failure taxonomy. Every
//! `ExportError` is terminal: a run either produces a fully linked workflow or
//! nothing at all.

use std::time::Duration;

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Rate limited by the endpoint (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from the endpoint
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// The MediaWiki API accepted the request but reported a failure
    /// (bad credentials, malformed entity data, abuse filter, etc.)
    #[error("API rejected {action}: {code}: {info}")]
    ApiRejected {
        /// The `action=` parameter of the failed call
        action: String,
        /// Machine-readable error code
        code: String,
        /// Human-readable error info
        info: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Create an API rejection error.
    #[must_use]
    pub fn api_rejected(
        action: impl Into<String>,
        code: impl Into<String>,
        info: impl Into<String>,
    ) -> Self {
        Self::ApiRejected { action: action.into(), code: code.into(), info: info.into() }
    }

    /// Classify a send-call failure, surfacing request timeouts.
    #[must_use]
    pub fn transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() { Self::Timeout(timeout) } else { Self::Http(err) }
    }

    /// [`transport`](Self::transport) for middleware-wrapped clients.
    #[must_use]
    pub fn middleware_transport(err: reqwest_middleware::Error, timeout: Duration) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => Self::transport(e, timeout),
            other => Self::Middleware(other),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only read paths consult this; entity writes are never retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_) | Self::Server { .. })
    }
}

/// The entity category an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The mathematical model.
    Model,
    /// A mathematical method.
    Method,
    /// A software item.
    Software,
    /// An input data set.
    Input,
    /// An output data set.
    Output,
    /// A research discipline.
    Discipline,
}

impl Category {
    /// Lower-case name used in answer keys and messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Method => "method",
            Self::Software => "software",
            Self::Input => "input",
            Self::Output => "output",
            Self::Discipline => "discipline",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Run-level failures. All variants abort the run; there is no partial-success
/// path that returns a half-built workflow.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// A mandatory selection is absent or unrecognized.
    #[error("Missing required answer: {field}")]
    MissingRequiredAnswer {
        /// Answer key or decision name that was missing
        field: String,
    },

    /// A declared entity instance has neither an identifier nor a usable
    /// label/description pair.
    #[error("Missing required entity: {category} #{index}: {detail}")]
    MissingRequiredEntity {
        /// Entity category that failed
        category: Category,
        /// Zero-based instance index within the category
        index: usize,
        /// What exactly was missing
        detail: String,
    },

    /// The pre-flight check found a workflow with the same title and
    /// research objective already on the portal.
    #[error("Workflow \"{title}\" is already published")]
    DuplicateWorkflow {
        /// Title of the existing workflow
        title: String,
    },

    /// An entity create call failed. Not retried: re-running after a blind
    /// retry risks duplicate entities.
    #[error("Entity store failure: {0}")]
    EntityStoreFailure(#[source] ClientError),

    /// A citation lookup or federated query returned no usable data.
    #[error("External lookup empty: {what}")]
    ExternalLookupEmpty {
        /// What was looked up and found empty
        what: String,
    },

    /// Publishing to the portal was requested but no bot credentials
    /// are configured.
    #[error("Portal publishing requested but no credentials configured")]
    MissingCredentials,

    /// A read query against a graph endpoint failed.
    #[error("Query failure: {0}")]
    Query(#[from] ClientError),
}

impl ExportError {
    /// Create a missing-answer error.
    #[must_use]
    pub fn missing_answer(field: impl Into<String>) -> Self {
        Self::MissingRequiredAnswer { field: field.into() }
    }

    /// Create a missing-entity error.
    #[must_use]
    pub fn missing_entity(category: Category, index: usize, detail: impl Into<String>) -> Self {
        Self::MissingRequiredEntity { category, index, detail: detail.into() }
    }

    /// Create an empty-lookup error.
    #[must_use]
    pub fn lookup_empty(what: impl Into<String>) -> Self {
        Self::ExternalLookupEmpty { what: what.into() }
    }

    /// Convert to a user-friendly message for the CLI.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::MissingRequiredAnswer { field } => {
                format!("Please answer the '{field}' question before exporting.")
            }
            Self::MissingRequiredEntity { category, index, detail } => {
                format!(
                    "The {category} entry #{n} cannot be integrated: {detail}.",
                    n = index + 1
                )
            }
            Self::DuplicateWorkflow { title } => {
                format!(
                    "A workflow titled \"{title}\" with the same research objective \
                     already exists on the portal. Nothing was created."
                )
            }
            Self::MissingCredentials => {
                "Portal publishing needs bot credentials; set them via \
                 WKG_BOT_USER / WKG_BOT_PASSWORD."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for run-level operations.
pub type ExportResult<T> = Result<T, ExportError>;
