use sd_datastore::DatastoreError;
use thiserror::Error;

/// Maximum number of characters of an HTTP error body kept in an error
pub(crate) const BODY_SNIPPET_LEN: usize = 200;

pub(crate) fn body_snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}

/// Snap store session error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("Invalid token from the login exchange: {0}")]
    InvalidToken(String),

    #[error("Store session could not be cached: {0}")]
    Persistence(#[source] DatastoreError),

    #[error("No cached store session - login required")]
    NoSession,

    #[error("Cached store session is unusable: {reason}")]
    CorruptSession { reason: String },

    #[error("Catalog query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Catalog response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid store configuration: {0}")]
    Config(String),
}

/// Classified login failures
///
/// Message texts never include the submitted credentials.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing required login field: {0}")]
    MissingField(&'static str),

    #[error("Provided email/password is not correct")]
    InvalidCredentials,

    #[error("Two-factor authentication required - supply a one-time code")]
    TwoFactorRequired,

    #[error("The one-time code was not accepted")]
    TwoFactorFailed,

    #[error("Account is suspended")]
    AccountSuspended,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Login data was rejected: {0}")]
    InvalidData(String),

    #[error("Unknown login error code: {0}")]
    Unknown(String),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AuthError {
    /// Map the `code` field of a login error response
    pub fn from_code(code: &str, message: Option<&str>) -> Self {
        match code {
            "INVALID_CREDENTIALS" => Self::InvalidCredentials,
            "TWOFACTOR_REQUIRED" => Self::TwoFactorRequired,
            "TWOFACTOR_FAILURE" => Self::TwoFactorFailed,
            "ACCOUNT_SUSPENDED" => Self::AccountSuspended,
            "ACCOUNT_DEACTIVATED" => Self::AccountDeactivated,
            "INVALID_DATA" => Self::InvalidData(message.unwrap_or("invalid request").to_string()),
            code => Self::Unknown(code.to_string()),
        }
    }
}

/// Catalog request failures
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
}

impl QueryError {
    /// HTTP status returned by the store, if the request got that far
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Network(e) => e.status(),
            Self::Http { status, .. } => Some(*status),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
