//! Error types
//!
//! Every fallible operation in the runtime returns [`Error`]. The variants follow
//! the layers a call can fail in: contract errors are raised before any I/O,
//! transport errors come straight from `reqwest`, parse errors mean the server
//! answered with something that is not a valid envelope, and business errors
//! carry the decoded error envelope as an [`ApiError`].

use crate::action::Action;
use crate::codec::Namespace;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource has no route for this action. Raised before any network call.
    #[error("action {action} is not supported by resource {resource}")]
    Unsupported { action: Action, resource: String },

    /// Action name outside the registry.
    #[error("unsupported action '{0}'")]
    UnknownAction(String),

    /// A body was passed with an action that never carries one.
    #[error("action {0} does not accept a body")]
    BodyNotAllowed(Action),

    /// A multi-result envelope came back for a resource without the list capability.
    #[error("resource {0} does not support list decoding")]
    NotListable(String),

    /// A count was requested from a resource without the countable-list capability.
    #[error("resource {0} does not support counting")]
    NotCountable(String),

    /// Page limit outside `1..=max`.
    #[error("invalid page limit {limit} (must be between 1 and {max})")]
    InvalidPageLimit { limit: u32, max: u32 },

    /// Search parameters could not be turned into a query string.
    #[error("failed to encode search parameters: {0}")]
    Query(String),

    /// A value could not be encoded or decoded for a tag namespace.
    #[error("{namespace} codec error: {message}")]
    Codec {
        namespace: Namespace,
        message: String,
    },

    /// Persisted document framing failed.
    #[error("frame error: {0}")]
    Frame(String),

    /// Connection, TLS or timeout failure below the protocol layer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not a valid envelope.
    #[error("failed to parse response (HTTP {status}): {source}")]
    Parse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The envelope parsed but its shape does not fit the call.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Well-formed error envelope returned with a status >= 400.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Invalid endpoint or client settings.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The watch was cancelled through its token (or the token's deadline passed).
    #[error("watch cancelled")]
    Cancelled,

    /// The watch timeout elapsed before the step reported completion.
    #[error("watch timed out after {0:?}")]
    WatchTimeout(Duration),
}

impl Error {
    pub(crate) fn codec(namespace: Namespace, message: impl fmt::Display) -> Self {
        Self::Codec {
            namespace,
            message: message.to_string(),
        }
    }

    /// Business error payload, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// True for errors raised before any request left the process.
    pub fn is_contract(&self) -> bool {
        matches!(
            self,
            Self::Unsupported { .. }
                | Self::UnknownAction(_)
                | Self::BodyNotAllowed(_)
                | Self::NotListable(_)
                | Self::NotCountable(_)
                | Self::InvalidPageLimit { .. }
                | Self::Query(_)
        )
    }
}

/// One `(code, attribute)` pair from an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub attribute: String,
}

/// Coarse classification of a business error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Auth,
    InvalidSchema,
    NotFound,
    RateLimited,
    Server,
    GatewayTimeout,
    Other,
}

/// Decoded error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub request_id: String,
    pub error_type: String,
    pub message: String,
    pub details: Vec<ErrorDetail>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {} ({})", self.status, self.error_type)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if !self.request_id.is_empty() {
            write!(f, " [request_id={}]", self.request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Find a detail by code and, optionally, attribute. Returns the attribute name.
    pub fn find_detail(&self, code: &str, attribute: Option<&str>) -> Option<&str> {
        self.details
            .iter()
            .find(|d| d.code == code && attribute.map_or(true, |a| d.attribute == a))
            .map(|d| d.attribute.as_str())
    }

    /// Invalid or expired access token.
    pub fn is_auth_error(&self) -> Option<&str> {
        self.find_detail("invalid", Some("access_token"))
    }

    /// Missing resource; returns the attribute that could not be resolved.
    pub fn is_not_found(&self) -> Option<&str> {
        self.find_detail("not_found", None)
    }

    /// Request body rejected by the server schema.
    pub fn is_invalid_schema(&self) -> Option<&str> {
        self.find_detail("invalid", Some("schema"))
    }

    pub fn kind(&self) -> ApiErrorKind {
        if self.is_auth_error().is_some() || self.status == 401 {
            return ApiErrorKind::Auth;
        }
        if self.is_invalid_schema().is_some() {
            return ApiErrorKind::InvalidSchema;
        }
        if self.is_not_found().is_some() || self.status == 404 {
            return ApiErrorKind::NotFound;
        }
        match self.status {
            429 => ApiErrorKind::RateLimited,
            504 => ApiErrorKind::GatewayTimeout,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Other,
        }
    }
}

/// Auth-failure predicate over any runtime error.
pub fn is_auth_error(err: &Error) -> Option<&str> {
    err.api().and_then(ApiError::is_auth_error)
}

/// Not-found predicate over any runtime error.
pub fn is_not_found(err: &Error) -> Option<&str> {
    err.api().and_then(ApiError::is_not_found)
}

/// Schema-invalid predicate over any runtime error.
pub fn is_invalid_schema(err: &Error) -> Option<&str> {
    err.api().and_then(ApiError::is_invalid_schema)
}

/// Format an error for display to an end user.
/// Keeps the message short and avoids echoing raw server payloads.
pub fn format_error(err: &Error) -> String {
    match err {
        Error::Api(api) => match api.kind() {
            ApiErrorKind::Auth => "Authentication failed. Check your access token.".to_string(),
            ApiErrorKind::InvalidSchema => {
                "Invalid request. The payload was rejected by the server schema.".to_string()
            },
            ApiErrorKind::NotFound => match api.is_not_found() {
                Some(attr) if !attr.is_empty() => format!("Resource not found ({}).", attr),
                _ => "Resource not found.".to_string(),
            },
            ApiErrorKind::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
            ApiErrorKind::GatewayTimeout => "Gateway timeout. Please try again.".to_string(),
            ApiErrorKind::Server => "Service temporarily unavailable. Please try again.".to_string(),
            ApiErrorKind::Other => truncate(&api.to_string(), 80),
        },
        Error::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        },
        Error::Cancelled => "Cancelled.".to_string(),
        Error::WatchTimeout(d) => format!("Timed out after {}s.", d.as_secs()),
        other => truncate(&other.to_string(), 80),
    }
}

fn truncate(s: &str, max: usize) -> String {
    let mut visible = s.chars().filter(|c| !c.is_control());
    let sanitized: String = visible.by_ref().take(max).collect();
    if visible.next().is_some() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
