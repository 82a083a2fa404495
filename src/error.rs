use thiserror::Error;

use crate::http::status::HttpStatus;

/// Inbound content type is absent or not allow-listed. Always rendered as 415.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("request declares no content type")]
    Missing,

    #[error("content type `{0}` is not accepted")]
    Unsupported(String),
}

/// Route table misses. Rendered as 404 / 405.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("no handler registered for `{path}`")]
    NotFound { path: String },

    #[error("handler for `{path}` does not accept {method}")]
    MethodNotAllowed { path: String, method: String },
}

impl RouteError {
    pub fn status(&self) -> HttpStatus {
        match self {
            RouteError::NotFound { .. } => HttpStatus::NotFound,
            RouteError::MethodNotAllowed { .. } => HttpStatus::MethodNotAllowed,
        }
    }
}

/// A handler's response could not be encoded.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("unsupported response content type `{0}`")]
    UnsupportedContentType(String),

    #[error("{body} body cannot be encoded as `{content_type}`")]
    BodyMismatch {
        content_type: String,
        body: &'static str,
    },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure while reading the request body.
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("I/O error while reading body: {0}")]
    Io(#[from] std::io::Error),

    #[error("body exceeds the limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raised by an endpoint operation; fatal for the dispatch.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("invalid payload: {0}")]
    Payload(String),

    #[error("{0}")]
    Internal(String),
}

/// A middleware stage aborted the pipeline.
#[derive(Error, Debug)]
#[error("middleware `{stage}` aborted: {message}")]
pub struct MiddlewareError {
    pub stage: String,
    pub message: String,
}

impl MiddlewareError {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced to the hosting gateway. No reply is started when one occurs.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Middleware(#[from] MiddlewareError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("allowed_content_types must not be empty")]
    EmptyAllowList,

    #[error("a handler is already registered for `{0}`")]
    DuplicateRoute(String),

    #[error("route path `{0}` must start with `/`")]
    InvalidPath(String),
}
