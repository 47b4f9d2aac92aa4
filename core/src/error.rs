//! Error types for the SpamWatch client.
//!
//! # Design
//! `ApiError` is the status taxonomy: one variant per status code the API
//! documents, each carrying the raw `HttpResponse`. `Error` is what every
//! client method returns and keeps failures outside that taxonomy (transport,
//! JSON encode/decode) in separate variants, so fallback-wrapped calls can
//! swallow `Error::Api` and still propagate everything else.

use serde_json::Value;

use crate::http::HttpResponse;

/// Discriminant for every failure the client can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    TooManyRequests,
    ServerError,
    Transport,
    Serialization,
    Deserialization,
}

/// A non-success status returned by the API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400: the request payload was rejected.
    #[error("bad request: {body}")]
    BadRequest { response: HttpResponse, body: Value },

    /// 401: the token is missing, unknown or retired.
    #[error("Invalid token")]
    Unauthorized { response: HttpResponse },

    /// 403: the token lacks the permission the endpoint requires.
    #[error("token is not allowed to access this resource")]
    Forbidden { response: HttpResponse, token: String },

    /// 404
    #[error("resource not found")]
    NotFound { response: HttpResponse },

    /// 429: the body usually holds the rate-limit window.
    #[error("too many requests: {body}")]
    TooManyRequests { response: HttpResponse, body: Value },

    /// 500
    #[error("api.spamwat.ch Internal Server Error")]
    ServerError { response: HttpResponse },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest { .. } => ErrorKind::BadRequest,
            ApiError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ApiError::Forbidden { .. } => ErrorKind::Forbidden,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::TooManyRequests { .. } => ErrorKind::TooManyRequests,
            ApiError::ServerError { .. } => ErrorKind::ServerError,
        }
    }

    pub fn response(&self) -> &HttpResponse {
        match self {
            ApiError::BadRequest { response, .. }
            | ApiError::Unauthorized { response }
            | ApiError::Forbidden { response, .. }
            | ApiError::NotFound { response }
            | ApiError::TooManyRequests { response, .. }
            | ApiError::ServerError { response } => response,
        }
    }

    pub fn status(&self) -> u16 {
        self.response().status
    }

    /// Unix timestamp after which a rate-limited token may retry, read from
    /// the `until` field of a 429 body.
    pub fn retry_until(&self) -> Option<i64> {
        match self {
            ApiError::TooManyRequests { body, .. } => body.get("until").and_then(Value::as_i64),
            _ => None,
        }
    }
}

impl ErrorKind {
    /// Status code mapped to this kind, if it is part of the status taxonomy.
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorKind::BadRequest => Some(400),
            ErrorKind::Unauthorized => Some(401),
            ErrorKind::Forbidden => Some(403),
            ErrorKind::NotFound => Some(404),
            ErrorKind::TooManyRequests => Some(429),
            ErrorKind::ServerError => Some(500),
            ErrorKind::Transport | ErrorKind::Serialization | ErrorKind::Deserialization => None,
        }
    }
}

/// Failure reported by a [`Transport`](crate::transport::Transport) before any
/// status code was received.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by `Client` methods.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body did not match the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api(err) => err.kind(),
            Error::Transport(_) => ErrorKind::Transport,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Deserialization(_) => ErrorKind::Deserialization,
        }
    }

    /// True for failures in the status taxonomy, the ones fallback-wrapped
    /// calls recover from.
    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api(_))
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}
