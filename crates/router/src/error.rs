//! Error types shared by the router crate.
//!
//! Pattern problems are reported as [`PatternError`] when a template is compiled, and
//! wrapped into [`Error::Route`] by the registration methods so the caller knows which
//! method and template failed. Everything else that can go wrong while a request is
//! served is an [`Error`] variant.

use http::header::InvalidHeaderValue;
use http::{Method, StatusCode};
use std::io;
use thiserror::Error;

/// Errors raised while compiling a route template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid route, needs to start with a forward slash")]
    MissingLeadingSlash,

    #[error("parameters can only directly follow a forward slash (byte {position})")]
    InvalidParamLocation { position: usize },

    #[error("wildcards can only directly follow a forward slash (byte {position})")]
    InvalidWildcardLocation { position: usize },

    #[error("wildcard routes cannot have any additional characters following the asterisk")]
    InvalidWildcardRoute,

    #[error("parameter at byte {position} has no name")]
    MissingParamName { position: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("error creating route for [{method}] \"{pattern}\": {source}")]
    Route {
        method: Method,
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("cannot perform write actions on a closed context")]
    ContextClosed,

    #[error("invalid payload for an error response with status {status}, expected an error or a list of errors")]
    InvalidErrorPayload { status: StatusCode },

    #[error("response carried errors: {}", .messages.join(", "))]
    Envelope { messages: Vec<String> },

    #[error("invalid header value: {source}")]
    InvalidHeader {
        #[from]
        source: InvalidHeaderValue,
    },

    #[error("json error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("form error: {source}")]
    Form {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl Error {
    pub fn route<S: ToString>(method: Method, pattern: S, source: PatternError) -> Self {
        Self::Route { method, pattern: pattern.to_string(), source }
    }

    pub fn envelope<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self::Envelope { messages: messages.into_iter().map(|m| m.to_string()).collect() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if this is the write-after-completion condition.
    pub fn is_context_closed(&self) -> bool {
        matches!(self, Self::ContextClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, PatternError};
    use http::Method;

    #[test]
    fn test_route_error_message() {
        let err = Error::route(Method::GET, "users", PatternError::MissingLeadingSlash);
        assert_eq!(
            err.to_string(),
            "error creating route for [GET] \"users\": invalid route, needs to start with a forward slash"
        );
    }

    #[test]
    fn test_envelope_error_joins_messages() {
        let err = Error::envelope(["first", "second"]);
        assert_eq!(err.to_string(), "response carried errors: first, second");
    }

    #[test]
    fn test_context_closed() {
        assert!(Error::ContextClosed.is_context_closed());
        assert!(!Error::io(std::io::ErrorKind::BrokenPipe).is_context_closed());
    }
}
