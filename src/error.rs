//! Deterministic mapping from errors raised anywhere in an exchange to the
//! `(Status, message)` pair written into trailers.

use crate::status::Status;

/// Every error kind that can reach the [`crate::exchange::GrpcExchange`]
/// boundary: a handler panic/`Err`, a codec failure, an HTTP-layer fault,
/// or an argument-validation failure. This is the single value that
/// crosses the codec/handler error boundary — every other error kind is
/// lifted into it before it reaches the mapper.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The error already carries an explicit gRPC status (e.g. the
    /// handler returned `Err(Status::NotFound)` directly).
    #[error("{status}: {}", message.as_deref().unwrap_or(""))]
    Grpc {
        status: Status,
        message: Option<String>,
    },

    /// An HTTP-layer fault with a status code, to be mapped via
    /// [`Status::from_http_status`].
    #[error("http error {status_code}: {message}")]
    Http { status_code: u16, message: String },

    /// A request failed argument validation before a handler ever ran.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A transport/codec I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else — maps to `UNKNOWN`.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AdapterError {
    pub fn grpc(status: Status, message: impl Into<String>) -> Self {
        Self::Grpc {
            status,
            message: Some(message.into()),
        }
    }

    pub fn grpc_status_only(status: Status) -> Self {
        Self::Grpc { status, message: None }
    }
}

impl From<Status> for AdapterError {
    fn from(status: Status) -> Self {
        Self::grpc_status_only(status)
    }
}

/// Maps an [`AdapterError`] to the `(Status, message)` pair written into
/// trailers, in the precedence order fixed by the core spec:
///
/// 1. explicit gRPC status wins outright;
/// 2. an HTTP-layer error maps through [`Status::from_http_status`];
/// 3. an argument-validation failure is `INVALID_ARGUMENT`;
/// 4. anything else is `UNKNOWN`.
///
/// This function is pure and synchronous — the mapping is deterministic by
/// construction, and is invoked at most once per exchange (subsequent
/// trailer-write failures are logged and swallowed by the exchange, not
/// remapped).
pub fn map_error(error: &AdapterError) -> (Status, Option<String>) {
    match error {
        AdapterError::Grpc { status, message } => (*status, message.clone()),
        AdapterError::Http { status_code, message } => {
            (Status::from_http_status(*status_code), Some(message.clone()))
        }
        AdapterError::InvalidArgument(message) => (Status::InvalidArgument, Some(message.clone())),
        AdapterError::Io(err) => (Status::Unknown, Some(err.to_string())),
        AdapterError::Other(err) => (Status::Unknown, Some(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_grpc_status_wins() {
        let err = AdapterError::grpc(Status::NotFound, "no such row");
        assert_eq!(map_error(&err), (Status::NotFound, Some("no such row".to_string())));
    }

    #[test]
    fn http_error_maps_through_status_table() {
        let err = AdapterError::Http {
            status_code: 403,
            message: "forbidden".into(),
        };
        assert_eq!(map_error(&err), (Status::PermissionDenied, Some("forbidden".to_string())));
    }

    #[test]
    fn invalid_argument_maps_directly() {
        let err = AdapterError::InvalidArgument("missing field `name`".into());
        assert_eq!(
            map_error(&err),
            (Status::InvalidArgument, Some("missing field `name`".to_string()))
        );
    }

    #[test]
    fn unclassified_error_is_unknown() {
        let err: AdapterError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(map_error(&err).0, Status::Unknown);
    }
}
