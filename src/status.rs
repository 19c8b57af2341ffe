//! The closed set of gRPC status codes, plus the HTTP/2 and HTTP status
//! mappings used to translate transport-level failures into gRPC status.

use std::fmt;

/// A gRPC status code. The discriminants are fixed by the gRPC wire
/// protocol (0..=16) and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

const ALL: [Status; 17] = [
    Status::Ok,
    Status::Cancelled,
    Status::Unknown,
    Status::InvalidArgument,
    Status::DeadlineExceeded,
    Status::NotFound,
    Status::AlreadyExists,
    Status::PermissionDenied,
    Status::ResourceExhausted,
    Status::FailedPrecondition,
    Status::Aborted,
    Status::OutOfRange,
    Status::Unimplemented,
    Status::Internal,
    Status::Unavailable,
    Status::DataLoss,
    Status::Unauthenticated,
];

/// HTTP/2 RST_STREAM / GOAWAY error codes relevant to gRPC status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Http2ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xA,
    EnhanceYourCalm = 0xB,
    InadequateSecurity = 0xC,
    Http11Required = 0xD,
}

impl Http2ErrorCode {
    /// Parses a raw HTTP/2 error code. Unknown codes have no mapping either,
    /// so this simply returns `None`, mirroring [`Status::from_http2_error`].
    pub fn from_u32(code: u32) -> Option<Self> {
        Some(match code {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xA => Self::ConnectError,
            0xB => Self::EnhanceYourCalm,
            0xC => Self::InadequateSecurity,
            0xD => Self::Http11Required,
            _ => return None,
        })
    }
}

impl Status {
    /// Looks up a status by its numeric code. Returns `None` for any value
    /// outside `0..=16` — this is a normal, expected outcome, not an error.
    pub fn from_code(code: u32) -> Option<Self> {
        ALL.get(code as usize).copied()
    }

    /// The numeric gRPC status code.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Maps an HTTP/2 stream-error code onto the gRPC status it signals,
    /// per the fixed table in the gRPC-over-HTTP2 spec. `STREAM_CLOSED` and
    /// `HTTP_1_1_REQUIRED` intentionally have no mapping: they should
    /// propagate to the caller rather than being coerced into a status.
    pub fn from_http2_error(code: Http2ErrorCode) -> Option<Self> {
        use Http2ErrorCode::*;
        Some(match code {
            Cancel => Status::Cancelled,
            RefusedStream => Status::Unavailable,
            EnhanceYourCalm => Status::ResourceExhausted,
            InadequateSecurity => Status::PermissionDenied,
            NoError | ProtocolError | InternalError | FlowControlError | SettingsTimeout
            | FrameSizeError | CompressionError | ConnectError => Status::Internal,
            StreamClosed | Http11Required => return None,
        })
    }

    /// Maps an HTTP status code onto a gRPC status. Used only by the error
    /// mapper when an `HttpError` reaches the adapter boundary.
    pub fn from_http_status(code: u16) -> Self {
        match code {
            400 => Status::Internal,
            401 => Status::Unauthenticated,
            403 => Status::PermissionDenied,
            404 => Status::Unimplemented,
            429 | 502 | 503 | 504 => Status::Unavailable,
            _ => Status::Unknown,
        }
    }

    /// Formats the status code as the ASCII-decimal `grpc-status` header
    /// value.
    pub fn to_header_value(self) -> http::HeaderValue {
        http::HeaderValue::from_str(&self.code().to_string())
            .expect("decimal ASCII digits are always a valid header value")
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::Cancelled => "CANCELLED",
            Status::Unknown => "UNKNOWN",
            Status::InvalidArgument => "INVALID_ARGUMENT",
            Status::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Status::NotFound => "NOT_FOUND",
            Status::AlreadyExists => "ALREADY_EXISTS",
            Status::PermissionDenied => "PERMISSION_DENIED",
            Status::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Status::FailedPrecondition => "FAILED_PRECONDITION",
            Status::Aborted => "ABORTED",
            Status::OutOfRange => "OUT_OF_RANGE",
            Status::Unimplemented => "UNIMPLEMENTED",
            Status::Internal => "INTERNAL",
            Status::Unavailable => "UNAVAILABLE",
            Status::DataLoss => "DATA_LOSS",
            Status::Unauthenticated => "UNAUTHENTICATED",
        };
        write!(f, "{name}({})", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_total_on_closed_range() {
        for c in 0..=16u32 {
            assert!(Status::from_code(c).is_some(), "code {c} should map");
        }
        assert_eq!(Status::from_code(17), None);
        assert_eq!(Status::from_code(9999), None);
    }

    #[test]
    fn code_values_match_spec() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::Cancelled.code(), 1);
        assert_eq!(Status::Unauthenticated.code(), 16);
    }

    #[test]
    fn http2_error_mapping() {
        assert_eq!(
            Status::from_http2_error(Http2ErrorCode::Cancel),
            Some(Status::Cancelled)
        );
        assert_eq!(
            Status::from_http2_error(Http2ErrorCode::RefusedStream),
            Some(Status::Unavailable)
        );
        assert_eq!(
            Status::from_http2_error(Http2ErrorCode::EnhanceYourCalm),
            Some(Status::ResourceExhausted)
        );
        assert_eq!(
            Status::from_http2_error(Http2ErrorCode::InadequateSecurity),
            Some(Status::PermissionDenied)
        );
        assert_eq!(
            Status::from_http2_error(Http2ErrorCode::InternalError),
            Some(Status::Internal)
        );
        assert_eq!(Status::from_http2_error(Http2ErrorCode::StreamClosed), None);
        assert_eq!(Status::from_http2_error(Http2ErrorCode::Http11Required), None);
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(Status::from_http_status(400), Status::Internal);
        assert_eq!(Status::from_http_status(401), Status::Unauthenticated);
        assert_eq!(Status::from_http_status(403), Status::PermissionDenied);
        assert_eq!(Status::from_http_status(404), Status::Unimplemented);
        assert_eq!(Status::from_http_status(429), Status::Unavailable);
        assert_eq!(Status::from_http_status(502), Status::Unavailable);
        assert_eq!(Status::from_http_status(503), Status::Unavailable);
        assert_eq!(Status::from_http_status(504), Status::Unavailable);
        assert_eq!(Status::from_http_status(418), Status::Unknown);
    }

    #[test]
    fn header_value_round_trips_decimal() {
        let hv = Status::NotFound.to_header_value();
        assert_eq!(hv.to_str().unwrap(), "5");
    }
}
