use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error_codes;
use crate::types::RequestId;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParseError,
    ParseEncodingError,
    ParseCharacterEncodingError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ApplicationError,
    SystemError,
    TransportError,
    SerializationError,
    /// Application-supplied code outside the enumerated set
    Custom(i32),
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            ErrorCode::ParseError => error_codes::PARSE_ERROR,
            ErrorCode::ParseEncodingError => error_codes::PARSE_ENCODING_ERROR,
            ErrorCode::ParseCharacterEncodingError => error_codes::PARSE_CHARACTER_ENCODING_ERROR,
            ErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            ErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            ErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            ErrorCode::ApplicationError => error_codes::APPLICATION_ERROR,
            ErrorCode::SystemError => error_codes::SYSTEM_ERROR,
            ErrorCode::TransportError => error_codes::TRANSPORT_ERROR,
            ErrorCode::SerializationError => error_codes::SERIALIZATION_ERROR,
            ErrorCode::Custom(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::ParseEncodingError => "Parse error: Unsupported encoding",
            ErrorCode::ParseCharacterEncodingError => {
                "Parse error: Unsupported character for encoding"
            }
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ApplicationError => "Application error",
            ErrorCode::SystemError => "System error",
            ErrorCode::TransportError => "Transport error",
            ErrorCode::SerializationError => "Error serializing response.",
            ErrorCode::Custom(_) => "Server error",
        }
    }
}

impl From<i32> for ErrorCode {
    /// Maps a raw wire code onto the enumerated set. `0` means "unset" and is
    /// normalised to [`ErrorCode::ApplicationError`].
    fn from(code: i32) -> Self {
        match code {
            0 => ErrorCode::ApplicationError,
            error_codes::PARSE_ERROR => ErrorCode::ParseError,
            error_codes::PARSE_ENCODING_ERROR => ErrorCode::ParseEncodingError,
            error_codes::PARSE_CHARACTER_ENCODING_ERROR => ErrorCode::ParseCharacterEncodingError,
            error_codes::INVALID_REQUEST => ErrorCode::InvalidRequest,
            error_codes::METHOD_NOT_FOUND => ErrorCode::MethodNotFound,
            error_codes::INVALID_PARAMS => ErrorCode::InvalidParams,
            error_codes::INTERNAL_ERROR => ErrorCode::InternalError,
            error_codes::APPLICATION_ERROR => ErrorCode::ApplicationError,
            error_codes::SYSTEM_ERROR => ErrorCode::SystemError,
            error_codes::TRANSPORT_ERROR => ErrorCode::TransportError,
            error_codes::SERIALIZATION_ERROR => ErrorCode::SerializationError,
            other => ErrorCode::Custom(other),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A protocol error correlated (where possible) with the call that raised it.
///
/// Immutable once built: the `with_*` methods consume the value and return a
/// new one. `correlation_id` lets a failure raised halfway through decoding a
/// call still be attributed to the id parsed before it.
#[derive(Debug, Clone)]
pub struct RpcError {
    code: ErrorCode,
    message: String,
    cause: Option<Cause>,
    correlation_id: Option<RequestId>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let code = match code {
            ErrorCode::Custom(0) => ErrorCode::ApplicationError,
            other => other,
        };
        Self {
            code,
            message: message.into(),
            cause: None,
            correlation_id: None,
        }
    }

    /// Build from a raw integer code; `0` becomes `APPLICATION_ERROR`.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::from(code), message)
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn with_correlation_id(mut self, id: Option<RequestId>) -> Self {
        self.correlation_id = id;
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found() -> Self {
        Self::new(ErrorCode::MethodNotFound, ErrorCode::MethodNotFound.message())
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApplicationError, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn correlation_id(&self) -> Option<&RequestId> {
        self.correlation_id.as_ref()
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Conversion of handler failures into protocol errors.
///
/// The default maps any error onto `APPLICATION_ERROR` carrying its display
/// text. Error types that know a more specific protocol code override it.
pub trait ToRpcError: fmt::Display + Send + Sync + 'static {
    fn to_rpc_error(&self) -> RpcError {
        RpcError::application(self.to_string())
    }
}

impl ToRpcError for RpcError {
    fn to_rpc_error(&self) -> RpcError {
        self.clone()
    }
}

/// Failures raised while turning raw bytes into a JSON value
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("unpaired UTF-16 surrogate escape at byte {offset}")]
    LoneSurrogate { offset: usize },

    #[error("payload nesting exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("JSON syntax error: {0}")]
    Syntax(#[from] serde_json::Error),
}

impl From<DecodeError> for RpcError {
    fn from(err: DecodeError) -> Self {
        let rpc = match &err {
            DecodeError::Encoding(_) | DecodeError::LoneSurrogate { .. } => RpcError::new(
                ErrorCode::ParseCharacterEncodingError,
                "Error decoding JSON: Unsupported character for encoding.",
            ),
            DecodeError::DepthExceeded { .. } => {
                RpcError::invalid_request("Invalid Request: Exceeded maximum parameter depth.")
            }
            DecodeError::Syntax(_) => RpcError::parse_error("Error decoding JSON."),
        };
        rpc.with_cause(err)
    }
}

/// Failures raised while populating a router at startup
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("declared method '{0}' already present in map")]
    Duplicate(String),
}

impl From<RouteError> for RpcError {
    fn from(err: RouteError) -> Self {
        RpcError::application("Duplicate method declaration").with_cause(err)
    }
}
