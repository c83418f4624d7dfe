//! Error taxonomy and JSON-RPC error codes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::registry::{CapabilityKind, RegistryError};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server-defined error codes.
pub mod mcp_error_codes {
    pub const AMBIGUOUS_MATCH: i32 = -32850;
    pub const TIMEOUT: i32 = -32851;
    /// Missing or invalid bearer token (HTTP only).
    pub const UNAUTHORIZED: i32 = -32900;
}

/// The kind tag carried in every error object's `data.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    CapabilityNotFound,
    InvalidArguments,
    HandlerError,
    AmbiguousMatch,
    Timeout,
    Unauthorized,
    InternalError,
}

impl ErrorKind {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            ErrorKind::ParseError => PARSE_ERROR,
            ErrorKind::InvalidRequest => INVALID_REQUEST,
            ErrorKind::MethodNotFound | ErrorKind::CapabilityNotFound => METHOD_NOT_FOUND,
            ErrorKind::InvalidArguments => INVALID_PARAMS,
            ErrorKind::HandlerError | ErrorKind::InternalError => INTERNAL_ERROR,
            ErrorKind::AmbiguousMatch => AMBIGUOUS_MATCH,
            ErrorKind::Timeout => TIMEOUT,
            ErrorKind::Unauthorized => UNAUTHORIZED,
        }
    }

    /// Best-effort kind for an error object that carries no `data.kind`.
    pub fn from_code(code: i32) -> Self {
        use error_codes::*;
        use mcp_error_codes::*;
        match code {
            PARSE_ERROR => ErrorKind::ParseError,
            INVALID_REQUEST => ErrorKind::InvalidRequest,
            METHOD_NOT_FOUND => ErrorKind::MethodNotFound,
            INVALID_PARAMS => ErrorKind::InvalidArguments,
            AMBIGUOUS_MATCH => ErrorKind::AmbiguousMatch,
            TIMEOUT => ErrorKind::Timeout,
            UNAUTHORIZED => ErrorKind::Unauthorized,
            _ => ErrorKind::InternalError,
        }
    }
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("{kind} not found: {key}")]
    CapabilityNotFound { kind: CapabilityKind, key: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Handler error: {0}")]
    HandlerError(String),

    #[error("Ambiguous resource URI {uri}: matches {}", .candidates.join(", "))]
    AmbiguousMatch { uri: String, candidates: Vec<String> },

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Registry error: {0}")]
    Registry(RegistryError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            McpError::ParseError(_) | McpError::Json(_) => ErrorKind::ParseError,
            McpError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            McpError::MethodNotFound(_) => ErrorKind::MethodNotFound,
            McpError::CapabilityNotFound { .. } => ErrorKind::CapabilityNotFound,
            McpError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            McpError::HandlerError(_) => ErrorKind::HandlerError,
            McpError::AmbiguousMatch { .. } => ErrorKind::AmbiguousMatch,
            McpError::Timeout(_) => ErrorKind::Timeout,
            McpError::Unauthorized => ErrorKind::Unauthorized,
            McpError::InternalError(_)
            | McpError::Registry(_)
            | McpError::Transport(_)
            | McpError::Io(_) => ErrorKind::InternalError,
        }
    }

    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Caller-facing error object. I/O and transport details stay in the logs.
    pub fn to_error_object(&self) -> crate::types::JsonRpcErrorObject {
        let message = match self {
            McpError::Io(_) | McpError::Transport(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        crate::types::JsonRpcErrorObject {
            code: self.code(),
            message,
            data: Some(json!({ "kind": self.kind() })),
        }
    }
}

impl From<RegistryError> for McpError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound { kind, key } => McpError::CapabilityNotFound { kind, key },
            RegistryError::AmbiguousMatch { uri, candidates } => {
                McpError::AmbiguousMatch { uri, candidates }
            }
            other => McpError::Registry(other),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
