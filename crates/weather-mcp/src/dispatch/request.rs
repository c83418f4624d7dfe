//! Decoded capability calls and their responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{Arguments, CapabilityKind};
use crate::types::{
    ErrorKind, JsonRpcError, JsonRpcErrorObject, JsonRpcMessage, JsonRpcResponse, McpError,
    RequestId,
};

/// One capability invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub kind: CapabilityKind,
    /// Tool or prompt name, or resource URI.
    pub target: String,
    pub arguments: Arguments,
}

impl Request {
    pub fn new(id: RequestId, kind: CapabilityKind, target: &str, arguments: Arguments) -> Self {
        Self {
            id,
            kind,
            target: target.to_string(),
            arguments,
        }
    }

    pub fn tool(id: impl Into<RequestId>, name: &str, arguments: Arguments) -> Self {
        Self::new(id.into(), CapabilityKind::Tool, name, arguments)
    }

    pub fn resource(id: impl Into<RequestId>, uri: &str) -> Self {
        Self::new(id.into(), CapabilityKind::Resource, uri, Arguments::new())
    }

    pub fn prompt(id: impl Into<RequestId>, name: &str, arguments: Arguments) -> Self {
        Self::new(id.into(), CapabilityKind::Prompt, name, arguments)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub kind: ErrorKind,
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Error(ResponseError),
}

/// A response tagged with the id of the request it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: RequestId,
    pub outcome: Outcome,
}

impl Response {
    pub fn success(id: RequestId, value: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Success(value),
        }
    }

    pub fn from_error(id: RequestId, error: &McpError) -> Self {
        let object = error.to_error_object();
        Self {
            id,
            outcome: Outcome::Error(ResponseError {
                kind: error.kind(),
                code: object.code,
                message: object.message,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Error(e) => Some(e.kind),
            Outcome::Success(_) => None,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }

    pub fn to_message(&self) -> JsonRpcMessage {
        match &self.outcome {
            Outcome::Success(value) => {
                JsonRpcMessage::Response(JsonRpcResponse::new(self.id.clone(), value.clone()))
            }
            Outcome::Error(err) => JsonRpcMessage::Error(JsonRpcError::new(
                self.id.clone(),
                JsonRpcErrorObject {
                    code: err.code,
                    message: err.message.clone(),
                    data: Some(serde_json::json!({ "kind": err.kind })),
                },
            )),
        }
    }

    /// Recover a response from a decoded message. Requests and
    /// notifications yield `None`.
    pub fn from_message(message: JsonRpcMessage) -> Option<Self> {
        match message {
            JsonRpcMessage::Response(resp) => Some(Self::success(resp.id, resp.result)),
            JsonRpcMessage::Error(err) => {
                let kind = err
                    .error
                    .data
                    .as_ref()
                    .and_then(|d| d.get("kind"))
                    .and_then(|k| serde_json::from_value(k.clone()).ok())
                    .unwrap_or_else(|| ErrorKind::from_code(err.error.code));
                Some(Self {
                    id: err.id,
                    outcome: Outcome::Error(ResponseError {
                        kind,
                        code: err.error.code,
                        message: err.error.message,
                    }),
                })
            }
            JsonRpcMessage::Request(_) | JsonRpcMessage::Notification(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self.to_message()).unwrap_or_default()
    }
}
