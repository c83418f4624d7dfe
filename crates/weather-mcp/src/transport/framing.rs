//! Newline-delimited JSON framing.

use serde_json::Value;

use crate::dispatch::Response;
use crate::types::{JsonRpcMessage, McpError, McpResult, RequestId};

/// Decode one line. Invalid JSON is a parse error; well-formed JSON that
/// is not a JSON-RPC message is an invalid request, answered with the
/// message's `id` when it has a usable one. A message carrying an `id`
/// that is neither an integer nor a string is never treated as a
/// notification.
pub fn parse_message(line: &str) -> Result<JsonRpcMessage, (RequestId, McpError)> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err((
            RequestId::Null,
            McpError::ParseError("Empty message".to_string()),
        ));
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| (RequestId::Null, McpError::ParseError(e.to_string())))?;

    let has_id = value.get("id").is_some();
    let id = value
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value(id).ok())
        .unwrap_or(RequestId::Null);

    let invalid = |id, reason: &str| (id, McpError::InvalidRequest(reason.to_string()));
    match serde_json::from_value(value) {
        Ok(JsonRpcMessage::Notification(_)) if has_id => {
            Err(invalid(RequestId::Null, "Request id must be an integer or a string"))
        }
        Ok(message) => Ok(message),
        Err(_) => Err(invalid(id, "Not a JSON-RPC 2.0 message")),
    }
}

/// Encode a response as one line, trailing newline included.
pub fn frame_response(response: &Response) -> McpResult<String> {
    let mut json = serde_json::to_string(&response.to_message()).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}

/// Decode a line written by [`frame_response`].
pub fn decode_response(line: &str) -> McpResult<Response> {
    let message: JsonRpcMessage =
        serde_json::from_str(line.trim()).map_err(|e| McpError::ParseError(e.to_string()))?;
    Response::from_message(message)
        .ok_or_else(|| McpError::InvalidRequest("Line is not a response".to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::ErrorKind;

    #[test]
    fn invalid_json_is_a_parse_error() {
        let (id, err) = parse_message("{not json").unwrap_err();
        assert_eq!(id, RequestId::Null);
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn non_message_json_keeps_its_id() {
        let (id, err) = parse_message(r#"{"id": 9, "hello": "world"}"#).unwrap_err();
        assert_eq!(id, RequestId::Number(9));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn unusable_id_is_not_a_notification() {
        for line in [
            r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":{"n":1},"method":"ping"}"#,
        ] {
            let (id, err) = parse_message(line).unwrap_err();
            assert_eq!(id, RequestId::Null, "{line}");
            assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{line}");
        }
    }

    #[test]
    fn request_and_notification_are_told_apart() {
        let req = parse_message(r#"{"jsonrpc":"2.0","id":"a","method":"ping"}"#).unwrap();
        assert!(matches!(req, JsonRpcMessage::Request(_)));

        let note = parse_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .unwrap();
        assert!(matches!(note, JsonRpcMessage::Notification(_)));
    }

    #[test]
    fn framed_response_is_one_line() {
        let resp = Response::success(RequestId::Number(1), json!({"text": "a\nb"}));
        let framed = frame_response(&resp).unwrap();
        assert!(framed.ends_with('\n'));
        assert_eq!(framed.matches('\n').count(), 1);
    }

    #[test]
    fn responses_survive_encode_and_decode() {
        let ok = Response::success(
            RequestId::String("req-1".to_string()),
            json!({"city": "Tokyo", "temperature": 21, "tags": [1, 2.5, null]}),
        );
        let err = Response::from_error(
            RequestId::Number(7),
            &McpError::InvalidArguments("Missing required argument 'city'".to_string()),
        );

        for original in [ok, err] {
            let line = frame_response(&original).unwrap();
            assert_eq!(decode_response(&line).unwrap(), original);
        }
    }
}
