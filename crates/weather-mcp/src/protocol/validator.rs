//! Envelope checks applied before a request is routed.

use crate::types::{JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.trim().is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    if let Some(params) = &request.params {
        if !params.is_object() && !params.is_array() && !params.is_null() {
            return Err(McpError::InvalidRequest(
                "Params must be an object or an array".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_well_formed_request() {
        let req = JsonRpcRequest::new(1, "tools/list", None);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn rejects_wrong_version_and_empty_method() {
        let mut req = JsonRpcRequest::new(1, "ping", None);
        req.jsonrpc = "1.0".to_string();
        assert!(matches!(validate_request(&req), Err(McpError::InvalidRequest(_))));

        let req = JsonRpcRequest::new(1, " ", None);
        assert!(matches!(validate_request(&req), Err(McpError::InvalidRequest(_))));
    }

    #[test]
    fn rejects_scalar_params() {
        let req = JsonRpcRequest::new(1, "tools/call", Some(json!("get_weather")));
        assert!(matches!(validate_request(&req), Err(McpError::InvalidRequest(_))));
    }
}
