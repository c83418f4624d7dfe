//! Resolves a request against the registry and runs its handler.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use crate::registry::{CapabilityKind, CapabilityRegistry};
use crate::types::{McpError, McpResult};

use super::request::{Request, Response};
use super::validate::validate_arguments;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Reject arguments the schema does not declare. When false they are
    /// dropped before the handler runs.
    pub strict_arguments: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            strict_arguments: true,
        }
    }
}

/// Stateless dispatcher over a read-only registry. Safe to share across
/// threads and call concurrently.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self::with_config(registry, DispatcherConfig::default())
    }

    pub fn with_config(registry: Arc<CapabilityRegistry>, config: DispatcherConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run one request to completion. Never panics; every failure becomes
    /// an error response carrying the request's id.
    pub fn dispatch(&self, request: Request) -> Response {
        match self.execute(&request) {
            Ok(value) => Response::success(request.id, value),
            Err(e) => {
                tracing::debug!(
                    "{} {} failed (id {}): {e}",
                    request.kind,
                    request.target,
                    request.id
                );
                Response::from_error(request.id, &e)
            }
        }
    }

    fn execute(&self, request: &Request) -> McpResult<Value> {
        let resolved = self.registry.resolve(request.kind, &request.target)?;
        let capability = resolved.capability;

        // Resource arguments come from the URI; bindings win over anything supplied.
        let mut supplied = request.arguments.clone();
        supplied.extend(resolved.bindings);

        let arguments =
            validate_arguments(capability.schema(), &supplied, self.config.strict_arguments)?;

        tracing::debug!("Invoking {} {}", request.kind, capability.key());

        let handler = capability.handler();
        let value = match catch_unwind(AssertUnwindSafe(|| handler(&arguments))) {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => return Err(McpError::HandlerError(e.message().to_string())),
            Err(_) => {
                tracing::error!("Handler for {} {} panicked", request.kind, capability.key());
                return Err(McpError::HandlerError(format!(
                    "{} '{}' failed unexpectedly",
                    request.kind,
                    capability.key()
                )));
            }
        };

        match request.kind {
            CapabilityKind::Tool => Ok(value),
            CapabilityKind::Resource | CapabilityKind::Prompt if value.is_string() => Ok(value),
            kind => Err(McpError::HandlerError(format!(
                "{kind} '{}' must produce text",
                capability.key()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::{Arguments, Capability, HandlerError, ParamSchema, ParamSpec, ParamType};
    use crate::dispatch::Outcome;
    use crate::types::{ErrorKind, RequestId};

    fn dispatcher(strict: bool) -> Dispatcher {
        let mut registry = CapabilityRegistry::new();
        let schema = ParamSchema::new()
            .param(ParamSpec::required("n", ParamType::Integer))
            .param(ParamSpec::optional("label", ParamType::String).with_default("x"));
        registry
            .register(Capability::tool("echo", "echo", schema, |args| {
                Ok(Value::Object(args.clone()))
            }))
            .unwrap();
        registry
            .register(Capability::tool("fail", "fail", ParamSchema::new(), |_| {
                Err(HandlerError::new("provider unavailable"))
            }))
            .unwrap();
        registry
            .register(Capability::tool("boom", "boom", ParamSchema::new(), |_| {
                panic!("secret internal state")
            }))
            .unwrap();
        registry
            .register(
                Capability::resource("num://{n}", "numbers", "", |args| Ok(args["n"].clone()))
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                Capability::resource("bad://{n}", "not text", "", |_| Ok(json!({"n": 1})))
                    .unwrap(),
            )
            .unwrap();
        Dispatcher::with_config(
            Arc::new(registry),
            DispatcherConfig {
                strict_arguments: strict,
            },
        )
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn success_keeps_the_request_id() {
        let resp = dispatcher(true).dispatch(Request::tool("abc", "echo", args(json!({"n": 2.0}))));
        assert_eq!(resp.id, RequestId::from("abc"));
        assert_eq!(resp.result().unwrap(), &json!({"n": 2, "label": "x"}));
    }

    #[test]
    fn unknown_tool_is_capability_not_found() {
        let resp = dispatcher(true).dispatch(Request::tool(1, "get_traffic", Arguments::new()));
        assert_eq!(resp.error_kind(), Some(ErrorKind::CapabilityNotFound));
    }

    #[test]
    fn handler_errors_keep_only_the_message() {
        let resp = dispatcher(true).dispatch(Request::tool(1, "fail", Arguments::new()));
        match resp.outcome {
            Outcome::Error(e) => {
                assert_eq!(e.kind, ErrorKind::HandlerError);
                assert_eq!(e.message, "Handler error: provider unavailable");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn panics_become_handler_errors_without_payload() {
        let resp = dispatcher(true).dispatch(Request::tool(1, "boom", Arguments::new()));
        assert_eq!(resp.error_kind(), Some(ErrorKind::HandlerError));
        assert!(!format!("{:?}", resp).contains("secret"));
    }

    #[test]
    fn strictness_controls_unknown_arguments() {
        let extra = args(json!({"n": 1, "verbose": true}));
        let strict = dispatcher(true).dispatch(Request::tool(1, "echo", extra.clone()));
        assert_eq!(strict.error_kind(), Some(ErrorKind::InvalidArguments));

        let lenient = dispatcher(false).dispatch(Request::tool(1, "echo", extra));
        assert_eq!(lenient.result().unwrap(), &json!({"n": 1, "label": "x"}));
    }

    #[test]
    fn resources_must_return_text() {
        let d = dispatcher(true);
        let ok = d.dispatch(Request::resource(1, "num://7"));
        assert_eq!(ok.result().unwrap(), &json!("7"));

        let bad = d.dispatch(Request::resource(2, "bad://7"));
        assert_eq!(bad.error_kind(), Some(ErrorKind::HandlerError));

        let missing = d.dispatch(Request::resource(3, "nope://7"));
        assert_eq!(missing.error_kind(), Some(ErrorKind::CapabilityNotFound));
    }
}
