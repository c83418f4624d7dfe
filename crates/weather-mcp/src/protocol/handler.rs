//! Main request router: maps JSON-RPC methods onto the dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::dispatch::{Dispatcher, Outcome, Request, Response};
use crate::registry::{Capability, CapabilityKind};
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// Answers MCP messages. One instance serves a whole transport; share it
/// behind `Arc` when requests arrive concurrently.
pub struct ProtocolHandler {
    dispatcher: Arc<Dispatcher>,
    capabilities: Mutex<NegotiatedCapabilities>,
    request_timeout: Option<Duration>,
    shutdown_requested: AtomicBool,
}

impl ProtocolHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            capabilities: Mutex::new(NegotiatedCapabilities::default()),
            request_timeout: None,
            shutdown_requested: AtomicBool::new(false),
        }
    }

    /// Abandon capability calls that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// True once a `shutdown` request has been answered.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub async fn is_initialized(&self) -> bool {
        self.capabilities.lock().await.initialized
    }

    /// Handle one decoded message. Notifications and stray responses
    /// produce no reply.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Response> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Response {
        if let Err(e) = validate_request(&request) {
            return Response::from_error(request.id, &e);
        }

        let id = request.id.clone();
        tracing::debug!("-> {} (id {id})", request.method);

        match self.route(request).await {
            Ok(response) => response,
            Err(e) => Response::from_error(id, &e),
        }
    }

    async fn route(&self, request: JsonRpcRequest) -> McpResult<Response> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let value = match method.as_str() {
            "initialize" => self.handle_initialize(params).await?,
            "ping" => empty_object(),
            "shutdown" => {
                tracing::info!("Shutdown requested");
                self.shutdown_requested.store(true, Ordering::SeqCst);
                empty_object()
            }

            "tools/list" => self.handle_tools_list()?,
            "resources/list" => self.handle_resources_list()?,
            "resources/templates/list" => self.handle_resource_templates_list()?,
            "prompts/list" => self.handle_prompts_list()?,

            "tools/call" => {
                let p: ToolCallParams = decode_params(params, "Tool call")?;
                let req = Request::tool(id, &p.name, p.arguments.unwrap_or_default());
                return Ok(self.call(req).await);
            }
            "resources/read" => {
                let p: ResourceReadParams = decode_params(params, "Resource read")?;
                return Ok(self.call(Request::resource(id, &p.uri)).await);
            }
            "prompts/get" => {
                let p: PromptGetParams = decode_params(params, "Prompt get")?;
                let req = Request::prompt(id, &p.name, p.arguments.unwrap_or_default());
                return Ok(self.call(req).await);
            }

            _ => return Err(McpError::MethodNotFound(method)),
        };

        Ok(Response::success(id, value))
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                // Calls always run to completion, so there is nothing to cancel.
                tracing::info!("Received cancellation notification");
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = decode_params(params, "Initialize")?;
        let mut caps = self.capabilities.lock().await;
        let result = caps.negotiate(init_params, self.dispatcher.registry());
        to_value(result)
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        let tools = self
            .capabilities_of(CapabilityKind::Tool)
            .map(|c| ToolDefinition {
                name: c.key().to_string(),
                description: Some(c.description().to_string()),
                input_schema: c.schema().to_json_schema(),
            })
            .collect();
        to_value(ToolListResult { tools })
    }

    fn handle_resources_list(&self) -> McpResult<Value> {
        let resources = self
            .capabilities_of(CapabilityKind::Resource)
            .filter(|c| c.template().is_some_and(|t| t.is_concrete()))
            .map(|c| ResourceDefinition {
                uri: c.key().to_string(),
                name: c.name().to_string(),
                description: Some(c.description().to_string()),
                mime_type: c.mime_type().map(str::to_string),
            })
            .collect();
        to_value(ResourceListResult { resources })
    }

    fn handle_resource_templates_list(&self) -> McpResult<Value> {
        let resource_templates = self
            .capabilities_of(CapabilityKind::Resource)
            .filter(|c| c.template().is_some_and(|t| !t.is_concrete()))
            .map(|c| ResourceTemplateDefinition {
                uri_template: c.key().to_string(),
                name: c.name().to_string(),
                description: Some(c.description().to_string()),
                mime_type: c.mime_type().map(str::to_string),
            })
            .collect();
        to_value(ResourceTemplateListResult { resource_templates })
    }

    fn handle_prompts_list(&self) -> McpResult<Value> {
        let prompts = self
            .capabilities_of(CapabilityKind::Prompt)
            .map(|c| PromptDefinition {
                name: c.key().to_string(),
                description: Some(c.description().to_string()),
                arguments: c
                    .schema()
                    .params()
                    .iter()
                    .map(|p| PromptArgument {
                        name: p.name.clone(),
                        description: p.description.clone(),
                        required: p.required,
                    })
                    .collect(),
            })
            .collect();
        to_value(PromptListResult { prompts })
    }

    fn capabilities_of(&self, kind: CapabilityKind) -> impl Iterator<Item = &Capability> {
        self.dispatcher.registry().list(kind).iter()
    }

    /// Dispatch on the blocking pool, under the timeout if one is set, and
    /// shape a successful payload into the MCP result for its kind.
    async fn call(&self, request: Request) -> Response {
        let id = request.id.clone();
        let kind = request.kind;
        let target = request.target.clone();

        let dispatcher = Arc::clone(&self.dispatcher);
        let task = tokio::task::spawn_blocking(move || dispatcher.dispatch(request));

        let joined = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!("{kind} {target} abandoned after {}ms", limit.as_millis());
                    return Response::from_error(id, &McpError::Timeout(limit));
                }
            },
            None => task.await,
        };

        let response = match joined {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Dispatch task for {kind} {target} failed: {e}");
                let err = McpError::InternalError("Request could not be completed".to_string());
                return Response::from_error(id, &err);
            }
        };

        match response.outcome {
            Outcome::Success(value) => match self.shape(kind, &target, value) {
                Ok(shaped) => Response::success(response.id, shaped),
                Err(e) => Response::from_error(response.id, &e),
            },
            Outcome::Error(_) => response,
        }
    }

    fn shape(&self, kind: CapabilityKind, target: &str, value: Value) -> McpResult<Value> {
        let registry = self.dispatcher.registry();
        match kind {
            CapabilityKind::Tool => to_value(ToolCallResult::from_value(value)),
            CapabilityKind::Resource => {
                let mime_type = registry
                    .resolve(kind, target)
                    .ok()
                    .and_then(|r| r.capability.mime_type().map(str::to_string));
                to_value(ReadResourceResult {
                    contents: vec![ResourceContent {
                        uri: target.to_string(),
                        mime_type,
                        text: into_text(value),
                    }],
                })
            }
            CapabilityKind::Prompt => {
                let description = registry
                    .get(kind, target)
                    .map(|c| c.description().to_string());
                to_value(PromptGetResult::user_text(description, into_text(value)))
            }
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn into_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn to_value(value: impl serde::Serialize) -> McpResult<Value> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

fn decode_params<T: DeserializeOwned>(params: Option<Value>, what: &str) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidArguments(e.to_string()))?
        .ok_or_else(|| McpError::InvalidArguments(format!("{what} params required")))
}
