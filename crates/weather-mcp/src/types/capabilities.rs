//! Initialization handshake types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{CapabilityKind, CapabilityRegistry};

pub const MCP_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "weather-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// Client capabilities are recorded but never acted on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChanged>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChanged>,
}

/// The registry is fixed at startup, so `listChanged` is always false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChanged {
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    #[serde(default)]
    pub subscribe: bool,
    #[serde(default)]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    pub client_info: Implementation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ServerCapabilities {
    /// Advertise only the capability kinds that have registrations.
    pub fn for_registry(registry: &CapabilityRegistry) -> Self {
        let present = |kind| !registry.list(kind).is_empty();
        Self {
            prompts: present(CapabilityKind::Prompt).then(ListChanged::default),
            resources: present(CapabilityKind::Resource).then(ResourcesCapability::default),
            tools: present(CapabilityKind::Tool).then(ListChanged::default),
        }
    }
}

impl InitializeResult {
    pub fn for_registry(registry: &CapabilityRegistry) -> Self {
        Self {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities::for_registry(registry),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            instructions: Some(
                "Weather MCP server. Use get_weather for current conditions, \
                 get_forecast for a daily outlook, read weather://{city} for a text summary, \
                 and the analyze_weather prompt for activity recommendations."
                    .to_string(),
            ),
        }
    }
}
