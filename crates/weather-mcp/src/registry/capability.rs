//! Capability descriptors and parameter schemas.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::registry::RegistryError;
use super::template::UriTemplate;

/// Validated argument mapping handed to a handler.
pub type Arguments = Map<String, Value>;

/// A bound handler. Runs on a blocking worker thread and may be called
/// concurrently from several requests.
pub type HandlerFn = Arc<dyn Fn(&Arguments) -> Result<Value, HandlerError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CapabilityKind::Tool => "Tool",
            CapabilityKind::Resource => "Resource",
            CapabilityKind::Prompt => "Prompt",
        })
    }
}

/// A fault raised by domain logic. Only the message reaches the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<weather::WeatherError> for HandlerError {
    fn from(e: weather::WeatherError) -> Self {
        HandlerError::new(e.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::new(format!("Failed to encode result: {e}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    /// Inclusive lower bound for `integer` and `number` parameters.
    pub minimum: Option<f64>,
    /// Inclusive upper bound for `integer` and `number` parameters.
    pub maximum: Option<f64>,
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn required(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: true,
            default: None,
            minimum: None,
            maximum: None,
            description: None,
        }
    }

    pub fn optional(name: &str, ty: ParamType) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(self.ty.json_type()));
        if let Some(desc) = &self.description {
            prop.insert("description".to_string(), json!(desc));
        }
        if let Some(default) = &self.default {
            prop.insert("default".to_string(), default.clone());
        }
        for (key, bound) in [("minimum", self.minimum), ("maximum", self.maximum)] {
            if let Some(bound) = bound {
                prop.insert(key.to_string(), self.bound_json(bound));
            }
        }
        Value::Object(prop)
    }

    fn bound_json(&self, bound: f64) -> Value {
        if self.ty == ParamType::Integer {
            json!(bound as i64)
        } else {
            json!(bound)
        }
    }
}

/// Ordered parameter list for one capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema object advertised in `tools/list`.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = json!({ "type": "object", "properties": properties });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }
}

/// A registered tool, resource, or prompt.
#[derive(Clone)]
pub struct Capability {
    kind: CapabilityKind,
    name: String,
    description: String,
    schema: ParamSchema,
    template: Option<UriTemplate>,
    mime_type: Option<String>,
    handler: HandlerFn,
}

impl Capability {
    pub fn tool<F>(name: &str, description: &str, schema: ParamSchema, handler: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self {
            kind: CapabilityKind::Tool,
            name: name.to_string(),
            description: description.to_string(),
            schema,
            template: None,
            mime_type: None,
            handler: Arc::new(handler),
        }
    }

    pub fn prompt<F>(name: &str, description: &str, schema: ParamSchema, handler: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self {
            kind: CapabilityKind::Prompt,
            ..Self::tool(name, description, schema, handler)
        }
    }

    /// A resource addressed by `uri_template`. Each placeholder becomes a
    /// required string parameter.
    pub fn resource<F>(
        uri_template: &str,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<Self, RegistryError>
    where
        F: Fn(&Arguments) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        let template = UriTemplate::parse(uri_template)?;
        let schema = template
            .placeholders()
            .fold(ParamSchema::new(), |schema, placeholder| {
                schema.param(ParamSpec::required(placeholder, ParamType::String))
            });

        Ok(Self {
            kind: CapabilityKind::Resource,
            name: name.to_string(),
            description: description.to_string(),
            schema,
            template: Some(template),
            mime_type: Some("text/plain".to_string()),
            handler: Arc::new(handler),
        })
    }

    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Registry key: the name for tools and prompts, the template for resources.
    pub fn key(&self) -> &str {
        match &self.template {
            Some(template) => template.as_str(),
            None => &self.name,
        }
    }

    /// Display name. Equal to the key for tools and prompts.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn template(&self) -> Option<&UriTemplate> {
        self.template.as_ref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn handler(&self) -> &HandlerFn {
        &self.handler
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("kind", &self.kind)
            .field("key", &self.key())
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_renders_required_defaults_and_minimum() {
        let schema = ParamSchema::new()
            .param(ParamSpec::required("city", ParamType::String).describe("Name of the city"))
            .param(
                ParamSpec::optional("days", ParamType::Integer)
                    .with_default(3)
                    .with_minimum(1.0)
                    .with_maximum(16.0),
            );

        let json = schema.to_json_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["required"], json!(["city"]));
        assert_eq!(json["properties"]["city"]["description"], "Name of the city");
        assert_eq!(json["properties"]["days"]["default"], 3);
        assert_eq!(json["properties"]["days"]["minimum"], 1);
        assert_eq!(json["properties"]["days"]["maximum"], 16);
        assert!(json["properties"]["city"].get("maximum").is_none());
    }

    #[test]
    fn empty_schema_omits_required() {
        let json = ParamSchema::new().to_json_schema();
        assert!(json.get("required").is_none());
    }

    #[test]
    fn resource_schema_comes_from_placeholders() {
        let cap = Capability::resource("weather://{city}", "City", "", |_| Ok(json!(""))).unwrap();
        assert_eq!(cap.key(), "weather://{city}");
        assert_eq!(cap.name(), "City");
        let city = cap.schema().get("city").unwrap();
        assert!(city.required);
        assert_eq!(city.ty, ParamType::String);
        assert_eq!(cap.mime_type(), Some("text/plain"));
    }
}
