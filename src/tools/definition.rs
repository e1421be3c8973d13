//! Tool descriptors and parameter schemas
//!
//! Describes an advertised tool and renders its input schema as JSON Schema.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
}

impl ParamType {
    /// JSON Schema type keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
        }
    }

    /// Check whether a JSON value matches this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
        }
    }
}

/// A single named input parameter. Every declared parameter is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
}

/// An advertised tool: name, description and input schema
///
/// Parameters keep declaration order so the rendered schema is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Tool name (e.g., "display_3d_model")
    pub name: String,
    /// Human-readable description for the calling agent
    pub description: String,
    params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// Create a descriptor with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Add a required parameter, replacing any earlier one with the same name
    pub fn with_required(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.params.retain(|p| p.name != name);
        self.params.push(ParamSpec {
            name,
            param_type,
            description: description.into(),
        });
        self
    }

    /// Declared parameters in order
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Names of required parameters
    pub fn required_params(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Render the input schema as a JSON Schema object
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_params(),
        })
    }

    /// Convert to the MCP `tools/list` entry format
    pub fn to_mcp_schema(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

impl Serialize for ToolDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_mcp_schema().serialize(serializer)
    }
}
