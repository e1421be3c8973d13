//! Capability registry
//!
//! Holds the immutable set of tools this server advertises. Built once at
//! startup and shared read-only.

use super::definition::{ParamType, ToolDescriptor};

/// Name of the model display tool
pub const DISPLAY_3D_MODEL: &str = "display_3d_model";

/// Argument carrying the model path
pub const FILE_PATH: &str = "file_path";

/// Immutable list of advertised tools
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    tools: Vec<ToolDescriptor>,
}

impl CapabilityRegistry {
    /// Create the registry with the standard tool set
    pub fn standard() -> Self {
        Self {
            tools: vec![display_3d_model()],
        }
    }

    /// All advertised tools, in declaration order
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.clone()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }
}

fn display_3d_model() -> ToolDescriptor {
    ToolDescriptor::new(
        DISPLAY_3D_MODEL,
        "Display a 3D model file using the STL Viewer application (fixed 800x600 window)",
    )
    .with_required(
        FILE_PATH,
        ParamType::String,
        "Path to the 3D model file (STL, OBJ, etc.)",
    )
}
