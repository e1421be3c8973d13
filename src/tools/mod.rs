//! Tool System - advertised tool descriptors and the capability registry

mod definition;
mod registry;

pub use definition::{ParamSpec, ParamType, ToolDescriptor};
pub use registry::{CapabilityRegistry, DISPLAY_3D_MODEL, FILE_PATH};
