//! stl-viewer-mcp - display 3D models from an MCP client
//!
//! Advertises a single `display_3d_model` tool and fulfills calls by launching
//! the STL Viewer as a detached process.

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod tools;

pub use error::{Result, ViewerError};
