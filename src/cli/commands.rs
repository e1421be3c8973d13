//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the MCP server on stdio (default)
//! - tools: print the advertised tools
//! - display: launch the viewer once for a model file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// stl-viewer-mcp - MCP server that displays 3D models with the STL Viewer
#[derive(Parser, Debug)]
#[command(name = "stl-viewer-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP requests on stdin/stdout
    Serve,

    /// Print the advertised tools as JSON
    Tools,

    /// Display a model file once and print the outcome
    Display {
        /// Path to the 3D model file
        file: String,
    },
}
