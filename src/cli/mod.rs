//! CLI module for stl-viewer-mcp - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
