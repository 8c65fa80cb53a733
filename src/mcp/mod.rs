//! MCP tools exposing remote execution.
//!
//! - `commands`: the `remote_execute` and `remote_resolve` tool implementations
//!
//! Response types live in [`crate::remote::types`] and are shared with the
//! CLI's JSON output.

pub mod commands;

pub use commands::McpRemoteCommands;
