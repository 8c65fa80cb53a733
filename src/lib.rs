//! Remote command execution over SSH jump-host chains.
//!
//! - [`remote`]: descriptor parsing, chain building, command running, chain
//!   lifecycle and the per-remote dispatcher
//! - [`tasks`]: built-in units of work (exec, hostname, df, cat, script)
//! - [`cli`]: argument types and the explicit command registry
//! - `mcp`: MCP tools exposing the dispatcher (feature `mcp`)

#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cli;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod remote;
pub mod tasks;
