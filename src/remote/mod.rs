//! Remote execution core.
//!
//! This module is organized into the following submodules:
//!
//! - `descriptor`: `ssh://` URI and bare-host parsing into [`RemoteDescriptor`]
//! - `spec`: resolution of CLI arguments into immutable [`RemoteSpec`] values
//! - `config`: timeout and concurrency defaults with environment overrides
//! - `error`: the [`RemoteError`] taxonomy and transport error classification
//! - `auth`: per-hop authentication strategies
//! - `handler`: russh client handler with host key verification
//! - `transport`: the [`Connector`]/[`Connection`] seam
//! - `ssh`: the russh implementation of the transport seam
//! - `chain`: hop-by-hop chain building with reverse-order teardown
//! - `runner`: command execution with sudo wrapping and `cmd_timeout`
//! - `lifecycle`: scoped acquisition and release of a chain
//! - `task`: the [`RemoteTask`] unit of work and its [`Session`]
//! - `dispatch`: fan-out of one task across many remotes
//! - `types`: command results and serializable report types

pub(crate) mod auth;
pub mod chain;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub(crate) mod handler;
pub mod lifecycle;
pub mod runner;
pub mod spec;
pub mod ssh;
pub mod task;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{BuildFailure, ConnectionChain, build_chain};
pub use descriptor::{RemoteDescriptor, Role, Secret, parse_remote};
pub use dispatch::{DispatchReport, Dispatcher, RemoteOutcome};
pub use error::{CleanupError, ErrorKind, RemoteError};
pub use lifecycle::{ChainGuard, ScopedOutcome, run_scoped};
pub use spec::{RemoteArgs, RemoteSpec, resolve_remote_args};
pub use ssh::{SshConnection, SshConnector};
pub use task::{RemoteTask, Session};
pub use transport::{Connection, Connector, HopOptions};
pub use types::CommandResult;
