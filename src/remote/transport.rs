//! Transport seam between the chain logic and the SSH client library.
//!
//! The chain builder, lifecycle guard and dispatcher are written against these
//! traits only. [`crate::remote::ssh`] provides the russh implementation.

use std::path::PathBuf;

use async_trait::async_trait;

use super::descriptor::RemoteDescriptor;
use super::error::RemoteError;
use super::types::CommandResult;

/// Per-hop connection options shared by every hop of one spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopOptions {
    /// Reject unknown or changed host keys.
    pub strict_host_key_checking: bool,
    /// Private key offered after the hop's password, if any.
    pub identity_file: Option<PathBuf>,
    /// Prefer zlib compression.
    pub compression: bool,
}

impl Default for HopOptions {
    fn default() -> Self {
        Self {
            strict_host_key_checking: false,
            identity_file: None,
            compression: true,
        }
    }
}

/// An open, authenticated connection to one hop.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run `command` in a new session channel and wait for it to finish.
    ///
    /// `input` is written to the channel's stdin followed by EOF. A non-zero
    /// exit status is returned as data. Fails with
    /// [`RemoteError::TransportLost`] when the connection drops first.
    async fn exec(&self, command: &str, input: Option<&[u8]>)
    -> Result<CommandResult, RemoteError>;

    /// Close the connection. Called exactly once per connection by the chain.
    async fn close(&self) -> Result<(), RemoteError>;
}

/// Opens hops, either directly or through a previously opened hop.
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection + 'static;

    /// Open and authenticate `hop`. With `via`, the connection is tunneled
    /// through that hop; without it, the local network stack is used.
    async fn open(
        &self,
        hop: &RemoteDescriptor,
        via: Option<&Self::Conn>,
        options: &HopOptions,
    ) -> Result<Self::Conn, RemoteError>;
}
