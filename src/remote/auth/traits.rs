//! Authentication strategy trait definition.

use async_trait::async_trait;
use russh::client;
use thiserror::Error;

use crate::remote::handler::HostKeyHandler;

/// Why an authentication attempt did not succeed.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The server answered and refused the credentials.
    #[error("{0} authentication rejected")]
    Rejected(&'static str),

    /// The private key could not be loaded.
    #[error("failed to load private key from {path}: {reason}")]
    Key { path: String, reason: String },

    #[error("ssh agent: {0}")]
    Agent(String),

    /// The transport failed mid-authentication.
    #[error(transparent)]
    Transport(#[from] russh::Error),

    #[error("no authentication strategies configured")]
    Empty,
}

/// Trait for SSH authentication strategies.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across
/// async tasks.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Attempt to authenticate with the SSH server.
    ///
    /// * `Ok(true)` - Authentication succeeded
    /// * `Ok(false)` - Credentials rejected
    /// * `Err(_)` - The attempt could not be made or the transport failed
    async fn authenticate(
        &self,
        handle: &mut client::Handle<HostKeyHandler>,
        username: &str,
    ) -> Result<bool, AuthError>;

    /// Name of the strategy, for logging.
    fn name(&self) -> &'static str;
}
