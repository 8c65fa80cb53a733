//! Authentication chain for trying multiple strategies.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use russh::client;
use tracing::debug;

use crate::remote::descriptor::{RemoteDescriptor, Secret};
use crate::remote::handler::HostKeyHandler;

use super::traits::{AuthError, AuthStrategy};
use super::{AgentAuth, KeyAuth, PasswordAuth};

/// Tries strategies in the order they were added; the first success wins.
pub struct AuthChain {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl AuthChain {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Chain for one hop: its password, then the identity file, and the agent
    /// only when neither is available.
    pub fn for_hop(hop: &RemoteDescriptor, identity_file: Option<&Path>) -> Self {
        let mut chain = Self::new();

        if let Some(secret) = &hop.secret {
            chain = chain.with_password(secret.clone());
        }
        if let Some(path) = identity_file {
            chain = chain.with_key(path);
        }
        if chain.is_empty() {
            chain = chain.with_agent();
        }

        chain
    }

    pub fn with_password(mut self, password: Secret) -> Self {
        self.strategies.push(Box::new(PasswordAuth::new(password)));
        self
    }

    pub fn with_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.strategies.push(Box::new(KeyAuth::new(key_path)));
        self
    }

    pub fn with_agent(mut self) -> Self {
        self.strategies.push(Box::new(AgentAuth));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl Default for AuthChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthStrategy for AuthChain {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<HostKeyHandler>,
        username: &str,
    ) -> Result<bool, AuthError> {
        let mut last_error = AuthError::Empty;

        for strategy in &self.strategies {
            debug!(strategy = strategy.name(), "trying authentication strategy");

            match strategy.authenticate(handle, username).await {
                Ok(true) => {
                    debug!(strategy = strategy.name(), "authentication succeeded");
                    return Ok(true);
                }
                Ok(false) => last_error = AuthError::Rejected(strategy.name()),
                // A dead transport fails every remaining strategy too
                Err(AuthError::Transport(e)) => return Err(AuthError::Transport(e)),
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "authentication error");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
